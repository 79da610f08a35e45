//! Exclusion rules loaded from the ignore file at the local root.
//!
//! One pattern per line; blank lines and `#` comments are skipped and there
//! is no negation syntax. A pattern is classified once, when loaded:
//!
//! - `P/` is directory-scoped: a path is ignored when any of its ancestor
//!   prefixes (segments rejoined with `/`) matches `P`.
//! - a pattern containing `/` is matched against the whole relative path.
//! - anything else is matched against the final path segment only.
//!
//! Globs are shell-style (`*`, `?`, `[...]`, `[!...]`) and case-sensitive;
//! `*` may cross `/` and no recursive `**` is implied. Every other character
//! is literal, including `{`, `}`, `\`, a leading `^` in a class and a `[`
//! with no closing `]`.

use std::io::ErrorKind;
use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};

use crate::constants::IGNORE_FILE_NAME;
use crate::error::{io_err, ConfigError};

/// How a pattern is applied to a relative path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Trailing `/`: matches a directory at any depth, and everything below it.
    Directory,
    /// Contains `/`: matched against the full relative path.
    PathGlob,
    /// No `/`: matched against the basename.
    BaseName,
}

/// A single compiled ignore rule.
#[derive(Debug, Clone)]
pub struct IgnorePattern {
    raw: String,
    kind: PatternKind,
    matcher: GlobMatcher,
}

impl IgnorePattern {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let (kind, glob) = if let Some(stripped) = raw.strip_suffix('/') {
            (PatternKind::Directory, stripped.trim_end_matches('/'))
        } else if raw.contains('/') {
            (PatternKind::PathGlob, raw)
        } else {
            (PatternKind::BaseName, raw)
        };

        let matcher = GlobBuilder::new(&shell_glob(glob))
            .literal_separator(false)
            .case_insensitive(false)
            .backslash_escape(false)
            .build()
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: raw.to_owned(),
                source,
            })?
            .compile_matcher();

        Ok(Self {
            raw: raw.to_owned(),
            kind,
            matcher,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// Whether this rule excludes the `/`-separated relative `path`.
    pub fn matches(&self, path: &str) -> bool {
        match self.kind {
            PatternKind::Directory => {
                let mut prefix = String::with_capacity(path.len());
                for segment in path.split('/') {
                    if !prefix.is_empty() {
                        prefix.push('/');
                    }
                    prefix.push_str(segment);
                    if self.matcher.is_match(&prefix) {
                        return true;
                    }
                }
                false
            }
            PatternKind::PathGlob => self.matcher.is_match(path),
            PatternKind::BaseName => {
                let base = path.rsplit('/').next().unwrap_or(path);
                self.matcher.is_match(base)
            }
        }
    }
}

/// Rewrite a shell-style pattern into globset syntax.
///
/// Braces become single-character classes, runs of `*` collapse to one
/// (`**` has no recursive meaning), and an unclosed `[` is matched literally.
fn shell_glob(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '{' => out.push_str("[{]"),
            '}' => out.push_str("[}]"),
            '*' => {
                out.push('*');
                while chars.get(i + 1) == Some(&'*') {
                    i += 1;
                }
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    push_class(&mut out, &chars[i + 1..end]);
                    i = end;
                }
                None => out.push_str("[[]"),
            },
            c => out.push(c),
        }
        i += 1;
    }
    out
}

/// Index of the `]` closing the class opened at `start`. A `]` right after
/// `[` or `[!` is a member, not the terminator.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    (j..chars.len()).find(|&k| chars[k] == ']')
}

/// Emit a class body. Only `!` negates; a leading `^` is a member, so it is
/// moved where globset cannot read it as negation.
fn push_class(out: &mut String, body: &[char]) {
    match body.split_first() {
        Some(('^', [])) => out.push('^'),
        Some(('^', rest)) => {
            out.push('[');
            match rest.split_last() {
                Some(('-', init)) => {
                    out.push('-');
                    out.extend(init);
                }
                _ => out.extend(rest),
            }
            out.push_str("^]");
        }
        _ => {
            out.push('[');
            out.extend(body);
            out.push(']');
        }
    }
}

/// The compiled rule set for one run. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct IgnoreMatcher {
    patterns: Vec<IgnorePattern>,
}

impl IgnoreMatcher {
    /// A matcher that ignores nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile rules from ignore-file text.
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let patterns = source
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(IgnorePattern::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Load `<root>/.s3ignore`; a missing file yields an empty matcher.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        Self::load_file(&root.join(IGNORE_FILE_NAME))
    }

    /// Load rules from an explicit file; a missing file yields an empty matcher.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(source) => Self::parse(&source),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::empty()),
            Err(err) => Err(io_err(path, err)),
        }
    }

    pub fn patterns(&self) -> &[IgnorePattern] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether any rule excludes the `/`-separated relative `path`.
    pub fn should_ignore(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }
}
