//! Ignore-rule matching across the three pattern kinds.

use rstest::rstest;
use sitesync_core::IgnoreMatcher;

fn matcher(rules: &str) -> IgnoreMatcher {
    IgnoreMatcher::parse(rules).expect("rules compile")
}

// ---------------------------------------------------------------------------
// 1. Directory-scoped patterns
// ---------------------------------------------------------------------------

#[rstest]
#[case("node_modules", true)]
#[case("node_modules/foo.js", true)]
#[case("node_modules/pkg/lib/index.js", true)]
#[case("app/node_modules/foo.js", false)]
#[case("node_modules_backup/foo.js", false)]
#[case("index.html", false)]
fn directory_pattern_matches_prefixes(#[case] path: &str, #[case] ignored: bool) {
    assert_eq!(matcher("node_modules/").should_ignore(path), ignored, "{path}");
}

#[rstest]
#[case("app/node_modules/foo.js", true)]
#[case("a/b/node_modules/c/d.js", true)]
#[case("node_modules/foo.js", true)]
#[case("app/src/foo.js", false)]
fn wildcard_directory_pattern_matches_at_any_depth(#[case] path: &str, #[case] ignored: bool) {
    assert_eq!(matcher("*node_modules/").should_ignore(path), ignored, "{path}");
}

#[test]
fn nested_directory_pattern_matches_its_subtree() {
    let m = matcher("assets/raw/");
    assert!(m.should_ignore("assets/raw"));
    assert!(m.should_ignore("assets/raw/photo.tiff"));
    assert!(!m.should_ignore("assets/web/photo.jpg"));
}

// ---------------------------------------------------------------------------
// 2. Path globs
// ---------------------------------------------------------------------------

#[rstest]
#[case("docs/readme.md", true)]
#[case("docs/guide/intro.md", true)]
#[case("readme.md", false)]
#[case("other/docs/readme.md", false)]
fn path_glob_matches_full_relative_path(#[case] path: &str, #[case] ignored: bool) {
    assert_eq!(matcher("docs/*.md").should_ignore(path), ignored, "{path}");
}

// ---------------------------------------------------------------------------
// 3. Basename globs
// ---------------------------------------------------------------------------

#[rstest]
#[case("debug.log", true)]
#[case("deep/nested/dir/debug.log", true)]
#[case("logs.txt", false)]
#[case("a/b.LOG", false)]
fn basename_glob_matches_last_segment(#[case] path: &str, #[case] ignored: bool) {
    assert_eq!(matcher("*.log").should_ignore(path), ignored, "{path}");
}

#[rstest]
#[case("file1.txt", true)]
#[case("fileA.txt", false)]
#[case("file10.txt", false)]
fn character_classes_and_single_wildcards(#[case] path: &str, #[case] ignored: bool) {
    assert_eq!(matcher("file[0-9].txt").should_ignore(path), ignored, "{path}");
    assert!(matcher("file?.txt").should_ignore("fileA.txt"));
}

#[test]
fn any_matching_rule_ignores_the_path() {
    let m = matcher("# build output\ndist/\n\n*.map\nsecret/keys.json\n");
    assert!(m.should_ignore("dist/app.js"));
    assert!(m.should_ignore("js/app.js.map"));
    assert!(m.should_ignore("secret/keys.json"));
    assert!(!m.should_ignore("secret/other.json"));
    assert!(!m.should_ignore("js/app.js"));
}

// ---------------------------------------------------------------------------
// 4. Shell dialect: only `*`, `?` and `[...]` are special
// ---------------------------------------------------------------------------

#[rstest]
#[case("{draft}.html", "{draft}.html", true)]
#[case("{draft}.html", "draft.html", false)]
#[case("{a,b}.css", "a.css", false)]
#[case("{a,b}.css", "{a,b}.css", true)]
#[case("a{b", "a{b", true)]
#[case("weird[", "weird[", true)]
#[case("weird[", "weirdx", false)]
#[case("[!a]*.txt", "b.txt", true)]
#[case("[!a]*.txt", "a.txt", false)]
#[case("[^a].txt", "^.txt", true)]
#[case("[^a].txt", "b.txt", false)]
fn braces_and_unclosed_brackets_are_literal(
    #[case] rule: &str,
    #[case] path: &str,
    #[case] ignored: bool,
) {
    assert_eq!(matcher(rule).should_ignore(path), ignored, "{rule} vs {path}");
}

#[rstest]
#[case("a\\b.html", true)]
#[case("ab.html", false)]
fn backslash_is_an_ordinary_character(#[case] path: &str, #[case] ignored: bool) {
    assert_eq!(matcher("a\\b.html").should_ignore(path), ignored, "{path}");
}

#[test]
fn double_star_is_not_recursive() {
    let m = matcher("**/draft.html");
    assert!(m.should_ignore("posts/draft.html"));
    assert!(!m.should_ignore("draft.html"));
}
