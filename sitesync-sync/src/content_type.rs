//! Static extension → MIME table.

use std::collections::HashMap;

use crate::collaborators::ContentTypeClassifier;

const CONTENT_TYPES: &[(&str, &str)] = &[
    // Web content
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("md", "text/markdown"),
    ("pdf", "application/pdf"),
    // Images
    ("png", "image/png"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("gif", "image/gif"),
    ("ico", "image/x-icon"),
    ("bmp", "image/bmp"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
    // Audio / video
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("webm", "video/webm"),
    // Archives
    ("zip", "application/zip"),
    ("tar", "application/x-tar"),
    ("gz", "application/gzip"),
    ("7z", "application/x-7z-compressed"),
    ("rar", "application/vnd.rar"),
    // Documents
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("ppt", "application/vnd.ms-powerpoint"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    ("odt", "application/vnd.oasis.opendocument.text"),
    ("ods", "application/vnd.oasis.opendocument.spreadsheet"),
    ("odp", "application/vnd.oasis.opendocument.presentation"),
    // Text and source
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("rtf", "application/rtf"),
    ("py", "text/x-python"),
    ("java", "text/x-java"),
    ("c", "text/x-c"),
    ("cpp", "text/x-c++"),
    ("h", "text/x-c"),
    ("sh", "text/x-shellscript"),
    ("php", "text/x-php"),
    ("rb", "text/x-ruby"),
    // Fonts
    ("ttf", "font/ttf"),
    ("otf", "font/otf"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("eot", "application/vnd.ms-fontobject"),
];

/// Classifies by lower-cased file extension.
#[derive(Debug, Clone)]
pub struct ExtensionTable {
    types: HashMap<&'static str, &'static str>,
}

impl Default for ExtensionTable {
    fn default() -> Self {
        Self {
            types: CONTENT_TYPES.iter().copied().collect(),
        }
    }
}

impl ExtensionTable {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContentTypeClassifier for ExtensionTable {
    fn classify(&self, file_name: &str) -> Option<String> {
        let (stem, ext) = file_name.rsplit_once('.')?;
        if stem.is_empty() {
            // Dotfiles like `.htaccess` have no extension.
            return None;
        }
        self.types
            .get(ext.to_ascii_lowercase().as_str())
            .map(|t| (*t).to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions_are_case_insensitive() {
        let table = ExtensionTable::new();
        assert_eq!(table.classify("index.html").as_deref(), Some("text/html"));
        assert_eq!(table.classify("LOGO.PNG").as_deref(), Some("image/png"));
        assert_eq!(
            table.classify("archive.tar.gz").as_deref(),
            Some("application/gzip")
        );
    }

    #[test]
    fn unknown_or_missing_extension_is_none() {
        let table = ExtensionTable::new();
        assert_eq!(table.classify("data.parquet"), None);
        assert_eq!(table.classify("Makefile"), None);
        assert_eq!(table.classify(".htaccess"), None);
    }
}
