//! Copy mode detection
//!
//! Text resources get `{root}` rewritten when installed; everything else is
//! copied byte-for-byte.

use std::path::Path;

/// Extensions of files that get the placeholder rewritten
pub const TEMPLATED_EXTENSIONS: &[&str] = &["md", "yaml", "yml", "txt", "json", "toml", "csv"];

/// True if path has a known binary extension; such files must be copied as-is, not read as text.
pub fn is_likely_binary_file(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    matches!(
        ext.to_lowercase().as_str(),
        "zip"
            | "pdf"
            | "png"
            | "jpg"
            | "jpeg"
            | "gif"
            | "webp"
            | "ico"
            | "woff"
            | "woff2"
            | "ttf"
            | "otf"
            | "mp3"
            | "mp4"
            | "exe"
            | "dll"
            | "so"
            | "dylib"
            | "bin"
    )
}

/// True if the placeholder should be rewritten in this file
pub fn is_templated(path: &Path) -> bool {
    if is_likely_binary_file(path) {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| TEMPLATED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_likely_binary_file() {
        assert!(is_likely_binary_file(Path::new("test.zip")));
        assert!(is_likely_binary_file(Path::new("logo.PNG")));
        assert!(!is_likely_binary_file(Path::new("test.md")));
        assert!(!is_likely_binary_file(Path::new("test.json")));
    }

    #[test]
    fn test_is_templated() {
        assert!(is_templated(Path::new("tasks/create-doc.md")));
        assert!(is_templated(Path::new("templates/prd.YAML")));
        assert!(is_templated(Path::new("data/table.csv")));
        assert!(!is_templated(Path::new("data/logo.png")));
        assert!(!is_templated(Path::new("utils/run.sh")));
        assert!(!is_templated(Path::new("Makefile")));
    }
}
