use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;

pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["pdf", "docx", "txt"];

/// An uploaded résumé
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read document {:?}", path))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, bytes))
    }

    pub fn is_supported(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Text handed to the analyzer: UTF-8 content, or base64 for binary formats
    pub fn preview(&self) -> String {
        match std::str::from_utf8(&self.bytes) {
            Ok(text) => text.to_string(),
            Err(_) => STANDARD.encode(&self.bytes),
        }
    }

    pub fn size_kb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }

    /// Listing line, e.g. `• cv.txt (1.5 KB)`
    pub fn listing(&self) -> String {
        format!("• {} ({:.1} KB)", self.name, self.size_kb())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_preview() {
        let doc = Document::new("cv.txt", "Senior Rust engineer".as_bytes().to_vec());
        assert_eq!(doc.preview(), "Senior Rust engineer");
    }

    #[test]
    fn test_binary_preview_falls_back_to_base64() {
        let doc = Document::new("cv.pdf", vec![0xff, 0xfe, 0x00]);
        assert_eq!(doc.preview(), "//4A");
    }

    #[test]
    fn test_listing() {
        let doc = Document::new("cv.docx", vec![0; 1536]);
        assert_eq!(doc.listing(), "• cv.docx (1.5 KB)");
    }

    #[test]
    fn test_supported_types() {
        assert!(Document::is_supported(Path::new("cv.PDF")));
        assert!(Document::is_supported(Path::new("dir/cv.txt")));
        assert!(!Document::is_supported(Path::new("cv.odt")));
        assert!(!Document::is_supported(Path::new("cv")));
    }

    #[test]
    fn test_load_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ana.txt");
        std::fs::write(&path, "Ana").unwrap();

        let doc = Document::load(&path).unwrap();
        assert_eq!(doc.name, "ana.txt");
        assert_eq!(doc.bytes, b"Ana");
    }
}
