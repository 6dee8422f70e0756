use crate::error::{Result, StatementExtractorError};

/// A report staged for extraction: raw bytes plus the media type sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self> {
        let mime_type = mime_type.into();
        if !is_supported_media_type(&mime_type) {
            return Err(StatementExtractorError::UnsupportedDocument(mime_type));
        }
        Ok(Self {
            file_name: file_name.into(),
            mime_type,
            bytes,
        })
    }

    /// Reads a PDF or image from disk, guessing the media type from the extension.
    #[cfg(feature = "gemini")]
    pub async fn from_path(path: &std::path::Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                StatementExtractorError::UnsupportedDocument(format!(
                    "invalid file name: {}",
                    path.display()
                ))
            })?
            .to_string();

        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        if !is_supported_media_type(&mime_type) {
            return Err(StatementExtractorError::UnsupportedDocument(mime_type));
        }

        let bytes = tokio::fs::read(path).await?;
        log::debug!("Loaded {} ({}, {} bytes)", file_name, mime_type, bytes.len());

        Self::new(file_name, mime_type, bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// PDFs and any `image/*` type.
pub fn is_supported_media_type(mime_type: &str) -> bool {
    let mime_type = mime_type.trim().to_ascii_lowercase();
    mime_type == "application/pdf" || mime_type.starts_with("image/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_media_types() {
        assert!(is_supported_media_type("application/pdf"));
        assert!(is_supported_media_type("image/png"));
        assert!(is_supported_media_type("IMAGE/JPEG"));
        assert!(!is_supported_media_type("text/csv"));
        assert!(!is_supported_media_type("application/octet-stream"));
    }

    #[test]
    fn test_new_rejects_unsupported_types() {
        let err = SourceDocument::new("notes.txt", "text/plain", b"hello".to_vec()).unwrap_err();
        assert!(matches!(err, StatementExtractorError::UnsupportedDocument(m) if m == "text/plain"));
    }

    #[cfg(feature = "gemini")]
    #[tokio::test]
    async fn test_from_path_guesses_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        let doc = SourceDocument::from_path(&path).await.unwrap();
        assert_eq!(doc.file_name, "report.pdf");
        assert_eq!(doc.mime_type, "application/pdf");
        assert_eq!(doc.len(), 8);
    }

    #[cfg(feature = "gemini")]
    #[tokio::test]
    async fn test_from_path_rejects_spreadsheets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        std::fs::write(&path, b"a,b").unwrap();

        let err = SourceDocument::from_path(&path).await.unwrap_err();
        assert!(matches!(err, StatementExtractorError::UnsupportedDocument(_)));
    }
}
