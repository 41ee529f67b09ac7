//! Plain-text extraction from source documents.

use crate::error::{IngestError, Result};
use std::path::Path;

/// Extract the full text of a document, pages concatenated in order.
///
/// PDFs go through `pdf-extract` on a blocking task; anything else is
/// read as UTF-8 text. A document that yields no text is not an error
/// here; the pipeline simply writes zero records for it.
pub async fn extract_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(IngestError::DocumentNotFound(path.to_path_buf()).into());
    }

    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        let owned = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned))
            .await
            .map_err(|e| anyhow::anyhow!("text extraction task failed: {e}"))?
            .map_err(|e| IngestError::DocumentUnreadable {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(text)
    } else {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| {
                IngestError::DocumentUnreadable {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::extract_text;
    use crate::error::{Error, IngestError};
    use std::io::Write;

    #[tokio::test]
    async fn missing_path_is_document_not_found() {
        let error = extract_text(std::path::Path::new("/no/such/file.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            Error::Ingest(IngestError::DocumentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn plain_text_files_are_read_verbatim() {
        let mut file = tempfile::NamedTempFile::with_suffix(".txt").expect("tempfile");
        write!(file, "some document text").expect("write");
        let text = extract_text(file.path()).await.expect("extract");
        assert_eq!(text, "some document text");
    }

    #[tokio::test]
    async fn non_utf8_file_is_document_unreadable() {
        let mut file = tempfile::NamedTempFile::with_suffix(".txt").expect("tempfile");
        file.write_all(&[0xff, 0xfe, 0x00, 0x80]).expect("write");
        let error = extract_text(file.path()).await.unwrap_err();
        assert!(matches!(
            error,
            Error::Ingest(IngestError::DocumentUnreadable { .. })
        ));
    }
}
