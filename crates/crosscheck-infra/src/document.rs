//! Loading reference documents from disk.

use std::path::Path;

use anyhow::{Context, bail};

use crosscheck_types::document::ReferenceDocument;

/// File extensions accepted as plain text.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "csv", "json", "log"];

/// Read a UTF-8 text file as a reference document, keeping at most
/// `char_limit` characters.
///
/// PDF files are rejected with a pointer to `pdftotext`; there is no PDF
/// text extractor in this build.
pub async fn load_reference_document(path: &Path, char_limit: usize) -> anyhow::Result<ReferenceDocument> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("pdf") => bail!(
            "{} is a PDF; extract its text first (e.g. `pdftotext {} {}`) and pass the .txt file",
            path.display(),
            path.display(),
            path.with_extension("txt").display()
        ),
        Some(ext) if !TEXT_EXTENSIONS.contains(&ext) => bail!(
            "unsupported document type '.{ext}' (expected one of: {})",
            TEXT_EXTENSIONS.join(", ")
        ),
        _ => {}
    }

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let text = String::from_utf8(bytes)
        .with_context(|| format!("{} is not valid UTF-8 text", path.display()))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let document = ReferenceDocument::new(name, &text, char_limit);

    if document.is_empty() {
        bail!("{} is empty", path.display());
    }
    if document.truncated {
        tracing::warn!(
            path = %path.display(),
            limit = char_limit,
            "reference document truncated"
        );
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_loads_and_truncates_text() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.txt");
        tokio::fs::write(&path, "abcdefghij").await.unwrap();

        let doc = load_reference_document(&path, 4).await.unwrap();
        assert_eq!(doc.name, "notes.txt");
        assert_eq!(doc.text, "abcd");
        assert!(doc.truncated);
    }

    #[tokio::test]
    async fn test_file_without_extension_accepted() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("README");
        tokio::fs::write(&path, "hello").await.unwrap();
        assert!(load_reference_document(&path, 100).await.is_ok());
    }

    #[tokio::test]
    async fn test_pdf_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("paper.PDF");
        tokio::fs::write(&path, b"%PDF-1.7").await.unwrap();
        let err = load_reference_document(&path, 100).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("PDF"));
        assert!(message.contains("pdftotext"), "{message}");
        assert!(message.contains("paper.txt"), "{message}");
    }

    #[tokio::test]
    async fn test_binary_and_empty_rejected() {
        let tmp = TempDir::new().unwrap();
        let binary = tmp.path().join("blob.txt");
        tokio::fs::write(&binary, [0xff, 0xfe, 0x00]).await.unwrap();
        assert!(load_reference_document(&binary, 100).await.is_err());

        let empty = tmp.path().join("empty.md");
        tokio::fs::write(&empty, "  \n").await.unwrap();
        assert!(load_reference_document(&empty, 100).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_file_has_context() {
        let tmp = TempDir::new().unwrap();
        let err = load_reference_document(&tmp.path().join("nope.txt"), 100)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
