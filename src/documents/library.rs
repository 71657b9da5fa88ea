//! PDF library backed by a directory of files
//!
//! lopdf parsing is blocking, so it runs on the blocking thread pool.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{DocumentError, DocumentName, DocumentSource, Result};

/// Directory of `.pdf` files
#[derive(Debug, Clone)]
pub struct PdfLibrary {
    root: PathBuf,
}

impl PdfLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of an existing document in the library
    async fn resolve(&self, document: &DocumentName) -> Result<PathBuf> {
        let path = self.root.join(document.as_str());
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(DocumentError::NotFound(document.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(DocumentError::NotFound(document.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn with_document<T, F>(&self, document: &DocumentName, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(lopdf::Document) -> Result<T> + Send + 'static,
    {
        let path = self.resolve(document).await?;
        tokio::task::spawn_blocking(move || {
            let doc = lopdf::Document::load(&path)
                .map_err(|e| DocumentError::ParseError(e.to_string()))?;
            f(doc)
        })
        .await
        .map_err(|e| DocumentError::TaskError(e.to_string()))?
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

#[async_trait]
impl DocumentSource for PdfLibrary {
    async fn list(&self) -> Result<Vec<DocumentName>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(root = %self.root.display(), "Documents directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut documents = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_pdf(&path) || !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if let Ok(name) = DocumentName::parse(name) {
                    documents.push(name);
                }
            }
        }

        documents.sort();
        Ok(documents)
    }

    async fn page_count(&self, document: &DocumentName) -> Result<u32> {
        self.with_document(document, |doc| Ok(doc.get_pages().len() as u32))
            .await
    }

    async fn extract_text(&self, document: &DocumentName, page: u32) -> Result<String> {
        // lopdf page numbers are one-based
        self.with_document(document, move |doc| {
            let page_number = page + 1;
            if !doc.get_pages().contains_key(&page_number) {
                return Err(DocumentError::TextExtractionError(format!(
                    "page {} does not exist",
                    page
                )));
            }
            doc.extract_text(&[page_number])
                .map_err(|e| DocumentError::TextExtractionError(e.to_string()))
        })
        .await
    }
}
