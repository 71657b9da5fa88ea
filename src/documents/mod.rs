//! Document library
//!
//! Documents are opaque files identified by their file name. Page counts and
//! page text come from a [`DocumentSource`]; [`PdfLibrary`] reads them from a
//! directory of PDF files.

#[cfg(test)]
pub(crate) mod fake;
mod library;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

pub use library::PdfLibrary;

/// Document errors
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Document not found
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Name is not a plain file name
    #[error("Invalid document name: {0:?}")]
    InvalidName(String),

    /// Failed to parse document
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Text extraction error
    #[error("Text extraction error: {0}")]
    TextExtractionError(String),

    /// Blocking task failed
    #[error("Task error: {0}")]
    TaskError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;

/// A document's file name, validated to stay inside its directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentName(String);

impl DocumentName {
    pub fn parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0']);
        if valid {
            Ok(Self(name))
        } else {
            Err(DocumentError::InvalidName(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Page structure and text of the documents in a library
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Documents available in the library, sorted by name
    async fn list(&self) -> Result<Vec<DocumentName>>;

    /// Number of pages in a document
    async fn page_count(&self, document: &DocumentName) -> Result<u32>;

    /// Extracted text of one zero-based page
    async fn extract_text(&self, document: &DocumentName, page: u32) -> Result<String>;
}
