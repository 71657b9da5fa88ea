//! In-memory document source for tests

use std::collections::HashMap;

use async_trait::async_trait;

use super::{DocumentError, DocumentName, DocumentSource, Result};

/// Document name -> page texts
pub(crate) struct FakeDocuments {
    pages: HashMap<String, Vec<String>>,
}

impl FakeDocuments {
    pub(crate) fn with(documents: &[(&str, &[&str])]) -> Self {
        Self {
            pages: documents
                .iter()
                .map(|(name, pages)| {
                    (name.to_string(), pages.iter().map(|p| p.to_string()).collect())
                })
                .collect(),
        }
    }
}

#[async_trait]
impl DocumentSource for FakeDocuments {
    async fn list(&self) -> Result<Vec<DocumentName>> {
        let mut names = self
            .pages
            .keys()
            .map(|name| DocumentName::parse(name.as_str()))
            .collect::<Result<Vec<_>>>()?;
        names.sort();
        Ok(names)
    }

    async fn page_count(&self, document: &DocumentName) -> Result<u32> {
        self.pages
            .get(document.as_str())
            .map(|pages| pages.len() as u32)
            .ok_or_else(|| DocumentError::NotFound(document.to_string()))
    }

    async fn extract_text(&self, document: &DocumentName, page: u32) -> Result<String> {
        self.pages
            .get(document.as_str())
            .and_then(|pages| pages.get(page as usize))
            .cloned()
            .ok_or_else(|| DocumentError::NotFound(document.to_string()))
    }
}
