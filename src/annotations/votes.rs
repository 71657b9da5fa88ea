//! Document-level vote tally
//!
//! One shared file, `pdf_votes.json`, maps document file names to an integer
//! count. Independent of comment votes.

use std::collections::BTreeMap;

use super::editor::EditorError;
use super::store::{AnnotationStore, BackingFile, Recovered, StoreError, VOTES_FILE};
use super::types::VoteDirection;
use crate::documents::DocumentName;

/// Vote counts keyed by document file name
pub type VoteCounts = BTreeMap<String, i64>;

/// Read/write access to the shared vote tally
#[derive(Clone)]
pub struct VoteTally {
    store: AnnotationStore,
}

impl VoteTally {
    pub fn new(store: AnnotationStore) -> Self {
        Self { store }
    }

    fn file(&self) -> BackingFile<VoteCounts> {
        self.store.backing_file(VOTES_FILE)
    }

    /// All counts. Documents never voted on are absent.
    pub async fn all(&self) -> Result<Recovered<VoteCounts>, StoreError> {
        self.file().load_lenient().await
    }

    /// Current count for a document, 0 if never voted on
    pub async fn count(&self, document: &DocumentName) -> Result<Recovered<i64>, StoreError> {
        let counts = self.all().await?;
        Ok(counts.map(|counts| counts.get(document.as_str()).copied().unwrap_or(0)))
    }

    /// Apply one vote and return the new count
    pub async fn vote(
        &self,
        document: &DocumentName,
        direction: VoteDirection,
    ) -> Result<Recovered<i64>, EditorError> {
        let updated = self
            .file()
            .update(|counts: &mut VoteCounts| {
                let count = counts.entry(document.to_string()).or_insert(0);
                *count = direction.apply(*count)?;
                Ok::<_, EditorError>(*count)
            })
            .await?;

        tracing::info!(
            document = %document,
            direction = ?direction,
            votes = updated.value,
            "Document vote recorded"
        );

        Ok(updated)
    }
}
