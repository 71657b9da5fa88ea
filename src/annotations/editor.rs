//! Annotation editor
//!
//! Each operation takes an explicit [`PageRef`], checks the page against the
//! document source, then runs one read-modify-write cycle through the store.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use super::store::{AnnotationStore, Recovered, StoreError};
use super::types::{
    Comment, Comments, Highlight, Highlights, Notes, PageIndex, PageRef, ValidationError,
    VoteDirection,
};
use super::votes::VoteTally;
use crate::documents::{DocumentError, DocumentSource};
use crate::html::{apply_highlights, HighlightConfig};

/// Editor errors
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No comment at index {index} on page {page}")]
    CommentNotFound { page: PageIndex, index: usize },
}

/// Everything stored for one page
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub document: String,
    pub page: PageIndex,
    pub page_count: u32,
    pub previous_page: Option<PageIndex>,
    pub next_page: Option<PageIndex>,
    pub highlights: Vec<Highlight>,
    pub comments: Vec<Comment>,
    pub note: String,
    pub votes: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Page text with highlights applied
#[derive(Debug, Clone, Serialize)]
pub struct RenderedPage {
    pub document: String,
    pub page: PageIndex,
    pub html: String,
    pub highlight_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Reads and mutates the annotations of one page at a time
#[derive(Clone)]
pub struct AnnotationEditor {
    store: AnnotationStore,
    votes: VoteTally,
    documents: Arc<dyn DocumentSource>,
    highlight_config: HighlightConfig,
}

impl AnnotationEditor {
    pub fn new(
        store: AnnotationStore,
        documents: Arc<dyn DocumentSource>,
        highlight_config: HighlightConfig,
    ) -> Self {
        Self {
            votes: VoteTally::new(store.clone()),
            store,
            documents,
            highlight_config,
        }
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn votes(&self) -> &VoteTally {
        &self.votes
    }

    pub fn documents(&self) -> &Arc<dyn DocumentSource> {
        &self.documents
    }

    /// Check the page exists and return the document's page count
    async fn check_page(&self, page_ref: &PageRef) -> Result<u32, EditorError> {
        let page_count = self.documents.page_count(&page_ref.document).await?;
        if page_ref.page >= page_count {
            return Err(ValidationError::PageOutOfRange {
                page: page_ref.page,
                page_count,
            }
            .into());
        }
        Ok(page_count)
    }

    /// Append a highlight to the page and return the page's highlights
    pub async fn add_highlight(
        &self,
        page_ref: &PageRef,
        start: usize,
        end: usize,
    ) -> Result<Recovered<Vec<Highlight>>, EditorError> {
        let highlight = Highlight::new(start, end)?;
        self.check_page(page_ref).await?;

        let updated = self
            .store
            .update::<Highlights, _, EditorError, _>(&page_ref.document, |pages| {
                let highlights = pages.entry(page_ref.page).or_default();
                highlights.push(highlight);
                Ok(highlights.clone())
            })
            .await?;

        tracing::info!(
            document = %page_ref.document,
            page = page_ref.page,
            start,
            end,
            "Highlight added"
        );
        Ok(updated)
    }

    /// Append a comment with zero votes and return the page's comments
    pub async fn add_comment(
        &self,
        page_ref: &PageRef,
        name: &str,
        text: &str,
    ) -> Result<Recovered<Vec<Comment>>, EditorError> {
        let comment = Comment::new(name, text)?;
        self.check_page(page_ref).await?;

        let updated = self
            .store
            .update::<Comments, _, EditorError, _>(&page_ref.document, |pages| {
                let comments = pages.entry(page_ref.page).or_default();
                comments.push(comment);
                Ok(comments.clone())
            })
            .await?;

        tracing::info!(
            document = %page_ref.document,
            page = page_ref.page,
            author = name,
            "Comment added"
        );
        Ok(updated)
    }

    /// Apply one vote to a comment and return the updated comment
    pub async fn vote_comment(
        &self,
        page_ref: &PageRef,
        index: usize,
        direction: VoteDirection,
    ) -> Result<Recovered<Comment>, EditorError> {
        self.check_page(page_ref).await?;

        let page = page_ref.page;
        let updated = self
            .store
            .update::<Comments, _, EditorError, _>(&page_ref.document, |pages| {
                let comment = pages
                    .get_mut(&page)
                    .and_then(|comments| comments.get_mut(index))
                    .ok_or(EditorError::CommentNotFound { page, index })?;
                comment.vote(direction)?;
                Ok(comment.clone())
            })
            .await?;

        tracing::debug!(
            document = %page_ref.document,
            page,
            index,
            votes = updated.value.votes,
            "Comment vote recorded"
        );
        Ok(updated)
    }

    /// Replace the page's note
    pub async fn save_note(
        &self,
        page_ref: &PageRef,
        text: &str,
    ) -> Result<Recovered<String>, EditorError> {
        self.check_page(page_ref).await?;

        let updated = self
            .store
            .update::<Notes, _, EditorError, _>(&page_ref.document, |pages| {
                pages.insert(page_ref.page, text.to_string());
                Ok(text.to_string())
            })
            .await?;

        tracing::info!(
            document = %page_ref.document,
            page = page_ref.page,
            len = text.len(),
            "Note saved"
        );
        Ok(updated)
    }

    pub async fn highlights(
        &self,
        page_ref: &PageRef,
    ) -> Result<Recovered<Vec<Highlight>>, EditorError> {
        self.check_page(page_ref).await?;
        Ok(self
            .store
            .get_page_lenient::<Highlights>(&page_ref.document, page_ref.page)
            .await?)
    }

    pub async fn comments(
        &self,
        page_ref: &PageRef,
    ) -> Result<Recovered<Vec<Comment>>, EditorError> {
        self.check_page(page_ref).await?;
        Ok(self
            .store
            .get_page_lenient::<Comments>(&page_ref.document, page_ref.page)
            .await?)
    }

    pub async fn note(&self, page_ref: &PageRef) -> Result<Recovered<String>, EditorError> {
        self.check_page(page_ref).await?;
        Ok(self
            .store
            .get_page_lenient::<Notes>(&page_ref.document, page_ref.page)
            .await?)
    }

    /// Load every annotation of the page along with navigation bounds
    pub async fn page_view(&self, page_ref: &PageRef) -> Result<PageView, EditorError> {
        let page_count = self.check_page(page_ref).await?;
        let document = &page_ref.document;
        let page = page_ref.page;

        let highlights = self.store.get_page_lenient::<Highlights>(document, page).await?;
        let comments = self.store.get_page_lenient::<Comments>(document, page).await?;
        let note = self.store.get_page_lenient::<Notes>(document, page).await?;
        let votes = self.votes.count(document).await?;

        let warnings = [
            &highlights.warning,
            &comments.warning,
            &note.warning,
            &votes.warning,
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect();

        Ok(PageView {
            document: document.to_string(),
            page,
            page_count,
            previous_page: page.checked_sub(1),
            next_page: (page + 1 < page_count).then_some(page + 1),
            highlights: highlights.value,
            comments: comments.value,
            note: note.value,
            votes: votes.value,
            warnings,
        })
    }

    /// Extract the page text and mark its highlights
    pub async fn render_page(&self, page_ref: &PageRef) -> Result<RenderedPage, EditorError> {
        self.check_page(page_ref).await?;

        let text = self
            .documents
            .extract_text(&page_ref.document, page_ref.page)
            .await?;
        let highlights = self
            .store
            .get_page_lenient::<Highlights>(&page_ref.document, page_ref.page)
            .await?;

        Ok(RenderedPage {
            document: page_ref.document.to_string(),
            page: page_ref.page,
            html: apply_highlights(&text, &highlights.value, &self.highlight_config),
            highlight_count: highlights.value.len(),
            warnings: highlights.warning.into_iter().collect(),
        })
    }
}
