//! Annotation record types
//!
//! Each annotation kind is stored as a JSON object keyed by page index
//! (encoded as a decimal string). The marker types implementing
//! [`AnnotationKind`] tie a kind to its backing-file suffix and to the shape of
//! a single page's value.

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::documents::DocumentName;

/// Zero-based page index
pub type PageIndex = u32;

/// Per-document mapping from page index to that page's value.
///
/// serde_json writes integer map keys as strings, so this serializes to
/// `{"0": ..., "12": ...}` and reads the same shape back.
pub type PageMap<T> = BTreeMap<PageIndex, T>;

/// Validation failures on submission. Nothing is persisted when one occurs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Highlight start ({start}) must be less than end ({end})")]
    EmptyRange { start: usize, end: usize },

    #[error("Comment name must not be empty")]
    EmptyCommentName,

    #[error("Comment text must not be empty")]
    EmptyCommentText,

    #[error("Page {page} is out of range (document has {page_count} pages)")]
    PageOutOfRange { page: PageIndex, page_count: u32 },

    #[error("Vote count {votes} cannot be changed any further")]
    VoteOverflow { votes: i64 },
}

/// A highlighted character range `[start, end)` of a page's extracted text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub range: [usize; 2],
}

impl Highlight {
    /// Create a highlight, rejecting empty or inverted ranges
    pub fn new(start: usize, end: usize) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::EmptyRange { start, end });
        }
        Ok(Self { range: [start, end] })
    }

    pub fn start(&self) -> usize {
        self.range[0]
    }

    pub fn end(&self) -> usize {
        self.range[1]
    }
}

/// A reader comment with its own vote count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub name: String,
    pub comment: String,
    #[serde(default)]
    pub votes: i64,
}

impl Comment {
    /// Create a comment with zero votes. Name and text must be non-blank.
    pub fn new(name: &str, text: &str) -> Result<Self, ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyCommentName);
        }
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyCommentText);
        }
        Ok(Self {
            name: name.to_string(),
            comment: text.to_string(),
            votes: 0,
        })
    }

    /// Apply one vote and return the new count
    pub fn vote(&mut self, direction: VoteDirection) -> Result<i64, ValidationError> {
        self.votes = direction.apply(self.votes)?;
        Ok(self.votes)
    }
}

/// Direction of a single vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn delta(self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }

    /// New count after this vote; fails instead of wrapping at the `i64` bounds
    pub fn apply(self, votes: i64) -> Result<i64, ValidationError> {
        votes
            .checked_add(self.delta())
            .ok_or(ValidationError::VoteOverflow { votes })
    }
}

/// Explicit (document, page) context for every editor operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub document: DocumentName,
    pub page: PageIndex,
}

impl PageRef {
    pub fn new(document: DocumentName, page: PageIndex) -> Self {
        Self { document, page }
    }
}

/// An annotation kind persisted in its own per-document backing file
pub trait AnnotationKind: Send + Sync + 'static {
    /// Backing-file suffix: `<document>_<SUFFIX>.json`
    const SUFFIX: &'static str;

    /// Value stored for one page
    type Page: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static;
}

/// Highlight ranges, appended per page
#[derive(Debug)]
pub enum Highlights {}

impl AnnotationKind for Highlights {
    const SUFFIX: &'static str = "highlights";
    type Page = Vec<Highlight>;
}

/// Comments with votes, appended per page
#[derive(Debug)]
pub enum Comments {}

impl AnnotationKind for Comments {
    const SUFFIX: &'static str = "comments";
    type Page = Vec<Comment>;
}

/// One free-text note per page, replaced on save
#[derive(Debug)]
pub enum Notes {}

impl AnnotationKind for Notes {
    const SUFFIX: &'static str = "notes";
    type Page = String;
}
