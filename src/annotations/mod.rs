//! Annotation module
//!
//! Per-page annotations of PDF documents, persisted as JSON side files.
//!
//! # Kinds
//!
//! - Highlights: character ranges of a page's extracted text
//! - Comments: named comments with their own vote counts
//! - Notes: one free-text note per page
//! - Document votes: one counter per document, shared file
//!
//! # Files
//!
//! - `<document>_highlights.json`: `{"<page>": [{"range": [start, end]}]}`
//! - `<document>_comments.json`: `{"<page>": [{"name", "comment", "votes"}]}`
//! - `<document>_notes.json`: `{"<page>": "<text>"}`
//! - `pdf_votes.json`: `{"<document>": <count>}`

mod editor;
mod store;
mod types;
mod votes;

pub use editor::{AnnotationEditor, EditorError, PageView, RenderedPage};
pub use store::{AnnotationStore, BackingFile, Recovered, StoreError, VOTES_FILE};
pub use types::{
    AnnotationKind, Comment, Comments, Highlight, Highlights, Notes, PageIndex, PageMap, PageRef,
    ValidationError, VoteDirection,
};
pub use votes::{VoteCounts, VoteTally};
