//! HTML processing module
//!
//! Renders stored highlight ranges into extracted page text.

mod highlight;

pub use highlight::{apply_highlights, merge_ranges, HighlightConfig};
