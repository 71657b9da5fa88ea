//! Highlight rendering for extracted page text
//!
//! All ranges are resolved against the original text in a single pass, so
//! markup inserted for one highlight never shifts the offsets of another.
//! Overlapping or touching ranges are merged into one marked span.

use std::ops::Range;

use crate::annotations::Highlight;

/// Configuration for highlight rendering
#[derive(Debug, Clone)]
pub struct HighlightConfig {
    /// Element wrapped around each highlighted span
    pub tag: String,
    /// Optional CSS class on the element
    pub class: Option<String>,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            tag: "mark".to_string(),
            class: None,
        }
    }
}

impl HighlightConfig {
    fn open_tag(&self) -> String {
        match &self.class {
            Some(class) => format!(
                "<{} class=\"{}\">",
                self.tag,
                html_escape::encode_double_quoted_attribute(class)
            ),
            None => format!("<{}>", self.tag),
        }
    }

    fn close_tag(&self) -> String {
        format!("</{}>", self.tag)
    }
}

/// Sorted, disjoint character ranges covered by `highlights`, clamped to
/// `char_len`. Ranges that clamp to nothing are dropped.
pub fn merge_ranges(char_len: usize, highlights: &[Highlight]) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = highlights
        .iter()
        .map(|h| h.start().min(char_len)..h.end().min(char_len))
        .filter(|r| r.start < r.end)
        .collect();
    ranges.sort_by_key(|r| r.start);

    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

/// Escape `text` as HTML and wrap every highlighted character range.
///
/// Offsets count Unicode scalar values, not bytes.
pub fn apply_highlights(text: &str, highlights: &[Highlight], config: &HighlightConfig) -> String {
    // byte offset of every char boundary, including the end of the text
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = boundaries.len() - 1;

    let open = config.open_tag();
    let close = config.close_tag();

    let mut output = String::with_capacity(text.len() + highlights.len() * (open.len() + close.len()));
    let mut cursor = 0;
    for range in merge_ranges(char_len, highlights) {
        output.push_str(&html_escape::encode_text(&text[boundaries[cursor]..boundaries[range.start]]));
        output.push_str(&open);
        output.push_str(&html_escape::encode_text(
            &text[boundaries[range.start]..boundaries[range.end]],
        ));
        output.push_str(&close);
        cursor = range.end;
    }
    output.push_str(&html_escape::encode_text(&text[boundaries[cursor]..]));

    output
}
