//! Line normalization: comment stripping and whitespace compaction of a single script line.

use crate::types::{BLANK_SYMBOL, COMMENT_MARK};

/// A script line after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<'a> {
    /// The raw line with any comment removed.
    pub text: &'a str,
    /// `text` with every whitespace character removed.
    pub compact: String,
}

impl Line<'_> {
    /// Whether nothing but whitespace and comments was on the line.
    pub fn is_blank(&self) -> bool {
        self.compact.is_empty()
    }

    /// Everything after the first `=` in the comment-stripped text, trimmed at both ends.
    ///
    /// Used for directives whose value keeps its inner whitespace. Every inner whitespace
    /// character becomes a blank cell.
    pub fn raw_value(&self) -> String {
        self.text
            .split_once('=')
            .map(|(_, value)| value.trim())
            .unwrap_or_default()
            .chars()
            .map(|c| if c.is_whitespace() { BLANK_SYMBOL } else { c })
            .collect()
    }
}

/// Strips the comment from `raw` and compacts the remainder.
pub fn normalize(raw: &str) -> Line<'_> {
    let text = strip_comment(raw);
    let compact = text.chars().filter(|c| !c.is_whitespace()).collect();

    Line { text, compact }
}

fn strip_comment(raw: &str) -> &str {
    match raw.find(COMMENT_MARK) {
        Some(position) => &raw[..position],
        None => raw,
    }
}
