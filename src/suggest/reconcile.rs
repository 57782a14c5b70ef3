//! Offset reconciliation
//!
//! Keeps anchors consistent with the live text between analyzer runs:
//! compute the edit, shift or drop each range, then re-slice and compare
//! against the captured anchor text. Offset arithmetic alone is never trusted.

use crate::util::slice_chars;
use std::collections::HashSet;

/// A single contiguous edit: chars `[start, end)` of the previous text were
/// replaced by `inserted_len` chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub inserted_len: usize,
}

impl TextEdit {
    pub fn new(start: usize, end: usize, inserted_len: usize) -> Self {
        Self {
            start,
            end: end.max(start),
            inserted_len,
        }
    }

    /// Net change in document length.
    pub fn delta(&self) -> isize {
        self.inserted_len as isize - (self.end - self.start) as isize
    }

    /// Derive the minimal single edit turning `old` into `new` by trimming
    /// the common prefix and suffix. `None` when the texts are identical.
    pub fn between(old: &str, new: &str) -> Option<TextEdit> {
        if old == new {
            return None;
        }
        let old_chars: Vec<char> = old.chars().collect();
        let new_chars: Vec<char> = new.chars().collect();

        let prefix = old_chars
            .iter()
            .zip(new_chars.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let max_suffix = old_chars.len().min(new_chars.len()) - prefix;
        let suffix = old_chars
            .iter()
            .rev()
            .zip(new_chars.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();

        Some(TextEdit {
            start: prefix,
            end: old_chars.len() - suffix,
            inserted_len: new_chars.len() - suffix - prefix,
        })
    }
}

/// Outcome of remapping one range across an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remap {
    Unchanged,
    Shifted { start: usize, end: usize },
    /// The edit touched the anchored range.
    Overlapped,
}

/// Apply the shift policy to `[start, end)`.
///
/// Entirely before the edit: untouched. Entirely after: shifted by the net
/// delta. Any overlap: dropped, even a single char adjacent inside the range.
pub fn remap_range(start: usize, end: usize, edit: &TextEdit) -> Remap {
    if end <= edit.start {
        return Remap::Unchanged;
    }
    if start >= edit.end {
        let delta = edit.delta();
        let (Some(start), Some(end)) = (
            start.checked_add_signed(delta),
            end.checked_add_signed(delta),
        ) else {
            return Remap::Overlapped;
        };
        return Remap::Shifted { start, end };
    }
    Remap::Overlapped
}

/// `text[start..end] == anchor` (case-insensitive when requested), with the
/// range invariant `start < end <= len(text)`.
pub fn anchor_matches(
    text: &str,
    start: usize,
    end: usize,
    anchor: &str,
    case_insensitive: bool,
) -> bool {
    if start >= end {
        return false;
    }
    match slice_chars(text, start, end) {
        Some(actual) if case_insensitive => actual.to_lowercase() == anchor.to_lowercase(),
        Some(actual) => actual == anchor,
        None => false,
    }
}

/// Net length change of accepting `replacement` over `anchor_text`.
pub fn accept_delta(anchor_text: &str, replacement: &str) -> isize {
    replacement.chars().count() as isize - anchor_text.chars().count() as isize
}

/// Word-set Jaccard similarity in `[0, 1]`; 1.0 for identical word sets.
pub fn word_similarity(a: &str, b: &str) -> f64 {
    let words_a = word_set(a);
    let words_b = word_set(b);
    if words_a.is_empty() && words_b.is_empty() {
        return 1.0;
    }
    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    intersection as f64 / union as f64
}

fn word_set(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}
