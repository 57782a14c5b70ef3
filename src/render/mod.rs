//! Annotation rendering
//!
//! Suggestions live in plain-text char offsets. The host surface addresses
//! its document with its own positions (a rich document interleaves node
//! boundaries with text), so painting goes through a [`DocumentMap`] built
//! from the surface's text nodes. Click resolution uses the id carried on
//! each [`Mark`], never offsets recomputed after the fact.

pub mod panel;

pub use panel::{Panel, PanelAction, PanelOptions};

use crate::suggest::{Category, Suggestion};
use crate::util::{char_len, slice_chars};

/// Decoration handed to the host: what to mark, in plain-text offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub id: String,
    pub category: Category,
    pub start: usize,
    pub end: usize,
}

impl From<&Suggestion> for Annotation {
    fn from(s: &Suggestion) -> Self {
        Self {
            id: s.id.clone(),
            category: s.category(),
            start: s.start,
            end: s.end,
        }
    }
}

/// An inline mark in surface positions, `[from, to)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    pub id: String,
    pub category: Category,
    pub from: usize,
    pub to: usize,
    pub css_class: &'static str,
}

#[derive(Debug, Clone)]
struct TextNode {
    pos: usize,
    offset: usize,
    len: usize,
}

/// Maps plain-text offsets onto surface positions.
///
/// The plain-text projection is the concatenation of the surface's text
/// nodes in document order.
#[derive(Debug, Clone, Default)]
pub struct DocumentMap {
    nodes: Vec<TextNode>,
    text: String,
    size: usize,
}

impl DocumentMap {
    /// Build from `(surface_position, text)` pairs in document order.
    pub fn new<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = (usize, S)>,
        S: AsRef<str>,
    {
        let mut map = Self::default();
        for (pos, text) in nodes {
            let text = text.as_ref();
            let len = char_len(text);
            map.nodes.push(TextNode {
                pos,
                offset: char_len(&map.text),
                len,
            });
            map.text.push_str(text);
            map.size = map.size.max(pos + len);
        }
        map
    }

    /// A surface whose positions are the plain-text offsets themselves.
    pub fn flat(text: &str) -> Self {
        Self::new([(0, text)])
    }

    pub fn plain_text(&self) -> &str {
        &self.text
    }

    /// Surface content size; positions are `0..size`.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Surface position where a range starting at `offset` begins. On a
    /// node boundary that is the start of the later node.
    pub fn offset_to_pos_start(&self, offset: usize) -> Option<usize> {
        self.nodes
            .iter()
            .find(|n| offset >= n.offset && offset < n.offset + n.len)
            .map(|n| n.pos + (offset - n.offset))
    }

    /// Surface position where a range ending at `offset` ends. On a node
    /// boundary that is the end of the earlier node.
    pub fn offset_to_pos_end(&self, offset: usize) -> Option<usize> {
        self.nodes
            .iter()
            .find(|n| offset > n.offset && offset <= n.offset + n.len)
            .map(|n| n.pos + (offset - n.offset))
    }

    /// Surface ranges covering plain-text `[start, end)`, one per text node
    /// it touches. Positions between nodes are never included.
    pub fn ranges(&self, start: usize, end: usize) -> Vec<(usize, usize)> {
        self.nodes
            .iter()
            .filter_map(|n| {
                let lo = start.max(n.offset);
                let hi = end.min(n.offset + n.len);
                (lo < hi).then(|| (n.pos + (lo - n.offset), n.pos + (hi - n.offset)))
            })
            .collect()
    }

    /// Plain-text offset of a surface position, if it falls inside text.
    pub fn pos_to_offset(&self, pos: usize) -> Option<usize> {
        self.nodes
            .iter()
            .find(|n| pos >= n.pos && pos <= n.pos + n.len)
            .map(|n| n.offset + (pos - n.pos))
    }
}

/// Paint visible suggestions as marks.
///
/// Each surface position takes the highest-priority category covering it;
/// ties keep the suggestion painted first. Consecutive positions painted by
/// the same suggestion merge into one mark, so a suggestion spanning text
/// nodes yields one mark per node. Suggestions whose anchor no longer matches
/// the mapped text are skipped.
pub fn paint(map: &DocumentMap, suggestions: &[&Suggestion]) -> Vec<Mark> {
    let size = map.size();
    let mut canvas: Vec<Option<usize>> = vec![None; size];

    for (idx, s) in suggestions.iter().enumerate() {
        if !s.is_valid_in(map.plain_text()) {
            tracing::debug!(id = %s.id, "skipping mark for drifted anchor");
            continue;
        }
        let priority = s.category().paint_priority();
        for (from, to) in map.ranges(s.start, s.end) {
            for cell in &mut canvas[from..to] {
                match cell {
                    Some(existing) if suggestions[*existing].category().paint_priority() >= priority => {}
                    _ => *cell = Some(idx),
                }
            }
        }
    }

    let mut marks = Vec::new();
    let mut i = 0;
    while i < size {
        let Some(idx) = canvas[i] else {
            i += 1;
            continue;
        };
        let mut j = i;
        while j < size && canvas[j] == Some(idx) {
            j += 1;
        }
        let s = suggestions[idx];
        marks.push(Mark {
            id: s.id.clone(),
            category: s.category(),
            from: i,
            to: j,
            css_class: s.category().css_class(),
        });
        i = j;
    }
    marks
}

/// Resolve a surface position to the id of the mark under it.
///
/// A position exactly on the end of a mark still hits it unless another mark
/// starts there.
pub fn resolve_click(marks: &[Mark], pos: usize) -> Option<&str> {
    marks
        .iter()
        .find(|m| m.from <= pos && pos < m.to)
        .or_else(|| marks.iter().find(|m| m.to == pos))
        .map(|m| m.id.as_str())
}

/// Text currently covered by a mark, for hosts that show it in the panel.
pub fn mark_text<'a>(map: &'a DocumentMap, mark: &Mark) -> Option<&'a str> {
    let start = map.pos_to_offset(mark.from)?;
    let end = map.pos_to_offset(mark.to)?;
    slice_chars(map.plain_text(), start, end)
}
