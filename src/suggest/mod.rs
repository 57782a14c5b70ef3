//! Suggestion model for the engine
//!
//! Every analyzer, whatever its native output shape, is normalized into a
//! [`Suggestion`] at the adapter boundary. Category-specific data lives only
//! inside [`SuggestionDetail`]; the store never sees source-specific shapes.

pub mod advisory;
pub mod llm;
pub mod reconcile;
pub mod store;

use crate::util::{hash_str, slice_chars};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

pub use advisory::AdvisoryReason;

/// Fixed category taxonomy. Determines styling and the visibility toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Spelling,
    Grammar,
    Clarity,
    Conciseness,
    Readability,
    Passive,
    Advisory,
}

impl Category {
    pub fn all() -> [Category; 7] {
        [
            Category::Spelling,
            Category::Grammar,
            Category::Clarity,
            Category::Conciseness,
            Category::Readability,
            Category::Passive,
            Category::Advisory,
        ]
    }

    /// Stable machine key, also used in ids and cache keys.
    pub fn key(&self) -> &'static str {
        match self {
            Category::Spelling => "spelling",
            Category::Grammar => "grammar",
            Category::Clarity => "clarity",
            Category::Conciseness => "conciseness",
            Category::Readability => "readability",
            Category::Passive => "passive",
            Category::Advisory => "advisory",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Spelling => "Spelling",
            Category::Grammar => "Grammar",
            Category::Clarity => "Clarity",
            Category::Conciseness => "Conciseness",
            Category::Readability => "Readability",
            Category::Passive => "Passive Voice",
            Category::Advisory => "Advisory",
        }
    }

    /// Mark color (hex) used by the host when styling annotations.
    pub fn color(&self) -> &'static str {
        match self {
            Category::Spelling => "#EF4444",
            Category::Grammar => "#DC2626",
            Category::Clarity => "#3B82F6",
            Category::Conciseness => "#10B981",
            Category::Readability => "#8B5CF6",
            Category::Passive => "#F97316",
            Category::Advisory => "#F59E0B",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Category::Spelling => "spell-error",
            Category::Grammar => "grammar-error",
            Category::Clarity => "clarity-error",
            Category::Conciseness => "conciseness-error",
            Category::Readability => "readability-error",
            Category::Passive => "passive-error",
            Category::Advisory => "advisory-comment",
        }
    }

    /// Painting priority when marks overlap; higher wins.
    pub fn paint_priority(&self) -> u8 {
        match self {
            Category::Spelling => 6,
            Category::Grammar => 5,
            Category::Conciseness => 4,
            Category::Clarity => 3,
            Category::Passive => 2,
            Category::Readability => 1,
            Category::Advisory => 0,
        }
    }

    /// Anchor text comparison ignores case for spelling only.
    pub fn case_insensitive_anchor(&self) -> bool {
        matches!(self, Category::Spelling)
    }

    /// Replacements come from a remote rewrite requested when the panel opens.
    pub fn is_rewrite_backed(&self) -> bool {
        matches!(self, Category::Passive | Category::Readability)
    }

    /// Whether a result computed against an older snapshot may be remapped
    /// onto the current text instead of being discarded.
    pub fn tolerates_remap(&self) -> bool {
        matches!(self, Category::Spelling | Category::Advisory)
    }

    /// Advisory comments get the two-tier (session / permanent) dismissal.
    pub fn is_advisory(&self) -> bool {
        matches!(self, Category::Advisory)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Where a suggestion came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuggestionSource {
    /// Local rule-based checks, no network cost
    Rules,
    /// The embedded linter with its own lint taxonomy
    Linter,
    /// Remote language model
    Llm,
}

/// State of the lazily-requested rewrite for passive/readability suggestions.
#[derive(Debug, Clone, PartialEq)]
pub enum RewriteState {
    NotRequested,
    Pending { requested_at: Instant },
    Ready,
    Failed(String),
}

/// Category-specific payload. The variant determines the category.
#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionDetail {
    Spelling,
    Grammar {
        lint_kind: String,
        title: String,
    },
    Clarity {
        lint_kind: Option<String>,
    },
    Conciseness,
    Readability {
        grade: f32,
        rewrite: RewriteState,
    },
    Passive {
        /// The flagged passive phrase, as a char range into the document.
        phrase_start: usize,
        phrase_end: usize,
        rewrite: RewriteState,
    },
    Advisory {
        reason: AdvisoryReason,
        /// Session-tier dismissal: hidden until the next load.
        dismissed: bool,
    },
}

impl SuggestionDetail {
    pub fn category(&self) -> Category {
        match self {
            SuggestionDetail::Spelling => Category::Spelling,
            SuggestionDetail::Grammar { .. } => Category::Grammar,
            SuggestionDetail::Clarity { .. } => Category::Clarity,
            SuggestionDetail::Conciseness => Category::Conciseness,
            SuggestionDetail::Readability { .. } => Category::Readability,
            SuggestionDetail::Passive { .. } => Category::Passive,
            SuggestionDetail::Advisory { .. } => Category::Advisory,
        }
    }
}

/// A finding anchored to a half-open char range of the plain-text document.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub id: String,
    pub start: usize,
    pub end: usize,
    /// Exact substring the suggestion applies to, captured at creation.
    pub anchor_text: String,
    /// Ordered candidate replacements; empty for advice-only suggestions.
    pub replacements: Vec<String>,
    pub explanation: String,
    pub source: SuggestionSource,
    pub detail: SuggestionDetail,
}

impl Suggestion {
    /// Build a suggestion anchored at `[start, end)` of `text`.
    ///
    /// Returns `None` when the range is empty or out of bounds, so an adapter
    /// can never construct an anchor that does not exist in its input.
    pub fn anchored(
        text: &str,
        start: usize,
        end: usize,
        source: SuggestionSource,
        detail: SuggestionDetail,
    ) -> Option<Self> {
        if start >= end {
            return None;
        }
        let anchor_text = slice_chars(text, start, end)?.to_string();
        let category = detail.category();
        Some(Self {
            id: suggestion_id(category, start, &anchor_text),
            start,
            end,
            anchor_text,
            replacements: Vec::new(),
            explanation: String::new(),
            source,
            detail,
        })
    }

    pub fn with_replacements(mut self, replacements: Vec<String>) -> Self {
        self.replacements = replacements;
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn category(&self) -> Category {
        self.detail.category()
    }

    /// The `(start, end, anchor_text)` triple used for dedup.
    pub fn anchor_key(&self) -> (usize, usize, &str) {
        (self.start, self.end, self.anchor_text.as_str())
    }

    /// Whether the suggestion still matches `text` at its recorded offsets.
    pub fn is_valid_in(&self, text: &str) -> bool {
        reconcile::anchor_matches(
            text,
            self.start,
            self.end,
            &self.anchor_text,
            self.category().case_insensitive_anchor(),
        )
    }

    /// Session-dismissed advisory comments stay in the store but are hidden.
    pub fn is_session_dismissed(&self) -> bool {
        matches!(self.detail, SuggestionDetail::Advisory { dismissed: true, .. })
    }

    pub fn rewrite_state(&self) -> Option<&RewriteState> {
        match &self.detail {
            SuggestionDetail::Readability { rewrite, .. }
            | SuggestionDetail::Passive { rewrite, .. } => Some(rewrite),
            _ => None,
        }
    }

    pub(crate) fn rewrite_state_mut(&mut self) -> Option<&mut RewriteState> {
        match &mut self.detail {
            SuggestionDetail::Readability { rewrite, .. }
            | SuggestionDetail::Passive { rewrite, .. } => Some(rewrite),
            _ => None,
        }
    }

    /// Move the anchor by `delta` characters. Inner ranges move with it.
    pub(crate) fn shift(&mut self, delta: isize) {
        self.start = shift_offset(self.start, delta);
        self.end = shift_offset(self.end, delta);
        if let SuggestionDetail::Passive {
            phrase_start,
            phrase_end,
            ..
        } = &mut self.detail
        {
            *phrase_start = shift_offset(*phrase_start, delta);
            *phrase_end = shift_offset(*phrase_end, delta);
        }
    }
}

fn shift_offset(offset: usize, delta: isize) -> usize {
    offset.saturating_add_signed(delta)
}

/// Base id for a new finding. A suggestion keeps its id when edits move it,
/// so the store suffixes a later finding whose base id is already held.
pub fn suggestion_id(category: Category, start: usize, anchor_text: &str) -> String {
    let hash = hash_str(anchor_text);
    format!("{}-{}-{}", category.key(), start, &hash[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchored_captures_text() {
        let text = "I recieve mail";
        let s = Suggestion::anchored(text, 2, 9, SuggestionSource::Llm, SuggestionDetail::Spelling)
            .unwrap();
        assert_eq!(s.anchor_text, "recieve");
        assert_eq!(s.category(), Category::Spelling);
        assert!(s.id.starts_with("spelling-2-"));
    }

    #[test]
    fn test_anchored_rejects_empty_and_out_of_range() {
        let text = "short";
        assert!(
            Suggestion::anchored(text, 2, 2, SuggestionSource::Rules, SuggestionDetail::Conciseness)
                .is_none()
        );
        assert!(
            Suggestion::anchored(text, 2, 40, SuggestionSource::Rules, SuggestionDetail::Conciseness)
                .is_none()
        );
    }

    #[test]
    fn test_ids_are_deterministic() {
        let a = suggestion_id(Category::Clarity, 4, "just");
        let b = suggestion_id(Category::Clarity, 4, "just");
        let c = suggestion_id(Category::Clarity, 5, "just");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_shift_moves_passive_phrase() {
        let text = "The ball was thrown by Sam.";
        let mut s = Suggestion::anchored(
            text,
            0,
            27,
            SuggestionSource::Rules,
            SuggestionDetail::Passive {
                phrase_start: 9,
                phrase_end: 19,
                rewrite: RewriteState::NotRequested,
            },
        )
        .unwrap();
        s.shift(3);
        assert_eq!((s.start, s.end), (3, 30));
        match s.detail {
            SuggestionDetail::Passive {
                phrase_start,
                phrase_end,
                ..
            } => assert_eq!((phrase_start, phrase_end), (12, 22)),
            _ => panic!("expected passive detail"),
        }
    }

    #[test]
    fn test_spelling_is_case_insensitive_only() {
        assert!(Category::Spelling.case_insensitive_anchor());
        assert!(!Category::Grammar.case_insensitive_anchor());
        assert!(!Category::Advisory.case_insensitive_anchor());
    }
}
