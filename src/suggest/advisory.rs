//! Advisory comments: strategic, sentence-level feedback from the remote model.
//!
//! The model returns whole sentences, not offsets. Anchoring is exact-match
//! only; a sentence that cannot be found verbatim is dropped.

use super::{Suggestion, SuggestionDetail, SuggestionSource};
use crate::util::{byte_to_char, char_len, hash_str};
use serde::{Deserialize, Serialize};

/// Minimum anchor length; shorter sentences are too ambiguous to place.
pub const DEFAULT_MIN_ANCHOR_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdvisoryReason {
    StrengthenClaim,
    DefineKeyTerm,
    ImproveStructuralFlow,
    AddCallToAction,
    AcknowledgeAlternatives,
}

impl AdvisoryReason {
    pub fn all() -> [AdvisoryReason; 5] {
        [
            AdvisoryReason::StrengthenClaim,
            AdvisoryReason::DefineKeyTerm,
            AdvisoryReason::ImproveStructuralFlow,
            AdvisoryReason::AddCallToAction,
            AdvisoryReason::AcknowledgeAlternatives,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            AdvisoryReason::StrengthenClaim => "Strengthen a Claim",
            AdvisoryReason::DefineKeyTerm => "Define a Key Term/Acronym",
            AdvisoryReason::ImproveStructuralFlow => "Improve Structural Flow",
            AdvisoryReason::AddCallToAction => "Add a Clear Call to Action",
            AdvisoryReason::AcknowledgeAlternatives => "Acknowledge Alternatives",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AdvisoryReason::StrengthenClaim => {
                "Add data, statistics, or concrete examples to support your claims."
            }
            AdvisoryReason::DefineKeyTerm => {
                "Clarify technical terms or acronyms for better understanding."
            }
            AdvisoryReason::ImproveStructuralFlow => {
                "Break down complex paragraphs and improve document organization."
            }
            AdvisoryReason::AddCallToAction => {
                "Guide readers on what to do next with clear action items."
            }
            AdvisoryReason::AcknowledgeAlternatives => {
                "Consider and mention alternative approaches or solutions."
            }
        }
    }

    /// Parse a model-supplied label. Unknown labels fall back to
    /// [`AdvisoryReason::StrengthenClaim`].
    pub fn from_label(label: &str) -> Self {
        let wanted = label.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|r| {
                let known = r.label().to_lowercase();
                known == wanted || (!wanted.is_empty() && known.starts_with(&wanted))
            })
            .unwrap_or(AdvisoryReason::StrengthenClaim)
    }
}

/// Content hash keying permanent dismissals. Independent of offsets, so a
/// dismissal survives edits and re-analysis.
pub fn dismissal_hash(reason: AdvisoryReason, anchor_text: &str) -> String {
    hash_str(&format!("{}\u{1f}{}", reason.label(), anchor_text))
}

/// Locate `candidate` in `document` by exact substring search.
///
/// Returns the char range of the first occurrence of the trimmed candidate,
/// or `None` when it is shorter than `min_chars` or not present verbatim.
pub fn anchor_sentence(document: &str, candidate: &str, min_chars: usize) -> Option<(usize, usize)> {
    let needle = candidate.trim();
    if needle.is_empty() || char_len(needle) < min_chars {
        return None;
    }
    let byte_start = document.find(needle)?;
    let start = byte_to_char(document, byte_start);
    Some((start, start + char_len(needle)))
}

/// Raw advisory item as returned by the remote model.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdvisoryItem {
    #[serde(default, alias = "originalText")]
    pub original_text: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub reason: String,
}

/// Turn raw items into anchored advisory suggestions, dropping anything that
/// cannot be placed exactly.
pub fn anchor_items(document: &str, items: Vec<AdvisoryItem>, min_chars: usize) -> Vec<Suggestion> {
    let total = items.len();
    let anchored: Vec<Suggestion> = items
        .into_iter()
        .filter_map(|item| {
            let Some((start, end)) = anchor_sentence(document, &item.original_text, min_chars) else {
                tracing::debug!(
                    snippet = %crate::util::truncate(&item.original_text, 50),
                    reason = %item.reason,
                    "advisory sentence not found verbatim; dropped"
                );
                return None;
            };
            let reason = AdvisoryReason::from_label(&item.reason);
            Suggestion::anchored(
                document,
                start,
                end,
                SuggestionSource::Llm,
                SuggestionDetail::Advisory {
                    reason,
                    dismissed: false,
                },
            )
            .map(|s| s.with_explanation(item.explanation))
        })
        .collect();

    tracing::info!(
        anchored = anchored.len(),
        returned = total,
        "advisory comments anchored"
    );
    anchored
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "Our platform is the best in the market. We will launch in Q3 with the new KPI dashboard.";

    #[test]
    fn test_exact_sentence_anchors_to_span() {
        let (start, end) =
            anchor_sentence(DOC, "Our platform is the best in the market.", 20).unwrap();
        assert_eq!((start, end), (0, 39));
    }

    #[test]
    fn test_paraphrase_is_dropped() {
        assert!(anchor_sentence(DOC, "Our platform is the very best in the market.", 20).is_none());
    }

    #[test]
    fn test_short_candidate_is_rejected() {
        assert!(anchor_sentence(DOC, "in Q3", 20).is_none());
        assert!(anchor_sentence(DOC, "   ", 20).is_none());
    }

    #[test]
    fn test_candidate_is_trimmed_before_search() {
        let (start, _) = anchor_sentence(DOC, "  We will launch in Q3 with the new KPI dashboard.\n", 20).unwrap();
        assert_eq!(start, 40);
    }

    #[test]
    fn test_anchor_uses_char_offsets() {
        let doc = "Café résumé notes. The rollout plan needs a named owner.";
        let (start, end) = anchor_sentence(doc, "The rollout plan needs a named owner.", 20).unwrap();
        assert_eq!(crate::util::slice_chars(doc, start, end), Some("The rollout plan needs a named owner."));
    }

    #[test]
    fn test_reason_parsing_falls_back() {
        assert_eq!(
            AdvisoryReason::from_label("Define a Key Term/Acronym"),
            AdvisoryReason::DefineKeyTerm
        );
        assert_eq!(
            AdvisoryReason::from_label("define a key term"),
            AdvisoryReason::DefineKeyTerm
        );
        assert_eq!(AdvisoryReason::from_label("Be Nicer"), AdvisoryReason::StrengthenClaim);
        assert_eq!(AdvisoryReason::from_label(""), AdvisoryReason::StrengthenClaim);
    }

    #[test]
    fn test_dismissal_hash_ignores_offsets_but_not_reason() {
        let a = dismissal_hash(AdvisoryReason::StrengthenClaim, "Our platform is the best.");
        let b = dismissal_hash(AdvisoryReason::StrengthenClaim, "Our platform is the best.");
        let c = dismissal_hash(AdvisoryReason::DefineKeyTerm, "Our platform is the best.");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_anchor_items_keeps_only_verbatim_matches() {
        let items = vec![
            AdvisoryItem {
                original_text: "Our platform is the best in the market.".into(),
                explanation: "Add a benchmark.".into(),
                reason: "Strengthen a Claim".into(),
            },
            AdvisoryItem {
                original_text: "This sentence does not exist in the doc.".into(),
                explanation: "n/a".into(),
                reason: "Improve Structural Flow".into(),
            },
        ];
        let out = anchor_items(DOC, items, 20);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].explanation, "Add a benchmark.");
        assert_eq!(out[0].anchor_text, "Our platform is the best in the market.");
    }
}
