//! Clarity: weasel words and dismissive qualifiers.

use super::{AnalyzeFuture, Analyzer};
use crate::suggest::{Category, Suggestion, SuggestionDetail, SuggestionSource};
use crate::util::byte_to_char;
use regex::Regex;
use std::sync::OnceLock;

/// `(pattern, lexicon key, explanation)`
const LEXICON: &[(&str, &str, &str)] = &[
    (
        r"obvious(?:ly)?",
        "obvious",
        "What is obvious to you may not be to your reader, and the word can read as dismissive. State the point directly.",
    ),
    (
        r"basic(?:ally)?",
        "basic",
        "This word usually weakens the sentence. Explain the idea without it.",
    ),
    (
        r"simpl[ey]",
        "simple",
        "This word can usually be dropped for a stronger, more direct instruction.",
    ),
    (
        r"of\s+course",
        "of-course",
        "This phrase assumes the point is self-evident. Explain why it is true instead.",
    ),
    (
        r"clear(?:ly)?",
        "clear",
        "Calling something clear rarely makes it so. Make the point without the qualifier.",
    ),
    (
        r"just",
        "just",
        "This word can weaken the statement or sound condescending. Removing it usually reads more confidently.",
    ),
    (
        r"everyone\s+knows",
        "everyone-knows",
        "This phrase can alienate readers who do not know. State the point directly.",
    ),
    (
        r"eas(?:y|ily)",
        "easy",
        "Calling a task easy can frustrate readers who find it hard. Encourage them another way.",
    ),
];

fn patterns() -> &'static [(Regex, &'static str, &'static str)] {
    static COMPILED: OnceLock<Vec<(Regex, &'static str, &'static str)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        LEXICON
            .iter()
            .filter_map(|(pattern, key, explanation)| {
                Regex::new(&format!(r"(?i)\b{}\b", pattern))
                    .ok()
                    .map(|re| (re, *key, *explanation))
            })
            .collect()
    })
}

#[derive(Debug, Default, Clone)]
pub struct ClarityAnalyzer;

impl ClarityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, text: &str) -> Vec<Suggestion> {
        let mut out: Vec<Suggestion> = patterns()
            .iter()
            .flat_map(|(re, key, explanation)| {
                re.find_iter(text).filter_map(move |m| {
                    let start = byte_to_char(text, m.start());
                    let end = start + m.as_str().chars().count();
                    Suggestion::anchored(
                        text,
                        start,
                        end,
                        SuggestionSource::Rules,
                        SuggestionDetail::Clarity {
                            lint_kind: Some((*key).to_string()),
                        },
                    )
                    .map(|s| s.with_explanation(*explanation))
                })
            })
            .collect();
        out.sort_by_key(|s| (s.start, s.end));
        out
    }
}

impl Analyzer for ClarityAnalyzer {
    fn name(&self) -> &'static str {
        "clarity"
    }

    fn categories(&self) -> &'static [Category] {
        &[Category::Clarity]
    }

    fn source(&self) -> SuggestionSource {
        SuggestionSource::Rules
    }

    fn analyze<'a>(&'a self, text: &'a str) -> AnalyzeFuture<'a> {
        Box::pin(async move { Ok(self.check(text)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_weasel_words_with_char_offsets() {
        let text = "Café owners just know it. Of course, it is easy.";
        let found = ClarityAnalyzer::new().check(text);
        let anchors: Vec<&str> = found.iter().map(|s| s.anchor_text.as_str()).collect();
        assert_eq!(anchors, vec!["just", "Of course", "easy"]);
        assert!(found.iter().all(|s| s.is_valid_in(text)));
        assert_eq!(found[0].start, 12);
    }

    #[test]
    fn test_word_boundaries_respected() {
        let found = ClarityAnalyzer::new().check("Justice is unclear to adjusters.");
        assert!(found.is_empty());
    }

    #[test]
    fn test_explanations_attached() {
        let found = ClarityAnalyzer::new().check("Obviously, yes.");
        assert_eq!(found.len(), 1);
        assert!(found[0].explanation.contains("dismissive"));
        assert!(found[0].replacements.is_empty());
    }
}
