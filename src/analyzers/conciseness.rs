//! Conciseness: wordy phrases with shorter equivalents.

use super::{AnalyzeFuture, Analyzer};
use crate::suggest::{Category, Suggestion, SuggestionDetail, SuggestionSource};
use crate::util::byte_to_char;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Wordy phrase -> replacements, best first.
const PHRASES: &[(&str, &[&str])] = &[
    ("a large number of", &["many"]),
    ("a majority of", &["most"]),
    ("a number of", &["some", "several"]),
    ("additional", &["more", "extra"]),
    ("approximately", &["about"]),
    ("as a means of", &["to"]),
    ("at the present time", &["now"]),
    ("at this point in time", &["now"]),
    ("commence", &["begin", "start"]),
    ("demonstrate", &["show", "prove"]),
    ("due to the fact that", &["because"]),
    ("each and every", &["each", "every"]),
    ("endeavor", &["try"]),
    ("facilitate", &["help", "ease"]),
    ("first and foremost", &["first"]),
    ("for the purpose of", &["to", "for"]),
    ("has the ability to", &["can"]),
    ("in close proximity to", &["near"]),
    ("in order to", &["to"]),
    ("in spite of the fact that", &["although", "though"]),
    ("in the event that", &["if"]),
    ("in the near future", &["soon"]),
    ("is able to", &["can"]),
    ("make a decision", &["decide"]),
    ("on a daily basis", &["daily"]),
    ("prior to", &["before"]),
    ("subsequent to", &["after"]),
    ("sufficient", &["enough"]),
    ("terminate", &["end", "stop"]),
    ("the majority of", &["most"]),
    ("until such time as", &["until"]),
    ("utilize", &["use"]),
    ("whether or not", &["whether"]),
    ("with regard to", &["about", "regarding"]),
    ("with the exception of", &["except"]),
];

struct Lexicon {
    regex: Regex,
    replacements: HashMap<&'static str, &'static [&'static str]>,
}

fn lexicon() -> Option<&'static Lexicon> {
    static LEXICON: OnceLock<Option<Lexicon>> = OnceLock::new();
    LEXICON
        .get_or_init(|| {
            // Longest first so "in spite of the fact that" beats shorter overlaps.
            let mut phrases: Vec<&str> = PHRASES.iter().map(|(p, _)| *p).collect();
            phrases.sort_by_key(|p| std::cmp::Reverse(p.len()));
            let alternation = phrases
                .iter()
                .map(|p| p.split(' ').map(regex::escape).collect::<Vec<_>>().join(r"\s+"))
                .collect::<Vec<_>>()
                .join("|");
            let regex = Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).ok()?;
            Some(Lexicon {
                regex,
                replacements: PHRASES.iter().copied().collect(),
            })
        })
        .as_ref()
}

fn normalize(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep the capitalization of the phrase's first letter.
fn match_case(original: &str, replacement: &str) -> String {
    let starts_upper = original.chars().next().is_some_and(char::is_uppercase);
    if !starts_upper {
        return replacement.to_string();
    }
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Default, Clone)]
pub struct ConcisenessAnalyzer;

impl ConcisenessAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, text: &str) -> Vec<Suggestion> {
        let Some(lexicon) = lexicon() else {
            return Vec::new();
        };
        lexicon
            .regex
            .find_iter(text)
            .filter_map(|m| {
                let phrase = m.as_str();
                let key = normalize(phrase);
                let options = lexicon.replacements.get(key.as_str())?;
                let start = byte_to_char(text, m.start());
                let end = start + phrase.chars().count();
                let replacements = options.iter().map(|r| match_case(phrase, r)).collect();
                Suggestion::anchored(
                    text,
                    start,
                    end,
                    SuggestionSource::Rules,
                    SuggestionDetail::Conciseness,
                )
                .map(|s| {
                    s.with_replacements(replacements)
                        .with_explanation(format!("\u{201c}{}\u{201d} can be said more briefly.", phrase))
                })
            })
            .collect()
    }
}

impl Analyzer for ConcisenessAnalyzer {
    fn name(&self) -> &'static str {
        "conciseness"
    }

    fn categories(&self) -> &'static [Category] {
        &[Category::Conciseness]
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
    fn test_finds_wordy_phrases_with_replacements() {
        let text = "We met in order to decide. Due to the fact that it rained, we left.";
        let found = ConcisenessAnalyzer::new().check(text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].anchor_text, "in order to");
        assert_eq!(found[0].replacements, vec!["to".to_string()]);
        assert_eq!(found[1].anchor_text, "Due to the fact that");
        assert_eq!(found[1].replacements, vec!["Because".to_string()]);
    }

    #[test]
    fn test_phrase_spanning_extra_whitespace() {
        let text = "Call me prior  to noon.";
        let found = ConcisenessAnalyzer::new().check(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].anchor_text, "prior  to");
        assert_eq!(found[0].replacements, vec!["before".to_string()]);
    }

    #[test]
    fn test_longest_phrase_wins() {
        let found = ConcisenessAnalyzer::new().check("The majority of people agree.");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].anchor_text, "The majority of");
        assert_eq!(found[0].replacements, vec!["Most".to_string()]);
    }

    #[test]
    fn test_no_partial_words() {
        assert!(ConcisenessAnalyzer::new().check("Utilizes additionally").is_empty());
    }
}
