//! Remote spelling correction.
//!
//! Unique words are sent to the model, which answers with a map of
//! misspelled word -> corrections. Every occurrence of a reported word is
//! then located locally on word boundaries; the model never supplies offsets.

use super::{degrade, AnalyzeFuture, Analyzer};
use crate::config::EngineConfig;
use crate::suggest::llm::{parse, prompts, Completer};
use crate::suggest::{Category, Suggestion, SuggestionDetail, SuggestionSource};
use crate::util::byte_to_char;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, OnceLock};

fn word_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\p{L}[\p{L}']*\b").ok()).as_ref()
}

/// Carry the original word's capitalization onto a correction.
fn match_case(original: &str, correction: &str) -> String {
    let letters: Vec<char> = original.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        return correction.to_uppercase();
    }
    if letters.first().is_some_and(|c| c.is_uppercase()) {
        let mut chars = correction.chars();
        if let Some(first) = chars.next() {
            return first.to_uppercase().chain(chars).collect();
        }
    }
    correction.to_string()
}

pub struct SpellingAnalyzer {
    completer: Arc<dyn Completer>,
    allow_list: HashSet<String>,
    limit_suggestions: bool,
}

impl SpellingAnalyzer {
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self {
            completer,
            allow_list: HashSet::new(),
            limit_suggestions: false,
        }
    }

    pub fn from_config(completer: Arc<dyn Completer>, config: &EngineConfig) -> Self {
        Self::new(completer)
            .with_allow_list(config.spelling_allow_list.iter().cloned())
            .limit_suggestions(config.limit_spelling_suggestions)
    }

    pub fn with_allow_list<I: IntoIterator<Item = String>>(mut self, words: I) -> Self {
        self.allow_list
            .extend(words.into_iter().map(|w| w.trim().to_lowercase()));
        self
    }

    pub fn limit_suggestions(mut self, limit: bool) -> Self {
        self.limit_suggestions = limit;
        self
    }

    fn is_allowed(&self, word: &str) -> bool {
        self.allow_list.contains(&word.to_lowercase())
    }

    /// Unique candidate words, in first-seen order, minus allow-listed ones.
    pub fn candidate_words(&self, text: &str) -> Vec<String> {
        let Some(re) = word_regex() else {
            return Vec::new();
        };
        let mut seen = BTreeSet::new();
        re.find_iter(text)
            .map(|m| m.as_str().trim_matches('\''))
            .filter(|w| w.chars().count() > 1 && !self.is_allowed(w))
            .filter(|w| seen.insert(w.to_lowercase()))
            .map(str::to_string)
            .collect()
    }

    /// Anchor every whole-word occurrence of each reported word.
    pub fn locate(&self, text: &str, corrections: &[(String, Vec<String>)]) -> Vec<Suggestion> {
        let Some(re) = word_regex() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for m in re.find_iter(text) {
            let word = m.as_str().trim_matches('\'');
            if self.is_allowed(word) {
                continue;
            }
            let Some((_, options)) = corrections
                .iter()
                .find(|(reported, _)| reported.to_lowercase() == word.to_lowercase())
            else {
                continue;
            };
            let leading = m.as_str().len() - m.as_str().trim_start_matches('\'').len();
            let start = byte_to_char(text, m.start() + leading);
            let end = start + word.chars().count();
            let mut replacements: Vec<String> = options.iter().map(|o| match_case(word, o)).collect();
            if self.limit_suggestions {
                replacements.truncate(1);
            }
            let suggestion = Suggestion::anchored(
                text,
                start,
                end,
                SuggestionSource::Llm,
                SuggestionDetail::Spelling,
            )
            .map(|s| {
                s.with_replacements(replacements)
                    .with_explanation(format!("\u{201c}{}\u{201d} may be misspelled.", word))
            });
            out.extend(suggestion);
        }
        out
    }
}

impl Analyzer for SpellingAnalyzer {
    fn name(&self) -> &'static str {
        "spelling"
    }

    fn categories(&self) -> &'static [Category] {
        &[Category::Spelling]
    }

    fn source(&self) -> SuggestionSource {
        SuggestionSource::Llm
    }

    fn analyze<'a>(&'a self, text: &'a str) -> AnalyzeFuture<'a> {
        Box::pin(async move {
            let words = self.candidate_words(text);
            if words.is_empty() {
                return Ok(Vec::new());
            }
            let prompt = prompts::spelling(&words, self.limit_suggestions);
            let response = match self.completer.complete(&prompt).await {
                Ok(response) => response,
                Err(err) => return degrade(self.name(), err),
            };
            let map = match parse::parse_spelling_map(&response) {
                Ok(map) => map,
                Err(err) => return degrade(self.name(), err),
            };
            let corrections: Vec<(String, Vec<String>)> = map.into_iter().collect();
            let found = self.locate(text, &corrections);
            tracing::debug!(
                words = words.len(),
                reported = corrections.len(),
                anchored = found.len(),
                "spelling check complete"
            );
            Ok(found)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::llm::testing::ScriptedCompleter;
    use crate::suggest::llm::CompletionError;

    #[test]
    fn test_candidate_words_are_unique_and_filtered() {
        let analyzer = SpellingAnalyzer::new(ScriptedCompleter::reply("{}"))
            .with_allow_list(vec!["Wordwise".to_string()]);
        let words = analyzer.candidate_words("Teh teh Wordwise app is a 'gem' I think.");
        assert_eq!(words, vec!["Teh", "app", "is", "gem", "think"]);
    }

    #[tokio::test]
    async fn test_every_occurrence_is_anchored_with_case() {
        let completer = ScriptedCompleter::reply("```json\n{\"teh\": [\"the\"]}\n```");
        let analyzer = SpellingAnalyzer::new(completer.clone());
        let text = "Teh cat saw teh dog.";
        let found = analyzer.analyze(text).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!((found[0].start, found[0].end), (0, 3));
        assert_eq!(found[0].replacements, vec!["The".to_string()]);
        assert_eq!((found[1].start, found[1].end), (12, 15));
        assert_eq!(found[1].replacements, vec!["the".to_string()]);
        assert_eq!(completer.calls(), 1);
    }

    #[tokio::test]
    async fn test_allow_listed_word_is_never_flagged() {
        let completer = ScriptedCompleter::reply(r#"{"wordwise": ["wordsie"], "recieve": ["receive"]}"#);
        let analyzer = SpellingAnalyzer::new(completer).with_allow_list(vec!["WordWise".to_string()]);
        let found = analyzer.analyze("Wordwise will recieve it.").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].anchor_text, "recieve");
    }

    #[tokio::test]
    async fn test_malformed_and_failed_responses_degrade() {
        let garbage = SpellingAnalyzer::new(ScriptedCompleter::reply("no errors found!"));
        assert!(garbage.analyze("Teh cat.").await.unwrap().is_empty());

        let down = SpellingAnalyzer::new(ScriptedCompleter::failing(CompletionError::Server { status: 503 }));
        assert!(down.analyze("Teh cat.").await.unwrap().is_empty());

        let unauthorized = SpellingAnalyzer::new(ScriptedCompleter::failing(CompletionError::Auth));
        assert!(unauthorized.analyze("Teh cat.").await.is_err());
    }

    #[tokio::test]
    async fn test_limit_keeps_first_correction() {
        let completer = ScriptedCompleter::reply(r#"{"wierd": ["weird", "wired"]}"#);
        let analyzer = SpellingAnalyzer::new(completer).limit_suggestions(true);
        let found = analyzer.analyze("So wierd.").await.unwrap();
        assert_eq!(found[0].replacements, vec!["weird".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_text_skips_remote() {
        let completer = ScriptedCompleter::reply("{}");
        let analyzer = SpellingAnalyzer::new(completer.clone());
        assert!(analyzer.analyze("  42 ").await.unwrap().is_empty());
        assert_eq!(completer.calls(), 0);
    }
}
