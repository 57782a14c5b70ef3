//! Readability: sentences whose Flesch-Kincaid grade is above the target.

use super::sentences::split_sentences;
use super::{AnalyzeFuture, Analyzer};
use crate::suggest::{Category, RewriteState, Suggestion, SuggestionDetail, SuggestionSource};
use crate::util::slice_chars;

/// Sentences shorter than this are never flagged.
pub const MIN_WORDS: usize = 10;
/// Roughly what a 14-year-old reads comfortably.
pub const DEFAULT_MAX_GRADE: f32 = 10.0;

/// Heuristic English syllable count: vowel groups, minus a silent final "e".
pub fn syllables(word: &str) -> usize {
    let word: Vec<char> = word
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect();
    if word.is_empty() {
        return 0;
    }
    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
    let mut count = 0;
    let mut prev_vowel = false;
    for &c in &word {
        let vowel = is_vowel(c);
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }
    let n = word.len();
    if n > 2 && word[n - 1] == 'e' && word[n - 2] != 'l' && !is_vowel(word[n - 2]) && count > 1 {
        count -= 1;
    }
    count.max(1)
}

/// Flesch-Kincaid grade level of a single sentence.
pub fn grade_level(sentence: &str) -> Option<f32> {
    let words: Vec<&str> = sentence
        .split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .collect();
    if words.is_empty() {
        return None;
    }
    let syllable_total: usize = words.iter().map(|w| syllables(w)).sum();
    let word_count = words.len() as f32;
    Some(0.39 * word_count + 11.8 * (syllable_total as f32 / word_count) - 15.59)
}

#[derive(Debug, Clone)]
pub struct ReadabilityAnalyzer {
    max_grade: f32,
}

impl Default for ReadabilityAnalyzer {
    fn default() -> Self {
        Self {
            max_grade: DEFAULT_MAX_GRADE,
        }
    }
}

impl ReadabilityAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_grade(max_grade: f32) -> Self {
        Self { max_grade }
    }

    pub fn check(&self, text: &str) -> Vec<Suggestion> {
        split_sentences(text)
            .into_iter()
            .filter_map(|(start, end)| {
                let sentence = slice_chars(text, start, end)?;
                if sentence.split_whitespace().count() < MIN_WORDS {
                    return None;
                }
                let grade = grade_level(sentence)?;
                if grade <= self.max_grade {
                    return None;
                }
                Suggestion::anchored(
                    text,
                    start,
                    end,
                    SuggestionSource::Rules,
                    SuggestionDetail::Readability {
                        grade,
                        rewrite: RewriteState::NotRequested,
                    },
                )
                .map(|s| {
                    s.with_explanation(format!(
                        "This sentence reads at about grade {:.0}. Shorter sentences and simpler words make it easier to follow.",
                        grade
                    ))
                })
            })
            .collect()
    }
}

impl Analyzer for ReadabilityAnalyzer {
    fn name(&self) -> &'static str {
        "readability"
    }

    fn categories(&self) -> &'static [Category] {
        &[Category::Readability]
    }

    fn source(&self) -> SuggestionSource {
        SuggestionSource::Rules
    }

    fn analyze<'a>(&'a self, text: &'a str) -> AnalyzeFuture<'a> {
        Box::pin(async move { Ok(self.check(text)) })
    }
}
