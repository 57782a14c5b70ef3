//! Tone detection and rewrite.

use super::client::{Completer, CompletionError};
use super::{parse, prompts};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tone {
    Friendly,
    Professional,
    Humorous,
    Serious,
    Academic,
    Persuasive,
    Empathetic,
}

impl Tone {
    pub fn all() -> [Tone; 7] {
        [
            Tone::Friendly,
            Tone::Professional,
            Tone::Humorous,
            Tone::Serious,
            Tone::Academic,
            Tone::Persuasive,
            Tone::Empathetic,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tone::Friendly => "Friendly",
            Tone::Professional => "Professional",
            Tone::Humorous => "Humorous",
            Tone::Serious => "Serious",
            Tone::Academic => "Academic",
            Tone::Persuasive => "Persuasive",
            Tone::Empathetic => "Empathetic",
        }
    }

    pub fn from_label(label: &str) -> Option<Tone> {
        let label = label.trim();
        Self::all()
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(label))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneReading {
    pub tone: Option<Tone>,
    pub confidence: Option<f32>,
}

/// Remote tone detection that remembers the last result, so asking again for
/// unchanged text costs nothing.
pub struct ToneAnalyzer {
    completer: Arc<dyn Completer>,
    last: Mutex<Option<(String, ToneReading)>>,
}

impl ToneAnalyzer {
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self {
            completer,
            last: Mutex::new(None),
        }
    }

    pub async fn detect(&self, text: &str) -> Result<ToneReading, CompletionError> {
        if text.trim().is_empty() {
            return Ok(ToneReading {
                tone: None,
                confidence: None,
            });
        }
        if let Some(reading) = self.cached(text) {
            return Ok(reading);
        }

        let prompt = prompts::tone_detect(text);
        let response = self.completer.complete(&prompt).await?;
        let reading = parse::parse_tone(&response)?;
        if let Ok(mut last) = self.last.lock() {
            *last = Some((text.to_string(), reading));
        }
        Ok(reading)
    }

    pub async fn rewrite(&self, text: &str, tone: Tone) -> Result<String, CompletionError> {
        let prompt = prompts::tone_rewrite(text, tone);
        let response = self.completer.complete(&prompt).await?;
        parse::clean_rewrite(&response)
    }

    fn cached(&self, text: &str) -> Option<ToneReading> {
        let last = self.last.lock().ok()?;
        match last.as_ref() {
            Some((cached_text, reading)) if cached_text == text => Some(*reading),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::llm::testing::ScriptedCompleter;

    #[test]
    fn test_from_label_is_case_insensitive() {
        assert_eq!(Tone::from_label("friendly"), Some(Tone::Friendly));
        assert_eq!(Tone::from_label(" Academic "), Some(Tone::Academic));
        assert_eq!(Tone::from_label("Grumpy"), None);
    }

    #[tokio::test]
    async fn test_detect_caches_unchanged_text() {
        let completer = ScriptedCompleter::reply(r#"{"tone": "Serious", "confidence": 0.8}"#);
        let analyzer = ToneAnalyzer::new(completer.clone());

        let first = analyzer.detect("We must act now.").await.unwrap();
        let second = analyzer.detect("We must act now.").await.unwrap();
        assert_eq!(first.tone, Some(Tone::Serious));
        assert_eq!(first, second);
        assert_eq!(completer.calls(), 1);

        analyzer.detect("Something else entirely.").await.unwrap();
        assert_eq!(completer.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_text_skips_remote() {
        let completer = ScriptedCompleter::reply("{}");
        let analyzer = ToneAnalyzer::new(completer.clone());
        let reading = analyzer.detect("   ").await.unwrap();
        assert_eq!(reading.tone, None);
        assert_eq!(completer.calls(), 0);
    }

    #[tokio::test]
    async fn test_rewrite_cleans_output() {
        let completer = ScriptedCompleter::reply("\"Hey there, friend!\"");
        let analyzer = ToneAnalyzer::new(completer);
        let out = analyzer.rewrite("Greetings.", Tone::Friendly).await.unwrap();
        assert_eq!(out, "Hey there, friend!");
    }
}
