//! Remote advisory comments.

use super::{degrade, AnalyzeFuture, Analyzer};
use crate::config::EngineConfig;
use crate::suggest::advisory::{anchor_items, DEFAULT_MIN_ANCHOR_CHARS};
use crate::suggest::llm::{parse, prompts, Completer};
use crate::suggest::{Category, SuggestionSource};
use crate::util::char_len;
use std::sync::Arc;

/// Documents shorter than this (trimmed, in chars) are not sent.
pub const DEFAULT_MIN_CONTENT_CHARS: usize = 50;

pub struct AdvisoryAnalyzer {
    completer: Arc<dyn Completer>,
    min_content_chars: usize,
    min_anchor_chars: usize,
}

impl AdvisoryAnalyzer {
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self {
            completer,
            min_content_chars: DEFAULT_MIN_CONTENT_CHARS,
            min_anchor_chars: DEFAULT_MIN_ANCHOR_CHARS,
        }
    }

    pub fn from_config(completer: Arc<dyn Completer>, config: &EngineConfig) -> Self {
        Self {
            completer,
            min_content_chars: config.advisory_min_content_chars,
            min_anchor_chars: config.advisory_min_anchor_chars,
        }
    }

    /// Whether `text` has enough content to be worth a remote call.
    pub fn accepts(&self, text: &str) -> bool {
        char_len(text.trim()) >= self.min_content_chars
    }
}

impl Analyzer for AdvisoryAnalyzer {
    fn name(&self) -> &'static str {
        "advisory"
    }

    fn categories(&self) -> &'static [Category] {
        &[Category::Advisory]
    }

    fn source(&self) -> SuggestionSource {
        SuggestionSource::Llm
    }

    fn keeps_previous_on_empty(&self) -> bool {
        true
    }

    fn analyze<'a>(&'a self, text: &'a str) -> AnalyzeFuture<'a> {
        Box::pin(async move {
            if !self.accepts(text) {
                return Ok(Vec::new());
            }
            let prompt = prompts::advisory(text);
            let response = match self.completer.complete(&prompt).await {
                Ok(response) => response,
                Err(err) => return degrade(self.name(), err),
            };
            match parse::parse_advisory_items(&response) {
                Ok(items) => Ok(anchor_items(text, items, self.min_anchor_chars)),
                Err(err) => degrade(self.name(), err),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::advisory::AdvisoryReason;
    use crate::suggest::llm::testing::ScriptedCompleter;
    use crate::suggest::llm::CompletionError;
    use crate::suggest::SuggestionDetail;

    const DOC: &str = "Our product is the fastest on the market. Teams love it. \
                       We should plan the next release around customer feedback.";

    #[tokio::test]
    async fn test_anchors_verbatim_sentences_only() {
        let completer = ScriptedCompleter::reply(
            r#"[
                {"reason": "Strengthen a Claim", "originalText": "Our product is the fastest on the market.", "explanation": "Cite a benchmark."},
                {"reason": "Add a Clear Call to Action", "originalText": "This sentence is not in the document at all.", "explanation": "x"},
                {"reason": "Improve Structural Flow", "originalText": "Teams love it.", "explanation": "Too short to anchor."}
            ]"#,
        );
        let analyzer = AdvisoryAnalyzer::new(completer);
        let found = analyzer.analyze(DOC).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start, 0);
        assert_eq!(found[0].anchor_text, "Our product is the fastest on the market.");
        assert!(matches!(
            found[0].detail,
            SuggestionDetail::Advisory {
                reason: AdvisoryReason::StrengthenClaim,
                dismissed: false
            }
        ));
    }

    #[tokio::test]
    async fn test_short_document_skips_remote() {
        let completer = ScriptedCompleter::reply("[]");
        let analyzer = AdvisoryAnalyzer::new(completer.clone());
        assert!(analyzer.analyze("Too short.").await.unwrap().is_empty());
        assert_eq!(completer.calls(), 0);
    }

    #[tokio::test]
    async fn test_failures_degrade_unless_fatal() {
        let timeout = AdvisoryAnalyzer::new(ScriptedCompleter::failing(CompletionError::Timeout));
        assert!(timeout.analyze(DOC).await.unwrap().is_empty());

        let garbage = AdvisoryAnalyzer::new(ScriptedCompleter::reply("I have no comments."));
        assert!(garbage.analyze(DOC).await.unwrap().is_empty());

        let invalid = AdvisoryAnalyzer::new(ScriptedCompleter::failing(CompletionError::Validation(
            "bad model".into(),
        )));
        assert!(invalid.analyze(DOC).await.is_err());
    }
}
