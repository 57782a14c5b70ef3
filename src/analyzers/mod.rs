//! Analyzer pipeline
//!
//! Every checker, local or remote, implements [`Analyzer`]: it receives an
//! immutable snapshot and returns suggestions anchored against exactly that
//! snapshot. Non-fatal failures degrade to an empty result inside the
//! analyzer; only authentication/validation failures come back as `Err`.

pub mod advisory;
pub mod clarity;
pub mod conciseness;
pub mod linter;
pub mod passive;
pub mod readability;
pub mod sentences;
pub mod spelling;

use crate::suggest::llm::CompletionError;
use crate::suggest::{Category, Suggestion, SuggestionSource};
use std::future::Future;
use std::pin::Pin;

pub use advisory::AdvisoryAnalyzer;
pub use clarity::ClarityAnalyzer;
pub use conciseness::ConcisenessAnalyzer;
pub use linter::{BasicLinter, Lint, Linter, LinterAnalyzer};
pub use passive::PassiveAnalyzer;
pub use readability::ReadabilityAnalyzer;
pub use spelling::SpellingAnalyzer;

pub type AnalyzeFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<Vec<Suggestion>>> + Send + 'a>>;

pub trait Analyzer: Send + Sync {
    /// Stable name, used for scheduling and logs.
    fn name(&self) -> &'static str;

    /// Categories this analyzer reports. Its results replace the previous
    /// batch for each of these categories from the same source.
    fn categories(&self) -> &'static [Category];

    fn source(&self) -> SuggestionSource;

    /// Remote analyzers get a bounded wait from the scheduler.
    fn is_remote(&self) -> bool {
        matches!(self.source(), SuggestionSource::Llm)
    }

    /// When true, an empty result leaves the previous batch in place, so a
    /// degraded remote run does not wipe what the user is looking at.
    fn keeps_previous_on_empty(&self) -> bool {
        false
    }

    fn analyze<'a>(&'a self, text: &'a str) -> AnalyzeFuture<'a>;
}

/// Decide what a remote failure means for a pipeline stage: fatal errors
/// propagate, anything else is logged once and becomes an empty result.
pub(crate) fn degrade(
    analyzer: &'static str,
    err: CompletionError,
) -> anyhow::Result<Vec<Suggestion>> {
    if err.is_fatal() {
        return Err(err.into());
    }
    tracing::warn!(analyzer, error = %err, "remote analysis failed; no suggestions this run");
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degrade_keeps_fatal_errors() {
        assert!(degrade("spelling", CompletionError::Auth).is_err());
        assert!(degrade("spelling", CompletionError::Timeout).unwrap().is_empty());
        assert!(degrade("spelling", CompletionError::Malformed("x".into()))
            .unwrap()
            .is_empty());
    }
}
