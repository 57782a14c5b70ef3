use super::scheduler::Ticket;
use crate::suggest::llm::CompletionError;
use crate::suggest::store::{BatchOutcome, ReconcileReport};
use crate::suggest::{Category, Suggestion};

/// Messages from background tasks to the engine
pub enum BackgroundMessage {
    /// An analyzer run finished against `ticket.snapshot`
    AnalysisReady {
        ticket: Ticket,
        result: anyhow::Result<Vec<Suggestion>>,
    },
    /// A lazily requested sentence rewrite came back
    RewriteReady {
        id: String,
        category: Category,
        result: Result<String, CompletionError>,
    },
    /// A background task panicked
    TaskFailed { task: &'static str, detail: String },
}

/// What processing one background message did, for the host to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    SuggestionsUpdated {
        analyzer: &'static str,
        outcome: BatchOutcome,
        /// Set when the run was computed against an older snapshot and
        /// remapped onto the current text.
        remapped: Option<ReconcileReport>,
    },
    /// The run no longer fits the current text, or a newer run already landed.
    StaleDiscarded { analyzer: &'static str },
    /// Authentication or validation failure; the store was left untouched.
    AnalyzerFailed { analyzer: &'static str, error: String },
    RewriteReady { id: String },
    RewriteFailed { id: String, error: String },
    TaskFailed { task: &'static str, detail: String },
}
