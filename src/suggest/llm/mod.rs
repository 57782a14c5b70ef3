pub mod client;
pub mod models;
pub mod parse;
pub mod prompts;
pub mod rewrite;
#[cfg(test)]
pub(crate) mod testing;
pub mod tone;

pub use client::{Completer, CompletionError, HttpCompleter, Prompt};
pub use models::{Model, Usage};
pub use rewrite::rewrite_sentence;
pub use tone::{Tone, ToneAnalyzer, ToneReading};
