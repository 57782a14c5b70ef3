//! Wordwise engine
//!
//! Suggestion aggregation and text-anchored annotation for a live writing
//! surface. Analyzers (local rules, a linter, a remote language model) run
//! over snapshots of the text; their findings are anchored to char ranges,
//! kept valid across edits, and painted back onto the surface as marks.

pub mod analyzers;
pub mod cache;
pub mod config;
pub mod dismissals;
pub mod engine;
pub mod render;
pub mod suggest;
pub mod surface;
pub mod util;

pub use config::EngineConfig;
pub use engine::{Engine, EngineEvent};
pub use suggest::store::SuggestionStore;
pub use suggest::{Category, Suggestion};
pub use surface::{LiveSurface, PlainTextSurface};
