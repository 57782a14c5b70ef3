//! The annotation engine
//!
//! Owns the suggestion store and drives every analyzer over the live
//! surface. Text changes reconcile existing anchors immediately and debounce
//! a fresh run per analyzer; results come back as [`BackgroundMessage`]s and
//! are applied only when they still fit the current text.
//!
//! # Error Handling Patterns
//!
//! Channel sends from background tasks use `let _ =`. The receiver lives as
//! long as the engine, so a failed send means the engine was dropped and no
//! one is waiting for the result.
//!
//! Nothing here needs a lock: the engine is the single writer of the store,
//! and background tasks only ever talk to it through the channel. Scheduling
//! spawns tokio tasks, so drive the engine from inside a runtime.

mod messages;
mod scheduler;

pub use messages::{BackgroundMessage, EngineEvent};
pub use scheduler::Ticket;

use crate::analyzers::{
    AdvisoryAnalyzer, Analyzer, BasicLinter, ClarityAnalyzer, ConcisenessAnalyzer, LinterAnalyzer,
    PassiveAnalyzer, ReadabilityAnalyzer, SpellingAnalyzer,
};
use crate::cache::RewriteCache;
use crate::config::EngineConfig;
use crate::dismissals::{DismissalStore, MemoryDismissals};
use crate::render::{self, Annotation, DocumentMap, Mark, Panel};
use crate::suggest::llm::{rewrite_sentence, Completer, CompletionError, ToneAnalyzer};
use crate::suggest::reconcile::{remap_range, word_similarity, Remap, TextEdit};
use crate::suggest::store::{BatchOutcome, ReconcileReport, SuggestionStore, WritingMetrics};
use crate::suggest::{Category, RewriteState, Suggestion};
use crate::surface::LiveSurface;
use anyhow::Context;
use futures::FutureExt;
use scheduler::Scheduler;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub struct Engine<S: LiveSurface> {
    surface: S,
    config: EngineConfig,
    analyzers: Vec<Arc<dyn Analyzer>>,
    scheduler: Scheduler,
    store: SuggestionStore,
    completer: Arc<dyn Completer>,
    rewrite_cache: Arc<RewriteCache>,
    dismissals: Arc<dyn DismissalStore>,
    document_id: String,
    /// The text the store is currently consistent with.
    last_text: String,
    /// Snapshot the last applied advisory run was computed against.
    advisory_baseline: Option<String>,
    last_errors: HashMap<&'static str, String>,
    tx: UnboundedSender<BackgroundMessage>,
    rx: UnboundedReceiver<BackgroundMessage>,
}

impl<S: LiveSurface> Engine<S> {
    /// An engine with no analyzers registered.
    pub fn new(surface: S, config: EngineConfig, completer: Arc<dyn Completer>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let ttl = chrono::Duration::minutes(config.rewrite_cache_ttl_minutes);
        let last_text = surface.text();
        Self {
            surface,
            config,
            analyzers: Vec::new(),
            scheduler: Scheduler::default(),
            store: SuggestionStore::new(),
            completer,
            rewrite_cache: Arc::new(RewriteCache::in_memory().with_ttl(ttl)),
            dismissals: Arc::new(MemoryDismissals::new()),
            document_id: String::new(),
            last_text,
            advisory_baseline: None,
            last_errors: HashMap::new(),
            tx,
            rx,
        }
    }

    /// An engine running every built-in analyzer: remote spelling and
    /// advisory, the basic linter, and the local rule checks.
    pub fn with_default_analyzers(
        surface: S,
        config: EngineConfig,
        completer: Arc<dyn Completer>,
    ) -> Self {
        let spelling = SpellingAnalyzer::from_config(Arc::clone(&completer), &config);
        let advisory = AdvisoryAnalyzer::from_config(Arc::clone(&completer), &config);
        let mut engine = Self::new(surface, config, completer);
        engine.add_analyzer(Arc::new(spelling));
        engine.add_analyzer(Arc::new(LinterAnalyzer::new(BasicLinter)));
        engine.add_analyzer(Arc::new(ClarityAnalyzer::new()));
        engine.add_analyzer(Arc::new(ConcisenessAnalyzer::new()));
        engine.add_analyzer(Arc::new(ReadabilityAnalyzer::new()));
        engine.add_analyzer(Arc::new(PassiveAnalyzer::new()));
        engine.add_analyzer(Arc::new(advisory));
        engine
    }

    pub fn with_rewrite_cache(mut self, cache: RewriteCache) -> Self {
        self.rewrite_cache = Arc::new(cache);
        self
    }

    pub fn with_dismissals(mut self, dismissals: Arc<dyn DismissalStore>) -> Self {
        self.dismissals = dismissals;
        self
    }

    /// Register an analyzer. Its debounce window is the shortest window of
    /// the categories it reports.
    pub fn add_analyzer(&mut self, analyzer: Arc<dyn Analyzer>) -> usize {
        let window = analyzer
            .categories()
            .iter()
            .map(|c| self.config.debounce_ms.for_category(*c))
            .min()
            .unwrap_or_default();
        self.analyzers.push(analyzer);
        self.scheduler.register(window)
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    pub fn store(&self) -> &SuggestionStore {
        &self.store
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access for the host's own edits. Follow up with
    /// [`Engine::handle_change`] so anchors are reconciled.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn text(&self) -> &str {
        &self.last_text
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Last fatal error reported by `analyzer`, cleared by its next good run.
    pub fn last_error(&self, analyzer: &str) -> Option<&str> {
        self.last_errors.get(analyzer).map(String::as_str)
    }

    pub fn metrics(&self) -> WritingMetrics {
        self.store.metrics(&self.last_text)
    }

    pub fn tone_analyzer(&self) -> ToneAnalyzer {
        ToneAnalyzer::new(Arc::clone(&self.completer))
    }

    // ── Document lifecycle ─────────────────────────────────────────────────

    /// Start over on the surface's current document: drop all suggestions
    /// and session state, load permanent dismissals, schedule every analyzer.
    /// Returns how many permanent dismissals were loaded.
    pub fn load_document(&mut self, document_id: impl Into<String>) -> usize {
        self.scheduler.reset();
        self.document_id = document_id.into();
        self.store.clear();
        self.last_errors.clear();
        self.advisory_baseline = None;
        self.last_text = self.surface.text();

        let loaded = match self.dismissals.load(&self.document_id) {
            Ok(hashes) => {
                let count = hashes.len();
                self.store.load_permanent_dismissals(hashes);
                count
            }
            Err(err) => {
                tracing::warn!(
                    document = %self.document_id,
                    error = %err,
                    "could not load permanent dismissals"
                );
                0
            }
        };
        self.schedule_all();
        loaded
    }

    /// The surface text changed. Derive the edit from the previous text,
    /// reconcile every anchor, then debounce a fresh run of each analyzer.
    pub fn handle_change(&mut self) -> ReconcileReport {
        let text = self.surface.text();
        let edit = TextEdit::between(&self.last_text, &text);
        self.reconcile(edit, text)
    }

    /// Like [`Engine::handle_change`], with the edit as the host reported
    /// it. Survivors are still re-verified against the text.
    pub fn handle_edit(&mut self, edit: TextEdit) -> ReconcileReport {
        let text = self.surface.text();
        self.reconcile(Some(edit), text)
    }

    fn reconcile(&mut self, edit: Option<TextEdit>, text: String) -> ReconcileReport {
        if text == self.last_text {
            return ReconcileReport::default();
        }
        let report = match edit {
            Some(edit) => self.store.apply_edit(&edit, &text),
            None => ReconcileReport {
                dropped_drift: self.store.revalidate(&text),
                ..ReconcileReport::default()
            },
        };
        if report.dropped() > 0 {
            tracing::debug!(
                overlap = report.dropped_overlap,
                drift = report.dropped_drift,
                shifted = report.shifted,
                "suggestions invalidated by edit"
            );
        }
        self.last_text = text;
        self.schedule_all();
        report
    }

    // ── Scheduling ─────────────────────────────────────────────────────────

    fn schedule_all(&mut self) {
        for idx in 0..self.analyzers.len() {
            if self.wants_run(idx) {
                let window = self.scheduler.window(idx);
                self.schedule(idx, window);
            }
        }
    }

    /// Advisory runs are expensive: after the first one, only re-run when
    /// the text has moved far enough from what was last analyzed.
    fn wants_run(&self, idx: usize) -> bool {
        let Some(analyzer) = self.analyzers.get(idx) else {
            return false;
        };
        if !analyzer.categories().contains(&Category::Advisory) {
            return true;
        }
        match &self.advisory_baseline {
            None => true,
            Some(baseline) => {
                word_similarity(baseline, &self.last_text) < self.config.advisory_refresh_similarity
            }
        }
    }

    fn schedule(&mut self, idx: usize, delay: Duration) {
        let Some(analyzer) = self.analyzers.get(idx).cloned() else {
            return;
        };
        let snapshot: Arc<str> = Arc::from(self.last_text.as_str());
        let Some(ticket) = self.scheduler.issue(idx, snapshot) else {
            return;
        };
        let tx = self.tx.clone();
        let timeout = self.config.remote_timeout();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let name = analyzer.name();
            spawn_background(tx.clone(), name, run_analyzer(analyzer, ticket, timeout, tx));
        });
        self.scheduler.arm(idx, timer);
    }

    /// Run every analyzer reporting `category` now, skipping the debounce
    /// and the advisory similarity gate. Returns how many were dispatched.
    pub fn refresh(&mut self, category: Category) -> usize {
        let targets: Vec<usize> = self
            .analyzers
            .iter()
            .enumerate()
            .filter(|(_, a)| a.categories().contains(&category))
            .map(|(idx, _)| idx)
            .collect();
        for &idx in &targets {
            self.schedule(idx, Duration::ZERO);
        }
        targets.len()
    }

    // ── Background results ─────────────────────────────────────────────────

    /// Apply every message that has already arrived. Never waits.
    pub fn drain(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            events.push(self.handle_message(msg));
        }
        events
    }

    /// Wait for the next background message and apply it.
    pub async fn process_next(&mut self) -> Option<EngineEvent> {
        let msg = self.rx.recv().await?;
        Some(self.handle_message(msg))
    }

    fn handle_message(&mut self, msg: BackgroundMessage) -> EngineEvent {
        match msg {
            BackgroundMessage::AnalysisReady { ticket, result } => self.apply_analysis(ticket, result),
            BackgroundMessage::RewriteReady {
                id,
                category,
                result,
            } => self.apply_rewrite(id, category, result),
            BackgroundMessage::TaskFailed { task, detail } => {
                tracing::warn!(task, detail = %detail, "background task crashed");
                EngineEvent::TaskFailed { task, detail }
            }
        }
    }

    fn apply_analysis(
        &mut self,
        ticket: Ticket,
        result: anyhow::Result<Vec<Suggestion>>,
    ) -> EngineEvent {
        let Some(analyzer) = self.analyzers.get(ticket.analyzer).cloned() else {
            return EngineEvent::StaleDiscarded { analyzer: "unknown" };
        };
        let name = analyzer.name();
        if self.scheduler.is_superseded(&ticket) {
            tracing::debug!(
                analyzer = name,
                generation = ticket.generation,
                "newer run already applied; result dropped"
            );
            return EngineEvent::StaleDiscarded { analyzer: name };
        }

        let suggestions = match result {
            Ok(suggestions) => suggestions,
            Err(err) => {
                let error = format!("{:#}", err);
                tracing::warn!(analyzer = name, error = %error, "analyzer failed; store left as is");
                self.last_errors.insert(name, error.clone());
                return EngineEvent::AnalyzerFailed {
                    analyzer: name,
                    error,
                };
            }
        };

        let (suggestions, remapped) = if *ticket.snapshot == *self.last_text {
            (suggestions, None)
        } else if analyzer.categories().iter().all(Category::tolerates_remap) {
            let (moved, report) = remap_onto(suggestions, &ticket.snapshot, &self.last_text);
            (moved, Some(report))
        } else {
            tracing::debug!(
                analyzer = name,
                generation = ticket.generation,
                "text changed since dispatch; result dropped"
            );
            return EngineEvent::StaleDiscarded { analyzer: name };
        };

        self.scheduler.mark_applied(&ticket);
        self.last_errors.remove(name);
        if analyzer.categories().contains(&Category::Advisory) {
            self.advisory_baseline = Some(ticket.snapshot.to_string());
        }

        let mut outcome = BatchOutcome::default();
        if suggestions.is_empty() && analyzer.keeps_previous_on_empty() {
            tracing::debug!(analyzer = name, "empty result; keeping previous suggestions");
            return EngineEvent::SuggestionsUpdated {
                analyzer: name,
                outcome,
                remapped,
            };
        }

        let mut by_category: BTreeMap<Category, Vec<Suggestion>> = BTreeMap::new();
        for s in suggestions {
            by_category.entry(s.category()).or_default().push(s);
        }
        for &category in analyzer.categories() {
            let batch = by_category.remove(&category).unwrap_or_default();
            outcome += self
                .store
                .replace_batch(category, analyzer.source(), batch, &self.last_text);
        }
        for (category, stray) in by_category {
            tracing::debug!(analyzer = name, category = %category, count = stray.len(), "undeclared category ignored");
            outcome.invalid += stray.len();
        }

        tracing::debug!(
            analyzer = name,
            inserted = outcome.inserted,
            deduplicated = outcome.deduplicated,
            suppressed = outcome.suppressed,
            "analysis applied"
        );
        EngineEvent::SuggestionsUpdated {
            analyzer: name,
            outcome,
            remapped,
        }
    }

    fn apply_rewrite(
        &mut self,
        id: String,
        category: Category,
        result: Result<String, CompletionError>,
    ) -> EngineEvent {
        match result {
            Ok(rewrite) => {
                if !self.store.complete_rewrite(&id, Ok(rewrite)) {
                    tracing::debug!(id = %id, "rewrite arrived after its suggestion was removed");
                }
                EngineEvent::RewriteReady { id }
            }
            Err(err) => {
                let error = err.to_string();
                tracing::warn!(id = %id, category = %category, error = %error, "rewrite failed");
                self.store.complete_rewrite(&id, Err(error.clone()));
                EngineEvent::RewriteFailed { id, error }
            }
        }
    }

    // ── Rendering ──────────────────────────────────────────────────────────

    /// Visible suggestions as plain-offset decorations.
    pub fn annotations(&self) -> Vec<Annotation> {
        self.store.visible().into_iter().map(Annotation::from).collect()
    }

    /// Visible suggestions painted onto the surface's positions.
    pub fn marks(&self, map: &DocumentMap) -> Vec<Mark> {
        render::paint(map, &self.store.visible())
    }

    /// Resolve a click at surface position `pos` and open its panel.
    pub fn click(&mut self, marks: &[Mark], pos: usize) -> Option<Panel> {
        let id = render::resolve_click(marks, pos)?.to_string();
        self.open_panel(&id)
    }

    /// Open the panel for suggestion `id`.
    ///
    /// For passive and readability suggestions this is what requests the
    /// rewrite: served from the cache when possible, otherwise fetched in the
    /// background while the panel shows a pending state. A failed rewrite, or
    /// one pending longer than the rewrite timeout, is requested again.
    pub fn open_panel(&mut self, id: &str) -> Option<Panel> {
        let suggestion = self.store.get(id)?.clone();
        if suggestion.category().is_rewrite_backed()
            && suggestion.replacements.is_empty()
            && self.needs_rewrite(&suggestion)
        {
            self.request_rewrite(&suggestion);
        }
        self.store.get(id).map(Panel::for_suggestion)
    }

    fn needs_rewrite(&self, suggestion: &Suggestion) -> bool {
        match suggestion.rewrite_state() {
            Some(RewriteState::Pending { requested_at }) => {
                now().saturating_duration_since(*requested_at) >= self.config.rewrite_timeout()
            }
            Some(_) => true,
            None => false,
        }
    }

    fn request_rewrite(&mut self, suggestion: &Suggestion) {
        let category = suggestion.category();
        if let Some(hit) = self.rewrite_cache.get(category, &suggestion.anchor_text) {
            tracing::debug!(id = %suggestion.id, "rewrite served from cache");
            self.store.complete_rewrite(&suggestion.id, Ok(hit));
            return;
        }

        self.store.mark_rewrite_pending(&suggestion.id, now());
        let completer = Arc::clone(&self.completer);
        let cache = Arc::clone(&self.rewrite_cache);
        let tx = self.tx.clone();
        let id = suggestion.id.clone();
        let source = suggestion.anchor_text.clone();
        let timeout = self.config.rewrite_timeout();
        spawn_background(self.tx.clone(), "rewrite", async move {
            let result = match tokio::time::timeout(
                timeout,
                rewrite_sentence(completer.as_ref(), category, &source),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(CompletionError::Timeout),
            };
            if let Ok(rewrite) = &result {
                cache.set(category, &source, rewrite);
            }
            let _ = tx.send(BackgroundMessage::RewriteReady {
                id,
                category,
                result,
            });
        });
    }

    // ── User actions ───────────────────────────────────────────────────────

    /// Apply replacement `option` of suggestion `id` to the surface.
    ///
    /// Returns `Ok(false)` when the anchor no longer matches the surface: the
    /// suggestion is dropped rather than applied in the wrong place.
    pub fn apply(&mut self, id: &str, option: usize) -> anyhow::Result<bool> {
        let replacement = self
            .store
            .get(id)
            .with_context(|| format!("no suggestion with id {}", id))?
            .replacements
            .get(option)
            .cloned()
            .with_context(|| format!("suggestion {} has no option {}", id, option))?;

        // Catch up with edits the host has not reported yet.
        if self.surface.text() != self.last_text {
            self.handle_change();
        }
        let suggestion = match self.store.get(id) {
            Some(s) if s.is_valid_in(&self.last_text) => s.clone(),
            _ => {
                tracing::debug!(id, "anchor drifted before apply; suggestion dropped");
                self.store.remove(id);
                return Ok(false);
            }
        };

        self.surface
            .replace_range(suggestion.start, suggestion.end, &replacement)
            .with_context(|| format!("failed to apply suggestion {}", id))?;
        let text = self.surface.text();
        self.store.accept(id, &replacement, Some(&text));
        self.last_text = text;
        self.schedule_all();
        Ok(true)
    }

    /// Ignore a suggestion: removed, and not shown again this session.
    pub fn ignore(&mut self, id: &str) -> bool {
        self.store.ignore(id).is_some()
    }

    /// Session-tier dismissal; advisory comments stay in the store hidden.
    pub fn dismiss(&mut self, id: &str) -> bool {
        self.store.dismiss(id)
    }

    /// Permanently dismiss an advisory comment for this document. The
    /// content hash is recorded in the dismissal store; a failed write still
    /// suppresses the comment for the rest of the session.
    pub fn dismiss_permanently(&mut self, id: &str) -> Option<String> {
        let hash = self.store.dismiss_permanently(id)?;
        if let Err(err) = self.dismissals.record(&self.document_id, &hash) {
            tracing::warn!(
                document = %self.document_id,
                error = %err,
                "could not persist permanent dismissal"
            );
        }
        Some(hash)
    }

    /// Flip a category's visibility; returns the new state. Analyzers keep
    /// running for hidden categories.
    pub fn toggle_visibility(&mut self, category: Category) -> bool {
        self.store.toggle_visibility(category)
    }
}

fn now() -> Instant {
    // tokio's clock, so paused-time tests see pending rewrites age.
    tokio::time::Instant::now().into_std()
}

async fn run_analyzer(
    analyzer: Arc<dyn Analyzer>,
    ticket: Ticket,
    timeout: Duration,
    tx: UnboundedSender<BackgroundMessage>,
) {
    let run = analyzer.analyze(&ticket.snapshot);
    let result = if analyzer.is_remote() {
        match tokio::time::timeout(timeout, run).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    analyzer = analyzer.name(),
                    timeout_ms = timeout.as_millis() as u64,
                    "analyzer timed out; no suggestions this run"
                );
                Ok(Vec::new())
            }
        }
    } else {
        run.await
    };
    let _ = tx.send(BackgroundMessage::AnalysisReady { ticket, result });
}

/// Move suggestions computed against `snapshot` onto `current`: shift across
/// the single edit between them, drop anything the edit touched, and verify
/// the rest against the current text.
fn remap_onto(
    suggestions: Vec<Suggestion>,
    snapshot: &str,
    current: &str,
) -> (Vec<Suggestion>, ReconcileReport) {
    let mut report = ReconcileReport::default();
    let Some(edit) = TextEdit::between(snapshot, current) else {
        report.unchanged = suggestions.len();
        return (suggestions, report);
    };
    let kept = suggestions
        .into_iter()
        .filter_map(|mut s| {
            let moved = match remap_range(s.start, s.end, &edit) {
                Remap::Unchanged => false,
                Remap::Shifted { .. } => {
                    s.shift(edit.delta());
                    true
                }
                Remap::Overlapped => {
                    report.dropped_overlap += 1;
                    return None;
                }
            };
            if !s.is_valid_in(current) {
                report.dropped_drift += 1;
                return None;
            }
            if moved {
                report.shifted += 1;
            } else {
                report.unchanged += 1;
            }
            Some(s)
        })
        .collect();
    (kept, report)
}

/// Spawn a background task, reporting a panic as a message instead of
/// losing it.
pub(crate) fn spawn_background<F>(tx: UnboundedSender<BackgroundMessage>, task: &'static str, fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
            let detail = if let Some(s) = panic.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_string()
            };
            let _ = tx.send(BackgroundMessage::TaskFailed { task, detail });
        }
    });
}
