//! Suggestion store
//!
//! Holds the validated, deduplicated suggestions per category together with
//! visibility and dismissal state. All mutation goes through the operations
//! here (replace batch, shift across an edit, accept, remove by id); callers
//! never touch the lists directly.

use super::reconcile::{accept_delta, anchor_matches, remap_range, Remap, TextEdit};
use super::{advisory, Category, RewriteState, Suggestion, SuggestionDetail, SuggestionSource};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;

/// What happened to an incoming analyzer batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub inserted: usize,
    /// Same `(start, end, anchor_text)` as a suggestion already stored.
    pub deduplicated: usize,
    /// Ignored anchor or permanently dismissed content.
    pub suppressed: usize,
    /// Did not match the text it claimed to be computed against.
    pub invalid: usize,
}

impl std::ops::AddAssign for BatchOutcome {
    fn add_assign(&mut self, other: Self) {
        self.inserted += other.inserted;
        self.deduplicated += other.deduplicated;
        self.suppressed += other.suppressed;
        self.invalid += other.invalid;
    }
}

/// Result of reconciling the store against an edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub unchanged: usize,
    pub shifted: usize,
    pub dropped_overlap: usize,
    pub dropped_drift: usize,
}

impl ReconcileReport {
    pub fn dropped(&self) -> usize {
        self.dropped_overlap + self.dropped_drift
    }
}

/// The accepted suggestion and the length delta applied to later anchors.
#[derive(Debug, Clone)]
pub struct Accepted {
    pub suggestion: Suggestion,
    pub replacement: String,
    pub delta: isize,
}

/// Basic document statistics shown alongside the suggestion counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WritingMetrics {
    pub word_count: usize,
    pub character_count: usize,
    pub spelling_errors: usize,
}

/// A range the user ignored this session. It moves with edits like a live
/// suggestion, so a re-report of the same text is suppressed while a new
/// finding at its old offset is not.
#[derive(Debug, Clone, PartialEq, Eq)]
struct IgnoredAnchor {
    category: Category,
    start: usize,
    end: usize,
    anchor_text: String,
}

impl IgnoredAnchor {
    fn of(suggestion: &Suggestion) -> Self {
        Self {
            category: suggestion.category(),
            start: suggestion.start,
            end: suggestion.end,
            anchor_text: suggestion.anchor_text.clone(),
        }
    }

    fn covers(&self, suggestion: &Suggestion) -> bool {
        self.category == suggestion.category()
            && (self.start, self.end, self.anchor_text.as_str()) == suggestion.anchor_key()
    }

    fn is_valid_in(&self, text: &str) -> bool {
        anchor_matches(
            text,
            self.start,
            self.end,
            &self.anchor_text,
            self.category.case_insensitive_anchor(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct SuggestionStore {
    lists: BTreeMap<Category, Vec<Suggestion>>,
    visibility: HashMap<Category, bool>,
    ignored: Vec<IgnoredAnchor>,
    /// Permanent advisory dismissals, keyed by content hash.
    dismissed_hashes: HashSet<String>,
}

impl Default for SuggestionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SuggestionStore {
    pub fn new() -> Self {
        Self {
            lists: Category::all().into_iter().map(|c| (c, Vec::new())).collect(),
            visibility: Category::all().into_iter().map(|c| (c, true)).collect(),
            ignored: Vec::new(),
            dismissed_hashes: HashSet::new(),
        }
    }

    // ── Queries ────────────────────────────────────────────────────────────

    pub fn get(&self, id: &str) -> Option<&Suggestion> {
        self.lists.values().flatten().find(|s| s.id == id)
    }

    pub fn category(&self, category: Category) -> &[Suggestion] {
        self.lists.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Suggestion> {
        self.lists.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.lists.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Suggestions in visible categories, minus session-dismissed advisories,
    /// ordered by position.
    pub fn visible(&self) -> Vec<&Suggestion> {
        let mut out: Vec<&Suggestion> = self
            .iter()
            .filter(|s| self.is_visible(s.category()) && !s.is_session_dismissed())
            .collect();
        out.sort_by_key(|s| (s.start, s.end, s.category()));
        out
    }

    /// Whether the user ignored this exact anchor earlier in the session.
    pub fn is_ignored(&self, suggestion: &Suggestion) -> bool {
        self.ignored.iter().any(|a| a.covers(suggestion))
    }

    pub fn is_permanently_dismissed(&self, suggestion: &Suggestion) -> bool {
        match suggestion.detail {
            SuggestionDetail::Advisory { reason, .. } => self
                .dismissed_hashes
                .contains(&advisory::dismissal_hash(reason, &suggestion.anchor_text)),
            _ => false,
        }
    }

    pub fn metrics(&self, text: &str) -> WritingMetrics {
        WritingMetrics {
            word_count: text.split_whitespace().count(),
            character_count: text.chars().count(),
            spelling_errors: self.category(Category::Spelling).len(),
        }
    }

    // ── Visibility ─────────────────────────────────────────────────────────

    /// Visibility is a rendering filter only; analyzers keep running.
    pub fn is_visible(&self, category: Category) -> bool {
        self.visibility.get(&category).copied().unwrap_or(true)
    }

    pub fn set_visibility(&mut self, category: Category, visible: bool) {
        self.visibility.insert(category, visible);
    }

    pub fn toggle_visibility(&mut self, category: Category) -> bool {
        let next = !self.is_visible(category);
        self.visibility.insert(category, next);
        next
    }

    // ── Batch insert ───────────────────────────────────────────────────────

    /// Replace everything `source` previously reported for `category` with
    /// `incoming`, validated against `text`.
    ///
    /// A suggestion matching a previous one's anchor keeps the previous id
    /// and UI state, so an open panel survives re-analysis. Those claim their
    /// ids before fresh findings do.
    pub fn replace_batch(
        &mut self,
        category: Category,
        source: SuggestionSource,
        incoming: Vec<Suggestion>,
        text: &str,
    ) -> BatchOutcome {
        let list = self.lists.entry(category).or_default();
        let (previous, kept): (Vec<Suggestion>, Vec<Suggestion>) = std::mem::take(list)
            .into_iter()
            .partition(|s| s.source == source);
        *list = kept;

        let mut outcome = BatchOutcome::default();
        let mut carried = Vec::new();
        let mut fresh = Vec::new();
        for mut suggestion in incoming {
            if suggestion.category() != category || !suggestion.is_valid_in(text) {
                outcome.invalid += 1;
                continue;
            }
            match previous
                .iter()
                .find(|p| p.anchor_key() == suggestion.anchor_key())
            {
                Some(prev) => {
                    carry_over_state(prev, &mut suggestion);
                    carried.push(suggestion);
                }
                None => fresh.push(suggestion),
            }
        }
        for suggestion in carried.into_iter().chain(fresh) {
            match self.admit(suggestion) {
                Admit::Inserted => outcome.inserted += 1,
                Admit::Duplicate => outcome.deduplicated += 1,
                Admit::Suppressed => outcome.suppressed += 1,
            }
        }

        if outcome.invalid > 0 {
            tracing::debug!(
                category = %category,
                invalid = outcome.invalid,
                "dropped suggestions that did not match their snapshot"
            );
        }
        outcome
    }

    /// Insert one suggestion after validating it against `text`.
    pub fn insert(&mut self, suggestion: Suggestion, text: &str) -> bool {
        if !suggestion.is_valid_in(text) {
            return false;
        }
        matches!(self.admit(suggestion), Admit::Inserted)
    }

    fn admit(&mut self, mut suggestion: Suggestion) -> Admit {
        if self.is_ignored(&suggestion) || self.is_permanently_dismissed(&suggestion) {
            return Admit::Suppressed;
        }
        if self
            .category(suggestion.category())
            .iter()
            .any(|s| s.anchor_key() == suggestion.anchor_key())
        {
            return Admit::Duplicate;
        }
        if self.get(&suggestion.id).is_some() {
            let renamed = self.unused_id(&suggestion.id);
            tracing::debug!(id = %suggestion.id, renamed = %renamed, "id taken by a moved suggestion");
            suggestion.id = renamed;
        }
        let list = self.lists.entry(suggestion.category()).or_default();
        list.push(suggestion);
        list.sort_by_key(|s| (s.start, s.end));
        Admit::Inserted
    }

    /// First `{base}-{n}` not held by a stored suggestion.
    fn unused_id(&self, base: &str) -> String {
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if self.get(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }

    // ── Removal and dismissal ──────────────────────────────────────────────

    pub fn remove(&mut self, id: &str) -> Option<Suggestion> {
        for list in self.lists.values_mut() {
            if let Some(pos) = list.iter().position(|s| s.id == id) {
                return Some(list.remove(pos));
            }
        }
        None
    }

    /// Remove and remember the anchor so the same finding is not
    /// re-inserted while that text stays in place.
    pub fn ignore(&mut self, id: &str) -> Option<Suggestion> {
        let removed = self.remove(id)?;
        self.ignored.push(IgnoredAnchor::of(&removed));
        Some(removed)
    }

    /// Advisory comments are hidden for the session; every other category is
    /// removed like [`SuggestionStore::ignore`].
    pub fn dismiss(&mut self, id: &str) -> bool {
        let is_advisory = self.get(id).map(|s| s.category().is_advisory());
        match is_advisory {
            Some(true) => {
                if let Some(SuggestionDetail::Advisory { dismissed, .. }) =
                    self.get_mut(id).map(|s| &mut s.detail)
                {
                    *dismissed = true;
                }
                true
            }
            Some(false) => self.ignore(id).is_some(),
            None => false,
        }
    }

    /// Permanently dismiss an advisory comment. Returns the content hash the
    /// caller must persist; `None` if `id` is not an advisory comment.
    pub fn dismiss_permanently(&mut self, id: &str) -> Option<String> {
        let hash = match self.get(id)?.detail {
            SuggestionDetail::Advisory { reason, .. } => {
                advisory::dismissal_hash(reason, &self.get(id)?.anchor_text)
            }
            _ => return None,
        };
        self.remove(id);
        self.dismissed_hashes.insert(hash.clone());
        Some(hash)
    }

    /// Install persisted permanent dismissals and drop matching comments.
    pub fn load_permanent_dismissals<I>(&mut self, hashes: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        self.dismissed_hashes.extend(hashes);
        let hashes = &self.dismissed_hashes;
        let list = self.lists.entry(Category::Advisory).or_default();
        let before = list.len();
        list.retain(|s| match s.detail {
            SuggestionDetail::Advisory { reason, .. } => {
                !hashes.contains(&advisory::dismissal_hash(reason, &s.anchor_text))
            }
            _ => true,
        });
        before - list.len()
    }

    /// Forget all suggestions and session dismissals (new document load).
    /// Permanent dismissals are reloaded by the caller.
    pub fn clear(&mut self) {
        for list in self.lists.values_mut() {
            list.clear();
        }
        self.ignored.clear();
        self.dismissed_hashes.clear();
    }

    // ── Reconciliation ─────────────────────────────────────────────────────

    /// Shift or drop every suggestion across `edit`, then verify each
    /// survivor against `new_text`.
    pub fn apply_edit(&mut self, edit: &TextEdit, new_text: &str) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for list in self.lists.values_mut() {
            list.retain_mut(|s| {
                let moved = match remap_range(s.start, s.end, edit) {
                    Remap::Unchanged => false,
                    Remap::Shifted { .. } => {
                        s.shift(edit.delta());
                        true
                    }
                    Remap::Overlapped => {
                        report.dropped_overlap += 1;
                        return false;
                    }
                };
                if !s.is_valid_in(new_text) {
                    report.dropped_drift += 1;
                    return false;
                }
                if moved {
                    report.shifted += 1;
                } else {
                    report.unchanged += 1;
                }
                true
            });
        }
        self.ignored.retain_mut(|a| {
            match remap_range(a.start, a.end, edit) {
                Remap::Unchanged => {}
                Remap::Shifted { start, end } => {
                    a.start = start;
                    a.end = end;
                }
                Remap::Overlapped => return false,
            }
            a.is_valid_in(new_text)
        });
        report
    }

    /// Drop anything that no longer matches `text` at its offsets.
    pub fn revalidate(&mut self, text: &str) -> usize {
        let mut dropped = 0;
        for list in self.lists.values_mut() {
            let before = list.len();
            list.retain(|s| s.is_valid_in(text));
            dropped += before - list.len();
        }
        self.ignored.retain(|a| a.is_valid_in(text));
        dropped
    }

    /// Accept `replacement` for suggestion `id`.
    ///
    /// Removes it and shifts every suggestion whose start is strictly greater
    /// than the accepted start by `len(replacement) - len(anchor_text)`. When
    /// `new_text` is given, survivors are re-verified against it.
    pub fn accept(&mut self, id: &str, replacement: &str, new_text: Option<&str>) -> Option<Accepted> {
        let accepted = self.remove(id)?;
        let delta = accept_delta(&accepted.anchor_text, replacement);
        for list in self.lists.values_mut() {
            for s in list.iter_mut().filter(|s| s.start > accepted.start) {
                s.shift(delta);
            }
            if let Some(text) = new_text {
                list.retain(|s| s.is_valid_in(text));
            }
        }
        for a in self.ignored.iter_mut().filter(|a| a.start > accepted.start) {
            a.start = a.start.saturating_add_signed(delta);
            a.end = a.end.saturating_add_signed(delta);
        }
        if let Some(text) = new_text {
            self.ignored.retain(|a| a.is_valid_in(text));
        }
        Some(Accepted {
            suggestion: accepted,
            replacement: replacement.to_string(),
            delta,
        })
    }

    // ── Rewrites ───────────────────────────────────────────────────────────

    pub fn mark_rewrite_pending(&mut self, id: &str, now: Instant) -> bool {
        match self.get_mut(id).and_then(Suggestion::rewrite_state_mut) {
            Some(state) => {
                *state = RewriteState::Pending { requested_at: now };
                true
            }
            None => false,
        }
    }

    /// Record a finished rewrite. A successful rewrite becomes the single
    /// replacement option. Returns `false` if the suggestion is gone.
    pub fn complete_rewrite(&mut self, id: &str, result: Result<String, String>) -> bool {
        let Some(suggestion) = self.get_mut(id) else {
            return false;
        };
        let Some(state) = suggestion.rewrite_state_mut() else {
            return false;
        };
        match result {
            Ok(rewrite) => {
                *state = RewriteState::Ready;
                suggestion.replacements = vec![rewrite];
            }
            Err(message) => {
                *state = RewriteState::Failed(message);
            }
        }
        true
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Suggestion> {
        self.lists.values_mut().flatten().find(|s| s.id == id)
    }
}

enum Admit {
    Inserted,
    Duplicate,
    Suppressed,
}

fn carry_over_state(previous: &Suggestion, incoming: &mut Suggestion) {
    incoming.id = previous.id.clone();
    match (&previous.detail, &mut incoming.detail) {
        (
            SuggestionDetail::Advisory { dismissed: was, .. },
            SuggestionDetail::Advisory { dismissed, .. },
        ) => *dismissed = *was,
        _ => {
            if let (Some(prev_state), Some(state)) =
                (previous.rewrite_state(), incoming.rewrite_state_mut())
            {
                if *state == RewriteState::NotRequested {
                    *state = prev_state.clone();
                    if *prev_state == RewriteState::Ready {
                        incoming.replacements = previous.replacements.clone();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::AdvisoryReason;

    fn spelling(text: &str, start: usize, end: usize, fix: &str) -> Suggestion {
        Suggestion::anchored(text, start, end, SuggestionSource::Llm, SuggestionDetail::Spelling)
            .unwrap()
            .with_replacements(vec![fix.to_string()])
    }

    fn concise(text: &str, start: usize, end: usize, fix: &str) -> Suggestion {
        Suggestion::anchored(text, start, end, SuggestionSource::Rules, SuggestionDetail::Conciseness)
            .unwrap()
            .with_replacements(vec![fix.to_string()])
    }

    fn advisory(text: &str, start: usize, end: usize) -> Suggestion {
        Suggestion::anchored(
            text,
            start,
            end,
            SuggestionSource::Llm,
            SuggestionDetail::Advisory {
                reason: AdvisoryReason::StrengthenClaim,
                dismissed: false,
            },
        )
        .unwrap()
    }

    fn passive(text: &str, start: usize, end: usize) -> Suggestion {
        Suggestion::anchored(
            text,
            start,
            end,
            SuggestionSource::Rules,
            SuggestionDetail::Passive {
                phrase_start: start,
                phrase_end: end,
                rewrite: RewriteState::NotRequested,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_replace_batch_dedups_and_validates() {
        let text = "I recieve mail daily.";
        let mut store = SuggestionStore::new();
        let mut bogus = spelling(text, 2, 9, "receive");
        bogus.anchor_text = "receive".into();

        let outcome = store.replace_batch(
            Category::Spelling,
            SuggestionSource::Llm,
            vec![spelling(text, 2, 9, "receive"), spelling(text, 2, 9, "receives"), bogus],
            text,
        );
        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.deduplicated, 1);
        assert_eq!(outcome.invalid, 1);
        assert_eq!(store.category(Category::Spelling).len(), 1);
    }

    #[test]
    fn test_replace_batch_replaces_only_same_source() {
        let text = "We just need to act in order to win.";
        let mut store = SuggestionStore::new();
        let linter = Suggestion::anchored(
            text,
            3,
            7,
            SuggestionSource::Linter,
            SuggestionDetail::Clarity { lint_kind: None },
        )
        .unwrap();
        store.insert(linter, text);

        let rules = Suggestion::anchored(
            text,
            8,
            12,
            SuggestionSource::Rules,
            SuggestionDetail::Clarity { lint_kind: None },
        )
        .unwrap();
        store.replace_batch(Category::Clarity, SuggestionSource::Rules, vec![rules], text);
        assert_eq!(store.category(Category::Clarity).len(), 2);

        store.replace_batch(Category::Clarity, SuggestionSource::Rules, Vec::new(), text);
        assert_eq!(store.category(Category::Clarity).len(), 1);
        assert_eq!(store.category(Category::Clarity)[0].source, SuggestionSource::Linter);
    }

    #[test]
    fn test_ignored_anchor_is_not_reinserted() {
        let text = "I recieve mail.";
        let mut store = SuggestionStore::new();
        let s = spelling(text, 2, 9, "receive");
        let id = s.id.clone();
        store.insert(s, text);
        assert!(store.ignore(&id).is_some());

        let outcome = store.replace_batch(
            Category::Spelling,
            SuggestionSource::Llm,
            vec![spelling(text, 2, 9, "receive")],
            text,
        );
        assert_eq!(outcome.suppressed, 1);
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn test_ids_stay_unique_after_shift() {
        let old = "A recieve.";
        let mut store = SuggestionStore::new();
        let first = spelling(old, 2, 9, "receive");
        let first_id = first.id.clone();
        store.insert(first, old);

        let new = "B recieve C recieve.";
        store.apply_edit(&TextEdit::between(old, new).unwrap(), new);
        assert_eq!(store.get(&first_id).map(|s| s.start), Some(12));

        let outcome = store.replace_batch(
            Category::Spelling,
            SuggestionSource::Llm,
            vec![spelling(new, 2, 9, "receive"), spelling(new, 12, 19, "receive")],
            new,
        );
        assert_eq!(outcome.inserted, 2);

        let ids: HashSet<&str> = store.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        // The moved suggestion keeps its id; the new finding gets another.
        assert_eq!(store.get(&first_id).map(|s| s.start), Some(12));

        store.ignore(&first_id).unwrap();
        let spans: Vec<_> = store.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(spans, vec![(2, 9)]);
    }

    #[test]
    fn test_ignored_anchor_moves_with_edits() {
        let old = "A recieve.";
        let mut store = SuggestionStore::new();
        let s = spelling(old, 2, 9, "receive");
        let id = s.id.clone();
        store.insert(s, old);
        store.ignore(&id).unwrap();

        let new = "B recieve C recieve.";
        store.apply_edit(&TextEdit::between(old, new).unwrap(), new);
        let outcome = store.replace_batch(
            Category::Spelling,
            SuggestionSource::Llm,
            vec![spelling(new, 2, 9, "receive"), spelling(new, 12, 19, "receive")],
            new,
        );
        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.suppressed, 1);
        let spans: Vec<_> = store.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(spans, vec![(2, 9)]);

        // Editing the ignored word forgets it.
        let fixed = "B recieve C receive.";
        store.apply_edit(&TextEdit::between(new, fixed).unwrap(), fixed);
        assert!(store.ignored.is_empty());
    }

    #[test]
    fn test_accept_shifts_later_suggestions() {
        let text = "We act in order to win and recieve praise.";
        let mut store = SuggestionStore::new();
        let wordy = concise(text, 7, 18, "to");
        let wordy_id = wordy.id.clone();
        store.insert(wordy, text);
        store.insert(spelling(text, 27, 34, "receive"), text);

        let new_text = "We act to win and recieve praise.";
        let accepted = store.accept(&wordy_id, "to", Some(new_text)).unwrap();
        assert_eq!(accepted.delta, -9);

        let remaining = store.category(Category::Spelling);
        assert_eq!(remaining.len(), 1);
        assert_eq!((remaining[0].start, remaining[0].end), (18, 25));
        assert!(remaining[0].is_valid_in(new_text));
    }

    #[test]
    fn test_apply_edit_shifts_drops_and_verifies() {
        let old = "Teh cat and teh dog.";
        let mut store = SuggestionStore::new();
        store.insert(spelling(old, 0, 3, "The"), old);
        store.insert(spelling(old, 12, 15, "the"), old);

        let new = "Teh big cat and teh dog.";
        let edit = TextEdit::between(old, new).unwrap();
        let report = store.apply_edit(&edit, new);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.shifted, 1);
        assert_eq!(report.dropped(), 0);

        let spans: Vec<_> = store.iter().map(|s| (s.start, s.end)).collect();
        assert!(spans.contains(&(16, 19)));

        let edited = "Tea big cat and teh dog.";
        let report = store.apply_edit(&TextEdit::between(new, edited).unwrap(), edited);
        assert_eq!(report.dropped_overlap, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_visibility_is_render_filter_only() {
        let text = "I recieve mail.";
        let mut store = SuggestionStore::new();
        store.insert(spelling(text, 2, 9, "receive"), text);
        assert!(!store.toggle_visibility(Category::Spelling));
        assert!(store.visible().is_empty());
        assert_eq!(store.len(), 1);
        store.set_visibility(Category::Spelling, true);
        assert_eq!(store.visible().len(), 1);
    }

    #[test]
    fn test_advisory_dismissal_tiers() {
        let text = "Our platform is the best in the market. Buy it today.";
        let mut store = SuggestionStore::new();
        let comment = advisory(text, 0, 39);
        let id = comment.id.clone();
        store.insert(comment, text);

        assert!(store.dismiss(&id));
        assert!(store.visible().is_empty());
        assert_eq!(store.len(), 1);

        let hash = store.dismiss_permanently(&id).unwrap();
        assert!(store.is_empty());

        let mut fresh = SuggestionStore::new();
        fresh.load_permanent_dismissals([hash]);
        let outcome = fresh.replace_batch(
            Category::Advisory,
            SuggestionSource::Llm,
            vec![advisory(text, 0, 39)],
            text,
        );
        assert_eq!(outcome.suppressed, 1);
    }

    #[test]
    fn test_permanent_dismissal_only_for_advisory() {
        let text = "I recieve mail.";
        let mut store = SuggestionStore::new();
        let s = spelling(text, 2, 9, "receive");
        let id = s.id.clone();
        store.insert(s, text);
        assert!(store.dismiss_permanently(&id).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rewrite_state_survives_reanalysis() {
        let text = "The ball was thrown by Sam.";
        let mut store = SuggestionStore::new();
        let s = passive(text, 0, 27);
        let id = s.id.clone();
        store.insert(s, text);
        assert!(store.mark_rewrite_pending(&id, Instant::now()));
        assert!(store.complete_rewrite(&id, Ok("Sam threw the ball.".into())));

        store.replace_batch(
            Category::Passive,
            SuggestionSource::Rules,
            vec![passive(text, 0, 27)],
            text,
        );
        let kept = store.get(&id).unwrap();
        assert_eq!(kept.rewrite_state(), Some(&RewriteState::Ready));
        assert_eq!(kept.replacements, vec!["Sam threw the ball.".to_string()]);
    }

    #[test]
    fn test_metrics_counts_words_and_spelling() {
        let text = "I recieve mail.";
        let mut store = SuggestionStore::new();
        store.insert(spelling(text, 2, 9, "receive"), text);
        let m = store.metrics(text);
        assert_eq!(m.word_count, 3);
        assert_eq!(m.character_count, 15);
        assert_eq!(m.spelling_errors, 1);
    }
}
