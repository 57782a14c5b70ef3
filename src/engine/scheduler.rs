//! Debounce timers and snapshot tickets.
//!
//! Every run is dispatched with a [`Ticket`] naming the analyzer, a
//! per-analyzer generation, and the exact text it will analyze. A result is
//! applied only if no newer generation of the same analyzer has been applied
//! already; whether it still fits the current text is the engine's call.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct Ticket {
    pub analyzer: usize,
    /// Bumped whenever a new document is loaded.
    pub epoch: u64,
    pub generation: u64,
    pub snapshot: Arc<str>,
}

#[derive(Debug)]
struct Slot {
    window: Duration,
    next_generation: u64,
    applied: Option<u64>,
    timer: Option<JoinHandle<()>>,
}

#[derive(Debug, Default)]
pub(crate) struct Scheduler {
    slots: Vec<Slot>,
    epoch: u64,
}

impl Scheduler {
    /// Register an analyzer with its debounce window; returns its slot.
    pub(crate) fn register(&mut self, window: Duration) -> usize {
        self.slots.push(Slot {
            window,
            next_generation: 0,
            applied: None,
            timer: None,
        });
        self.slots.len() - 1
    }

    pub(crate) fn window(&self, analyzer: usize) -> Duration {
        self.slots
            .get(analyzer)
            .map(|s| s.window)
            .unwrap_or_default()
    }

    pub(crate) fn issue(&mut self, analyzer: usize, snapshot: Arc<str>) -> Option<Ticket> {
        let slot = self.slots.get_mut(analyzer)?;
        slot.next_generation += 1;
        Some(Ticket {
            analyzer,
            epoch: self.epoch,
            generation: slot.next_generation,
            snapshot,
        })
    }

    /// Install a new debounce timer, cancelling the previous one. A timer
    /// that already fired has handed its run off, so the run is unaffected.
    pub(crate) fn arm(&mut self, analyzer: usize, timer: JoinHandle<()>) {
        match self.slots.get_mut(analyzer) {
            Some(slot) => {
                if let Some(previous) = slot.timer.replace(timer) {
                    previous.abort();
                }
            }
            None => timer.abort(),
        }
    }

    pub(crate) fn has_pending_timer(&self, analyzer: usize) -> bool {
        self.slots
            .get(analyzer)
            .and_then(|s| s.timer.as_ref())
            .is_some_and(|t| !t.is_finished())
    }

    /// Whether the run belongs to a previous document, or a newer run of the
    /// same analyzer has already been applied.
    pub(crate) fn is_superseded(&self, ticket: &Ticket) -> bool {
        if ticket.epoch != self.epoch {
            return true;
        }
        self.slots
            .get(ticket.analyzer)
            .and_then(|s| s.applied)
            .is_some_and(|applied| applied > ticket.generation)
    }

    pub(crate) fn mark_applied(&mut self, ticket: &Ticket) {
        if let Some(slot) = self.slots.get_mut(ticket.analyzer) {
            slot.applied = Some(slot.applied.map_or(ticket.generation, |a| a.max(ticket.generation)));
        }
    }

    /// Start over for a new document: cancel timers and outdate every
    /// ticket issued so far.
    pub(crate) fn reset(&mut self) {
        self.cancel_pending();
        self.epoch += 1;
        for slot in &mut self.slots {
            slot.applied = None;
        }
    }

    pub(crate) fn cancel_pending(&mut self) {
        for slot in &mut self.slots {
            if let Some(timer) = slot.timer.take() {
                timer.abort();
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
