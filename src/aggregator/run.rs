//! Per-run lifecycle tracking and event emission.

use tokio::sync::broadcast;

use crate::error::Error;
use crate::types::{Event, RunId, RunState};

/// Tracks the state of one aggregation run and announces transitions.
pub(crate) struct RunTracker {
    id: RunId,
    state: RunState,
    event_tx: broadcast::Sender<Event>,
}

impl RunTracker {
    pub(crate) fn new(id: RunId, event_tx: broadcast::Sender<Event>) -> Self {
        Self {
            id,
            state: RunState::Pending,
            event_tx,
        }
    }

    pub(crate) fn id(&self) -> RunId {
        self.id
    }

    pub(crate) fn state(&self) -> RunState {
        self.state
    }

    /// Move to `next`, ignoring illegal transitions (they are logged).
    pub(crate) fn transition(&mut self, next: RunState) {
        if !self.state.can_transition_to(next) {
            tracing::warn!(
                run_id = self.id.0,
                from = ?self.state,
                to = ?next,
                "ignoring illegal run state transition"
            );
            return;
        }

        tracing::debug!(run_id = self.id.0, from = ?self.state, to = ?next, "run state changed");
        self.state = next;
        self.emit(Event::RunStateChanged {
            run_id: self.id,
            state: next,
        });
    }

    /// Record the final outcome of the run.
    pub(crate) fn finish(&mut self, outcome: Option<&Error>) {
        match outcome {
            None => self.transition(RunState::Succeeded),
            Some(e) if e.is_cancelled() => self.transition(RunState::Cancelled),
            Some(e) => {
                self.emit(Event::RunFailed {
                    run_id: self.id,
                    code: e.error_code().to_string(),
                    error: e.to_string(),
                });
                self.transition(RunState::Failed);
            }
        }
    }

    pub(crate) fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }
}
