//! One-shot settlement cell shared by a request task and its cancellers.

use std::sync::{Arc, Mutex, PoisonError};

use gateway::{Outcome, Phase};
use tokio::sync::oneshot;

/// Tagged state of a settlement cell.
///
/// The sender lives in `Pending` only; taking it out is the settlement.
#[derive(Debug)]
enum State {
    Pending(oneshot::Sender<Outcome>),
    Settled(Phase),
}

/// Guards the single resolution or rejection of a request handle.
///
/// Whichever party calls [`Settlement::settle`] first delivers its outcome;
/// every later call is a no-op that reports `false`.
#[derive(Debug)]
pub(crate) struct Settlement {
    state: Mutex<State>,
}

impl Settlement {
    /// Creates a pending cell and the receiver its outcome is delivered to.
    pub(crate) fn new() -> (Arc<Self>, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        let cell = Arc::new(Self {
            state: Mutex::new(State::Pending(tx)),
        });
        (cell, rx)
    }

    /// Settles the cell with `outcome` if it is still pending.
    ///
    /// Returns `true` if this call performed the settlement.
    pub(crate) fn settle(&self, outcome: Outcome) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match std::mem::replace(&mut *state, State::Settled(Phase::of(&outcome))) {
            State::Pending(tx) => {
                // The receiver may already be gone; the phase is still recorded.
                let _ = tx.send(outcome);
                true
            }
            previous @ State::Settled(_) => {
                *state = previous;
                false
            }
        }
    }

    /// Returns the current phase.
    pub(crate) fn phase(&self) -> Phase {
        match &*self.state.lock().unwrap_or_else(PoisonError::into_inner) {
            State::Pending(_) => Phase::Pending,
            State::Settled(phase) => *phase,
        }
    }
}
