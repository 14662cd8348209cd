//! Voice capture state machine with thread-safe transitions.
//!
//! Valid transitions:
//! - Idle -> Listening (capture started)
//! - Listening -> Idle (result, error, end, or explicit stop)
//!
//! Every capture is tagged with a generation number so that a late
//! completion from an already-stopped capture cannot end a newer one.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::VoiceError;

/// Operational state of voice capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum VoiceState {
    /// No capture in progress.
    #[default]
    Idle,
    /// The recognizer is listening for one utterance.
    Listening,
}

impl fmt::Display for VoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceState::Idle => write!(f, "Idle"),
            VoiceState::Listening => write!(f, "Listening"),
        }
    }
}

impl VoiceState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &VoiceState) -> bool {
        matches!(
            (self, target),
            (VoiceState::Idle, VoiceState::Listening) | (VoiceState::Listening, VoiceState::Idle)
        )
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: VoiceState,
    generation: u64,
}

/// Shared voice state. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    inner: Arc<Mutex<Inner>>,
}

impl StateMachine {
    /// Create a new state machine initialized to `Idle`.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the current state.
    pub fn current(&self) -> VoiceState {
        self.lock().state
    }

    /// Enter `Listening` and return the generation of the new capture.
    pub fn begin(&self) -> Result<u64, VoiceError> {
        let mut inner = self.lock();
        if !inner.state.can_transition_to(&VoiceState::Listening) {
            return Err(VoiceError::AlreadyListening);
        }
        inner.generation += 1;
        tracing::debug!(
            generation = inner.generation,
            "Voice state: {} -> {}",
            inner.state,
            VoiceState::Listening
        );
        inner.state = VoiceState::Listening;
        Ok(inner.generation)
    }

    /// Return to `Idle` regardless of which capture is running.
    ///
    /// Returns `true` if a capture was active.
    pub fn stop(&self) -> bool {
        let mut inner = self.lock();
        if inner.state == VoiceState::Listening {
            tracing::debug!(
                generation = inner.generation,
                "Voice state: Listening -> Idle (stop)"
            );
            inner.state = VoiceState::Idle;
            true
        } else {
            false
        }
    }

    /// Return to `Idle` only if `generation` is still the running capture.
    pub fn finish(&self, generation: u64) -> bool {
        let mut inner = self.lock();
        if inner.state == VoiceState::Listening && inner.generation == generation {
            tracing::debug!(generation, "Voice state: Listening -> Idle");
            inner.state = VoiceState::Idle;
            true
        } else {
            false
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
