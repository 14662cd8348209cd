//! Voice input for the railchat client.
//!
//! Wraps a speech-to-text facility behind a small contract: probe for
//! support, start a single-utterance capture that resolves to its transcript,
//! and stop it early. The capture lifecycle is a two-state machine:
//! Idle -> Listening -> Idle.

pub mod capture;
pub mod command;
pub mod engine;
pub mod error;
pub mod state;

pub use capture::{PendingTranscript, VoiceCapture};
pub use command::CommandEngine;
pub use engine::{EventSender, RecognitionEngine, RecognitionEvent, RecognitionSettings};
pub use error::VoiceError;
pub use state::{StateMachine, VoiceState};
