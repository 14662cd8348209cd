//! Abstraction over a speech-to-text facility.
//!
//! An engine is configured once, then started and stopped any number of
//! times. While running it reports what it hears through the event sender
//! handed to `start`, and it must finish every run with `End` (after an
//! `Error`, `End` is optional).

use tokio::sync::mpsc;

use crate::error::VoiceError;

/// Locale used for every capture.
pub const RECOGNITION_LANG: &str = "en-US";

/// Recognizer settings. One final utterance per capture, one alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionSettings {
    /// Keep listening after the first utterance.
    pub continuous: bool,
    /// Report non-final hypotheses.
    pub interim_results: bool,
    /// BCP 47 recognition locale.
    pub lang: String,
    /// Number of alternatives per result.
    pub max_alternatives: u32,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            continuous: false,
            interim_results: false,
            lang: RECOGNITION_LANG.to_string(),
            max_alternatives: 1,
        }
    }
}

/// Something the engine reports while running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// A recognized piece of the utterance, appended to the transcript.
    Segment(String),
    /// Recognition failed. The cause is a short code like `no-speech`.
    Error(String),
    /// The engine stopped listening.
    End,
}

/// Channel an engine reports its events on.
pub type EventSender = mpsc::UnboundedSender<RecognitionEvent>;

/// A speech recognizer the voice adapter can drive.
pub trait RecognitionEngine: Send {
    /// Apply recognizer settings. Called once before the first `start`.
    fn configure(&mut self, settings: &RecognitionSettings);

    /// Begin listening, reporting events on `events`.
    fn start(&mut self, events: EventSender) -> Result<(), VoiceError>;

    /// Ask the engine to stop. Best effort: the engine should still emit
    /// `End` for the run it was asked to stop.
    fn stop(&mut self);
}

impl<T: RecognitionEngine + ?Sized> RecognitionEngine for Box<T> {
    fn configure(&mut self, settings: &RecognitionSettings) {
        (**self).configure(settings)
    }

    fn start(&mut self, events: EventSender) -> Result<(), VoiceError> {
        (**self).start(events)
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}
