//! Single-utterance voice capture on top of a [`RecognitionEngine`].

use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::{mpsc, oneshot};

use crate::engine::{RecognitionEngine, RecognitionEvent, RecognitionSettings};
use crate::error::VoiceError;
use crate::state::{StateMachine, VoiceState};

type TranscriptResult = Result<String, VoiceError>;

/// The eventual transcript of one capture.
///
/// Resolves exactly once: with the concatenated segments when the engine
/// ends, or with the first error it reports.
#[derive(Debug)]
pub struct PendingTranscript {
    rx: oneshot::Receiver<TranscriptResult>,
}

impl PendingTranscript {
    fn ready(result: TranscriptResult) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self { rx }
    }
}

impl Future for PendingTranscript {
    type Output = TranscriptResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(VoiceError::Failed(
                    "capture ended without a result".to_string(),
                ))
            })
        })
    }
}

/// Voice capture adapter.
///
/// Built from a capability probe: when no engine can be constructed the
/// adapter reports itself unsupported and every capture fails immediately.
pub struct VoiceCapture {
    engine: Option<Mutex<Box<dyn RecognitionEngine>>>,
    state: StateMachine,
}

impl std::fmt::Debug for VoiceCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceCapture")
            .field("supported", &self.engine.is_some())
            .field("state", &self.state.current())
            .finish()
    }
}

impl VoiceCapture {
    /// Build the adapter from a probe that tries to construct an engine.
    pub fn probe<F>(probe: F) -> Self
    where
        F: FnOnce() -> Option<Box<dyn RecognitionEngine>>,
    {
        match probe() {
            Some(engine) => Self::from_engine(engine),
            None => {
                tracing::info!("No speech recognizer available; voice input disabled");
                Self::unsupported()
            }
        }
    }

    /// Build the adapter around a known engine.
    pub fn with_engine<E>(engine: E) -> Self
    where
        E: RecognitionEngine + 'static,
    {
        Self::from_engine(Box::new(engine))
    }

    /// An adapter with no recognizer behind it.
    pub fn unsupported() -> Self {
        Self {
            engine: None,
            state: StateMachine::new(),
        }
    }

    fn from_engine(mut engine: Box<dyn RecognitionEngine>) -> Self {
        engine.configure(&RecognitionSettings::default());
        Self {
            engine: Some(Mutex::new(engine)),
            state: StateMachine::new(),
        }
    }

    /// Whether a recognizer was found at construction time.
    pub fn is_supported(&self) -> bool {
        self.engine.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.state.current() == VoiceState::Listening
    }

    pub fn state(&self) -> VoiceState {
        self.state.current()
    }

    /// Start capturing one utterance.
    ///
    /// Outside a tokio runtime the capture fails with [`VoiceError::Failed`]
    /// before the engine starts. Starting while a capture is already running leaves that capture alone and resolves the new one
    /// with [`VoiceError::AlreadyListening`].
    pub fn start_listening(&self) -> PendingTranscript {
        let Some(engine) = &self.engine else {
            return PendingTranscript::ready(Err(VoiceError::Unsupported));
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("Voice capture requested outside a tokio runtime");
            return PendingTranscript::ready(Err(VoiceError::Failed(
                "no async runtime available".to_string(),
            )));
        };

        let generation = match self.state.begin() {
            Ok(generation) => generation,
            Err(e) => return PendingTranscript::ready(Err(e)),
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        if let Err(e) = lock_engine(engine).start(event_tx) {
            tracing::warn!(error = %e, "Speech recognizer failed to start");
            self.state.finish(generation);
            return PendingTranscript::ready(Err(e));
        }

        tracing::info!(generation, "Voice capture started");
        let (tx, rx) = oneshot::channel();
        runtime.spawn(collect_transcript(
            event_rx,
            self.state.clone(),
            generation,
            tx,
        ));
        PendingTranscript { rx }
    }

    /// Ask the recognizer to stop. No-op when idle.
    ///
    /// The listening flag clears immediately; the pending transcript still
    /// resolves with whatever was heard once the engine reports its end.
    pub fn stop_listening(&self) {
        let Some(engine) = &self.engine else {
            return;
        };
        if self.state.stop() {
            tracing::info!("Voice capture stop requested");
            lock_engine(engine).stop();
        }
    }
}

fn lock_engine(
    engine: &Mutex<Box<dyn RecognitionEngine>>,
) -> MutexGuard<'_, Box<dyn RecognitionEngine>> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn collect_transcript(
    mut events: mpsc::UnboundedReceiver<RecognitionEvent>,
    state: StateMachine,
    generation: u64,
    result: oneshot::Sender<TranscriptResult>,
) {
    let mut transcript = String::new();
    let outcome = loop {
        match events.recv().await {
            Some(RecognitionEvent::Segment(text)) => transcript.push_str(&text),
            Some(RecognitionEvent::Error(cause)) => {
                tracing::warn!(generation, cause = %cause, "Speech recognition error");
                break Err(VoiceError::from_cause(&cause));
            }
            // A dropped sender means the engine is gone; treat it as the end.
            Some(RecognitionEvent::End) | None => break Ok(transcript),
        }
    };

    state.finish(generation);
    if let Ok(text) = &outcome {
        tracing::info!(generation, text_len = text.len(), "Voice capture finished");
    }
    let _ = result.send(outcome);
}

// =============================================================================
// Tests
// =============================================================================
