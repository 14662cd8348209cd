//! The object a chat UI owns: the conversation plus voice input.
//!
//! The UI renders [`ChatWidget::snapshot`] and forwards its events here.

use railchat_voice::{VoiceCapture, VoiceError, VoiceState};

use crate::api::AssistantApi;
use crate::session::{ChatSession, SessionSnapshot, SubmitOutcome};

/// Result of pressing the microphone button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceToggle {
    /// A running capture was asked to stop.
    Stopped,
    /// A capture finished with this transcript. A non-blank transcript has
    /// replaced the input buffer.
    Transcribed(String),
    /// Nothing was captured; show the alert to the user.
    Alert(VoiceError),
}

impl VoiceToggle {
    pub fn alert_message(&self) -> Option<&'static str> {
        match self {
            VoiceToggle::Alert(e) => Some(e.alert_message()),
            _ => None,
        }
    }
}

/// Everything the UI needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSnapshot {
    pub session: SessionSnapshot,
    pub voice_state: VoiceState,
    pub voice_supported: bool,
}

pub struct ChatWidget<A> {
    session: ChatSession<A>,
    voice: VoiceCapture,
}

impl<A> std::fmt::Debug for ChatWidget<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatWidget")
            .field("session", &self.session)
            .field("voice", &self.voice)
            .finish()
    }
}

impl<A: AssistantApi> ChatWidget<A> {
    pub fn new(session: ChatSession<A>, voice: VoiceCapture) -> Self {
        Self { session, voice }
    }

    pub fn session(&self) -> &ChatSession<A> {
        &self.session
    }

    pub fn voice(&self) -> &VoiceCapture {
        &self.voice
    }

    pub fn set_input(&self, text: impl Into<String>) {
        self.session.set_input(text);
    }

    /// Send the input buffer.
    pub async fn send(&self) -> SubmitOutcome {
        self.session.submit_input().await
    }

    pub async fn send_text(&self, text: &str) -> SubmitOutcome {
        self.session.submit(text).await
    }

    pub async fn clear(&self) -> bool {
        self.session.clear().await
    }

    /// Microphone button: stop a running capture, otherwise capture one
    /// utterance into the input buffer.
    ///
    /// The returned future stays pending for the whole capture; a second
    /// toggle from another task stops it.
    pub async fn toggle_voice(&self) -> VoiceToggle {
        if self.voice.is_listening() {
            self.voice.stop_listening();
            return VoiceToggle::Stopped;
        }
        if !self.voice.is_supported() {
            return VoiceToggle::Alert(VoiceError::Unsupported);
        }

        match self.voice.start_listening().await {
            Ok(transcript) => {
                if !transcript.trim().is_empty() {
                    self.session.set_input(transcript.clone());
                }
                VoiceToggle::Transcribed(transcript)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Voice input failed");
                VoiceToggle::Alert(e)
            }
        }
    }

    pub fn snapshot(&self) -> WidgetSnapshot {
        WidgetSnapshot {
            session: self.session.snapshot(),
            voice_state: self.voice.state(),
            voice_supported: self.voice.is_supported(),
        }
    }
}
