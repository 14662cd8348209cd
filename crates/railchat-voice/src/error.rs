//! Voice capture errors and their user-facing alerts.

/// Errors from the voice capture adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoiceError {
    #[error("speech recognition is not supported in this environment")]
    Unsupported,
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("no speech detected")]
    NoSpeech,
    #[error("voice capture is already active")]
    AlreadyListening,
    #[error("speech recognition error: {0}")]
    Failed(String),
}

impl VoiceError {
    /// Classify a recognizer cause string such as `not-allowed` or `no-speech`.
    pub fn from_cause(cause: &str) -> Self {
        let normalized = cause.trim().to_ascii_lowercase();
        if normalized.contains("not-allowed") || normalized.contains("permission") {
            VoiceError::PermissionDenied
        } else if normalized.contains("no-speech") {
            VoiceError::NoSpeech
        } else {
            VoiceError::Failed(cause.trim().to_string())
        }
    }

    /// Alert text shown to the user for this error.
    pub fn alert_message(&self) -> &'static str {
        match self {
            VoiceError::Unsupported => {
                "Voice input is not supported here. Please type your message instead."
            }
            VoiceError::PermissionDenied => {
                "Microphone access was denied. Please allow microphone access to use voice input."
            }
            VoiceError::NoSpeech => "No speech was detected. Please try again.",
            VoiceError::AlreadyListening | VoiceError::Failed(_) => {
                "Voice input failed. Please try again or type your message."
            }
        }
    }
}
