//! Error types for the chat client.

use railchat_core::error::RailchatError;

/// Errors from talking to the remote assistant.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend returned HTTP {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ChatError::Status(status.as_u16())
        } else if err.is_decode() {
            ChatError::MalformedResponse(err.to_string())
        } else {
            ChatError::Transport(err.to_string())
        }
    }
}

impl From<RailchatError> for ChatError {
    fn from(err: RailchatError) -> Self {
        ChatError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(
            ChatError::Transport("connection refused".to_string()).to_string(),
            "transport error: connection refused"
        );
        assert_eq!(ChatError::Status(502).to_string(), "backend returned HTTP 502");
        assert_eq!(
            ChatError::MalformedResponse("missing field `response`".to_string()).to_string(),
            "malformed response: missing field `response`"
        );
    }

    #[test]
    fn test_chat_error_from_railchat_error() {
        let err: ChatError = RailchatError::Config("bad url".to_string()).into();
        assert!(matches!(err, ChatError::Config(_)));
        assert!(err.to_string().contains("bad url"));
    }

    #[test]
    fn test_errors_implement_debug() {
        let dbg = format!("{:?}", ChatError::Status(404));
        assert!(dbg.contains("Status"));
    }
}
