//! Client for the remote assistant service.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use railchat_core::config::ApiConfig;
use railchat_core::types::{ChatRequest, ChatResponse, ClearRequest};

use crate::error::ChatError;

/// Operations the chat session needs from the assistant backend.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Send one user message and return the backend's reply.
    async fn send_message(&self, message: &str, session_id: &str)
        -> Result<ChatResponse, ChatError>;

    /// Drop the backend's history for `session_id`.
    async fn clear_history(&self, session_id: &str) -> Result<(), ChatError>;
}

#[async_trait]
impl<T: AssistantApi + ?Sized> AssistantApi for Arc<T> {
    async fn send_message(
        &self,
        message: &str,
        session_id: &str,
    ) -> Result<ChatResponse, ChatError> {
        (**self).send_message(message, session_id).await
    }

    async fn clear_history(&self, session_id: &str) -> Result<(), ChatError> {
        (**self).clear_history(session_id).await
    }
}

/// [`AssistantApi`] over HTTP/JSON.
///
/// `POST {base_url}/chat` with `{message, session_id}` and
/// `POST {base_url}/chat/clear` with `{session_id}`. No retries and no
/// timeout: a hung request stays pending until the connection gives up.
#[derive(Clone, Debug)]
pub struct HttpAssistant {
    client: Client,
    base_url: String,
}

impl HttpAssistant {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build a client from the `[api]` section, rejecting unusable URLs.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ChatError> {
        config.validate()?;
        Ok(Self::new(config.normalized_base_url()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl AssistantApi for HttpAssistant {
    async fn send_message(
        &self,
        message: &str,
        session_id: &str,
    ) -> Result<ChatResponse, ChatError> {
        let request = ChatRequest {
            message: message.to_string(),
            session_id: session_id.to_string(),
        };
        self.post_chat(&request)
            .await
            .inspect_err(|e| tracing::error!(session_id, error = %e, "Chat API error"))
    }

    async fn clear_history(&self, session_id: &str) -> Result<(), ChatError> {
        let request = ClearRequest {
            session_id: session_id.to_string(),
        };
        self.post_clear(&request)
            .await
            .inspect_err(|e| tracing::error!(session_id, error = %e, "Clear history error"))
    }
}

impl HttpAssistant {
    async fn post_chat(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        let response = self
            .client
            .post(self.endpoint("/chat"))
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<ChatResponse>().await?)
    }

    async fn post_clear(&self, request: &ClearRequest) -> Result<(), ChatError> {
        self.client
            .post(self.endpoint("/chat/clear"))
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = HttpAssistant::new("http://localhost:5000/");
        assert_eq!(api.base_url(), "http://localhost:5000");
        assert_eq!(api.endpoint("/chat"), "http://localhost:5000/chat");
        assert_eq!(api.endpoint("/chat/clear"), "http://localhost:5000/chat/clear");
    }

    #[test]
    fn test_from_config_uses_default_endpoint() {
        let api = HttpAssistant::from_config(&ApiConfig::default()).unwrap();
        assert_eq!(api.base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_from_config_rejects_url_without_scheme() {
        let config = ApiConfig {
            base_url: "localhost:5000".to_string(),
        };
        let err = HttpAssistant::from_config(&config).unwrap_err();
        assert!(matches!(err, ChatError::Config(_)));
        assert!(err.to_string().contains("localhost:5000"));
    }
}
