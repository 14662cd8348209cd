//! Conversation state for one page lifetime.
//!
//! The session owns the ordered message list, the input buffer, and the
//! single-flight loading flag. Its lock is never held across an await, so
//! a UI can render [`ChatSession::snapshot`] while a reply is pending.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rand::Rng;

use railchat_core::types::ChatMessage;

use crate::api::AssistantApi;

/// Greeting shown when the conversation opens.
pub const WELCOME_MESSAGE: &str = "Hello! I'm your train booking assistant. I can help you search for trains, find the best options, and guide you through the booking process. Where would you like to travel?";

/// Greeting shown after the history is cleared.
pub const CLEARED_MESSAGE: &str =
    "Chat history cleared. How can I help you with train bookings today?";

/// Assistant reply synthesized when the backend cannot be reached or answers
/// with something unusable.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

const SESSION_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Produce a session identifier: `session_<unix millis>_<9 base-36 chars>`.
///
/// Unique with overwhelming probability within a process; not a secret.
pub fn generate_session_id() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..SESSION_SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("session_{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// What a call to [`ChatSession::submit`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Input was empty after trimming; nothing happened.
    Ignored,
    /// Another submission was in flight; nothing happened.
    Busy,
    /// The assistant's reply was appended.
    Replied,
    /// The request failed and the fallback reply was appended.
    Failed,
}

/// Point-in-time copy of the session for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub messages: Vec<ChatMessage>,
    pub input: String,
    pub loading: bool,
}

#[derive(Debug)]
struct SessionState {
    messages: Vec<ChatMessage>,
    input: String,
    loading: bool,
    /// Bumped by every clear; replies requested under an older epoch are dropped.
    epoch: u64,
}

/// A conversation with the remote assistant.
pub struct ChatSession<A> {
    api: A,
    session_id: String,
    state: Mutex<SessionState>,
}

impl<A> std::fmt::Debug for ChatSession<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("session_id", &self.session_id)
            .field("state", &self.state)
            .finish()
    }
}

/// Clears the loading flag when dropped, including when the submitting
/// future is cancelled.
struct LoadingGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        lock_state(self.state).loading = false;
    }
}

fn lock_state(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<A: AssistantApi> ChatSession<A> {
    /// Start a conversation with a freshly generated session id.
    pub fn new(api: A) -> Self {
        Self::with_session_id(api, generate_session_id())
    }

    pub fn with_session_id(api: A, session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        tracing::info!(session_id = %session_id, "Chat session opened");
        Self {
            api,
            session_id,
            state: Mutex::new(SessionState {
                messages: vec![ChatMessage::assistant(WELCOME_MESSAGE)],
                input: String::new(),
                loading: false,
                epoch: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        lock_state(&self.state)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    #[cfg(test)]
    pub(crate) fn api(&self) -> &A {
        &self.api
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().messages.clone()
    }

    pub fn input(&self) -> String {
        self.lock().input.clone()
    }

    pub fn set_input(&self, text: impl Into<String>) {
        self.lock().input = text.into();
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            messages: state.messages.clone(),
            input: state.input.clone(),
            loading: state.loading,
        }
    }

    /// Submit whatever is in the input buffer.
    pub async fn submit_input(&self) -> SubmitOutcome {
        let text = self.input();
        self.submit(&text).await
    }

    /// Send `text` to the assistant and append both sides of the exchange.
    ///
    /// Blank input and submissions while another is in flight are ignored.
    /// Failures never escape: the user sees [`FALLBACK_REPLY`] instead.
    /// A reply that arrives after [`ChatSession::clear`] is discarded.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            return SubmitOutcome::Ignored;
        }

        let epoch = {
            let mut state = self.lock();
            if state.loading {
                tracing::debug!(
                    session_id = %self.session_id,
                    "Submission ignored, reply pending"
                );
                return SubmitOutcome::Busy;
            }
            state.messages.push(ChatMessage::user(text));
            state.input.clear();
            state.loading = true;
            state.epoch
        };
        let _loading = LoadingGuard { state: &self.state };

        let (reply, outcome) = match self.api.send_message(text, &self.session_id).await {
            Ok(response) => {
                tracing::debug!(
                    session_id = %self.session_id,
                    reply_len = response.response.len(),
                    "Assistant replied"
                );
                (ChatMessage::assistant(response.response), SubmitOutcome::Replied)
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    error = %e,
                    "Falling back after failed submission"
                );
                (ChatMessage::assistant(FALLBACK_REPLY), SubmitOutcome::Failed)
            }
        };

        let mut state = self.lock();
        if state.epoch != epoch {
            tracing::debug!(
                session_id = %self.session_id,
                "Dropping reply to a cleared conversation"
            );
            return outcome;
        }
        state.messages.push(reply);
        outcome
    }

    /// Ask the backend to forget this session and reset the local history
    /// to a single greeting.
    ///
    /// The local reset happens even when the backend call fails, so the two
    /// histories can diverge. Returns whether the backend call succeeded.
    pub async fn clear(&self) -> bool {
        let remote_cleared = match self.api.clear_history(&self.session_id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    session_id = %self.session_id,
                    error = %e,
                    "Failed to clear history"
                );
                false
            }
        };

        let mut state = self.lock();
        state.messages = vec![ChatMessage::assistant(CLEARED_MESSAGE)];
        state.epoch += 1;
        remote_cleared
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use railchat_core::types::{ChatResponse, ChatRole};
    use tokio::sync::Notify;

    use crate::error::ChatError;

    /// Assistant double: replies with a fixed text (or fails), optionally
    /// waiting on a gate first, and records every call.
    #[derive(Default)]
    struct FakeAssistant {
        reply: Option<String>,
        clear_fails: bool,
        gate: Option<Arc<Notify>>,
        sent: Mutex<Vec<(String, String)>>,
        cleared: Mutex<Vec<String>>,
    }

    impl FakeAssistant {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                ..Self::default()
            }
        }

        fn failing() -> Self {
            Self::default()
        }

        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AssistantApi for FakeAssistant {
        async fn send_message(
            &self,
            message: &str,
            session_id: &str,
        ) -> Result<ChatResponse, ChatError> {
            self.sent
                .lock()
                .unwrap()
                .push((message.to_string(), session_id.to_string()));
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match &self.reply {
                Some(reply) => Ok(ChatResponse {
                    success: true,
                    response: reply.clone(),
                    session_id: session_id.to_string(),
                    error: None,
                }),
                None => Err(ChatError::Transport("connection refused".to_string())),
            }
        }

        async fn clear_history(&self, session_id: &str) -> Result<(), ChatError> {
            self.cleared.lock().unwrap().push(session_id.to_string());
            if self.clear_fails {
                Err(ChatError::Status(500))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_session_id_format() {
        let id = generate_session_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "session");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_session_ids_are_distinct() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_session_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_new_session_starts_with_greeting() {
        let session = ChatSession::new(FakeAssistant::replying("ok"));
        let messages = session.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, ChatRole::Assistant);
        assert_eq!(messages[0].content, WELCOME_MESSAGE);
        assert!(session.session_id().starts_with("session_"));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_submit_appends_user_and_reply() {
        let session =
            ChatSession::with_session_id(FakeAssistant::replying("Here are 3 options..."), "s1");
        session.set_input("Find trains from Delhi to Mumbai tomorrow");

        let outcome = session.submit("Find trains from Delhi to Mumbai tomorrow").await;
        assert_eq!(outcome, SubmitOutcome::Replied);

        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, ChatRole::User);
        assert_eq!(messages[1].content, "Find trains from Delhi to Mumbai tomorrow");
        assert_eq!(messages[2].role, ChatRole::Assistant);
        assert_eq!(messages[2].content, "Here are 3 options...");
        assert!(session.input().is_empty());
        assert!(!session.is_loading());
        assert_eq!(
            session.api().sent(),
            vec![(
                "Find trains from Delhi to Mumbai tomorrow".to_string(),
                "s1".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_submit_keeps_raw_text() {
        let session = ChatSession::new(FakeAssistant::replying("ok"));
        session.submit("  NDLS to BCT  ").await;
        assert_eq!(session.messages()[1].content, "  NDLS to BCT  ");
        assert_eq!(session.api().sent()[0].0, "  NDLS to BCT  ");
    }

    #[tokio::test]
    async fn test_submit_failure_appends_fallback() {
        let session = ChatSession::new(FakeAssistant::failing());
        let outcome = session.submit("Find trains from Delhi to Mumbai tomorrow").await;
        assert_eq!(outcome, SubmitOutcome::Failed);

        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].role, ChatRole::Assistant);
        assert_eq!(messages[2].content, FALLBACK_REPLY);
        assert_eq!(
            messages[2].content,
            "Sorry, I encountered an error. Please try again."
        );
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_blank_submit_is_noop() {
        let session = ChatSession::new(FakeAssistant::replying("ok"));
        session.set_input("   ");

        assert_eq!(session.submit("").await, SubmitOutcome::Ignored);
        assert_eq!(session.submit(" \t\n").await, SubmitOutcome::Ignored);
        assert_eq!(session.submit_input().await, SubmitOutcome::Ignored);

        assert_eq!(session.messages().len(), 1);
        assert!(session.api().sent().is_empty());
        assert_eq!(session.input(), "   ");
    }

    #[tokio::test]
    async fn test_submit_input_uses_buffer() {
        let session = ChatSession::new(FakeAssistant::replying("Which class?"));
        session.set_input("Cheapest 3AC tomorrow");
        assert_eq!(session.submit_input().await, SubmitOutcome::Replied);
        assert_eq!(session.messages()[1].content, "Cheapest 3AC tomorrow");
        assert!(session.input().is_empty());
    }

    #[tokio::test]
    async fn test_each_submit_adds_exactly_two_messages() {
        let session = ChatSession::new(FakeAssistant::replying("ok"));
        for i in 1..=5 {
            session.submit(&format!("message {}", i)).await;
            assert_eq!(session.messages().len(), 1 + 2 * i);
            assert!(!session.is_loading());
        }
    }

    #[tokio::test]
    async fn test_submit_while_loading_is_noop() {
        let gate = Arc::new(Notify::new());
        let api = FakeAssistant {
            reply: Some("first reply".to_string()),
            gate: Some(Arc::clone(&gate)),
            ..FakeAssistant::default()
        };
        let session = Arc::new(ChatSession::with_session_id(api, "s1"));

        let in_flight = Arc::clone(&session);
        let first = tokio::spawn(async move { in_flight.submit("first").await });
        while !session.is_loading() {
            tokio::task::yield_now().await;
        }

        assert_eq!(session.submit("second").await, SubmitOutcome::Busy);
        let snapshot = session.snapshot();
        assert!(snapshot.loading);
        assert_eq!(snapshot.messages.len(), 2);

        gate.notify_one();
        assert_eq!(first.await.unwrap(), SubmitOutcome::Replied);
        assert!(!session.is_loading());
        assert_eq!(session.api().sent().len(), 1);
        assert_eq!(session.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_submit_clears_loading() {
        let api = FakeAssistant {
            reply: Some("never".to_string()),
            gate: Some(Arc::new(Notify::new())),
            ..FakeAssistant::default()
        };
        let session = ChatSession::new(api);

        let result = tokio::time::timeout(Duration::from_millis(20), session.submit("hello")).await;
        assert!(result.is_err());
        assert!(!session.is_loading());
        assert_eq!(session.submit("   ").await, SubmitOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_clear_resets_to_single_greeting() {
        let session = ChatSession::with_session_id(FakeAssistant::replying("ok"), "s1");
        session.submit("one").await;
        assert_eq!(session.messages().len(), 3);
        session.submit("two").await;

        assert!(session.clear().await);
        let messages = session.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, ChatRole::Assistant);
        assert_eq!(messages[0].content, CLEARED_MESSAGE);
        assert_eq!(*session.api().cleared.lock().unwrap(), vec!["s1".to_string()]);
    }

    #[tokio::test]
    async fn test_clear_failure_still_resets_locally() {
        // Known divergence: the backend may still hold the old history.
        let api = FakeAssistant {
            reply: Some("ok".to_string()),
            clear_fails: true,
            ..FakeAssistant::default()
        };
        let session = ChatSession::new(api);
        session.submit("one").await;

        assert!(!session.clear().await);
        let messages = session.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, CLEARED_MESSAGE);
    }

    #[tokio::test]
    async fn test_reply_after_clear_is_discarded() {
        let gate = Arc::new(Notify::new());
        let api = FakeAssistant {
            reply: Some("late reply".to_string()),
            gate: Some(Arc::clone(&gate)),
            ..FakeAssistant::default()
        };
        let session = Arc::new(ChatSession::with_session_id(api, "s1"));

        let in_flight = Arc::clone(&session);
        let pending = tokio::spawn(async move { in_flight.submit("hi").await });
        while !session.is_loading() {
            tokio::task::yield_now().await;
        }

        assert!(session.clear().await);
        assert_eq!(session.messages().len(), 1);

        gate.notify_one();
        assert_eq!(pending.await.unwrap(), SubmitOutcome::Replied);

        let messages = session.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, CLEARED_MESSAGE);
        assert!(!session.is_loading());

        gate.notify_one();
        assert_eq!(session.submit("again").await, SubmitOutcome::Replied);
        assert_eq!(session.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_session_id_stable_across_operations() {
        let session = ChatSession::new(FakeAssistant::replying("ok"));
        let id = session.session_id().to_string();
        session.submit("a").await;
        session.clear().await;
        session.submit("b").await;

        let sent = session.api().sent();
        assert!(sent.iter().all(|(_, sid)| *sid == id));
        assert_eq!(session.session_id(), id);
    }
}
