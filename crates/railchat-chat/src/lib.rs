//! Chat session client for the train booking assistant.
//!
//! Keeps the conversation for one page lifetime, forwards user messages to
//! the remote assistant over HTTP, and pairs the conversation with voice
//! input in a single UI-facing object.

pub mod api;
pub mod error;
pub mod session;
pub mod widget;

pub use api::{AssistantApi, HttpAssistant};
pub use error::ChatError;
pub use session::{
    generate_session_id, ChatSession, SessionSnapshot, SubmitOutcome, CLEARED_MESSAGE,
    FALLBACK_REPLY, WELCOME_MESSAGE,
};
pub use widget::{ChatWidget, VoiceToggle, WidgetSnapshot};
