//! Terminal front end: parses typed lines into widget events and renders
//! conversation snapshots.

use chrono::Local;

use railchat_core::types::{ChatMessage, ChatRole};

/// One line of user input, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Send this text.
    Say(String),
    /// Empty line: send the input buffer (a dictated transcript), if any.
    SendPending,
    Clear,
    Voice,
    Help,
    Quit,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return ReplCommand::SendPending;
        }
        if !trimmed.starts_with('/') {
            return ReplCommand::Say(line.trim_end_matches(['\r', '\n']).to_string());
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "/clear" => ReplCommand::Clear,
            "/voice" | "/mic" => ReplCommand::Voice,
            "/help" | "/?" => ReplCommand::Help,
            "/quit" | "/exit" => ReplCommand::Quit,
            _ => ReplCommand::Unknown(trimmed.to_string()),
        }
    }
}

pub const HELP: &str = "\
Type a message and press Enter to send it.
  /voice   start or stop voice input (the transcript is sent with an empty Enter)
  /clear   clear the conversation
  /help    show this help
  /quit    exit";

/// Format one message for the terminal.
pub fn format_message(message: &ChatMessage) -> String {
    let time = message.timestamp.with_timezone(&Local).format("%H:%M");
    let who = match message.role {
        ChatRole::User => "you",
        ChatRole::Assistant => "assistant",
    };
    format!("[{}] {}: {}", time, who, message.content)
}

/// Print every message from index `from` onwards.
pub fn render_from(messages: &[ChatMessage], from: usize) {
    for message in messages.iter().skip(from) {
        println!("{}", format_message(message));
    }
}
