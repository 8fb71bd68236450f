//! Core domain types and error definitions for medibot.
//!
//! This crate provides the types shared by the relay:
//!
//! - [`Turn`] — One client-supplied transcript entry
//! - [`ProviderMessage`] and [`Role`] — The completion API's message schema
//! - [`ChatReply`] — The response envelope returned to the chat UI
//! - [`RelayError`] — Error type for completion calls
//!
//! # Example
//!
//! ```rust
//! use medibot_core::{has_user_question, to_provider_messages, Role, Turn};
//!
//! let transcript = vec![Turn::user("I have a headache")];
//! assert!(has_user_question(&transcript));
//!
//! let messages = to_provider_messages(&transcript);
//! assert_eq!(messages[0].role, Role::System);
//! assert_eq!(messages[1].content, "I have a headache");
//! ```

mod transcript;

pub use transcript::{has_user_question, role_for, to_provider_messages};

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Fixed instruction prepended to every completion request.
pub const SYSTEM_PROMPT: &str = "You are a compassionate medical assistant chatbot. \
You analyze symptoms described by the user, ask clarifying questions if needed, \
and recommend the most appropriate medical department or action. \
You do NOT provide a diagnosis or prescription. Always be clear, concise, and empathetic.";

/// Reply sent when the transcript has no usable user turn.
pub const EMPTY_INPUT_WARNING: &str = "⚠️ Please provide a medical symptom or question.";

/// Reply sent when the completion provider fails.
pub const PROVIDER_FAILURE_WARNING: &str =
    "⚠️ Sorry, I am having trouble processing your request right now.";

/// Sender value that marks a turn as written by the end user.
pub const USER_SENDER: &str = "user";

/// Errors that can occur while obtaining a completion.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Completion API request failed (transport, auth, rate limit, API error).
    #[error("Completion request failed: {0}")]
    Provider(String),

    /// The provider answered without any message content.
    #[error("Completion returned no content")]
    EmptyReply,

    /// The outgoing request could not be assembled.
    #[error("Invalid completion request: {0}")]
    InvalidRequest(String),
}

/// One entry of a client-supplied transcript.
///
/// Both `{sender, text}` and `{role, content}` shapes are accepted; when both
/// are present, `sender`/`text` win. A field that is not a string reads as
/// absent, so a turn without usable `text` is kept but never forwarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTurn")]
pub struct Turn {
    pub sender: Option<String>,
    pub text: Option<String>,
}

#[derive(Deserialize)]
struct RawTurn {
    #[serde(default, deserialize_with = "string_or_none")]
    sender: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    role: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    text: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    content: Option<String>,
}

impl From<RawTurn> for Turn {
    fn from(raw: RawTurn) -> Self {
        Self {
            sender: raw.sender.or(raw.role),
            text: raw.text.or(raw.content),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrOther {
    String(String),
    Other(IgnoredAny),
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match StringOrOther::deserialize(deserializer)? {
        StringOrOther::String(s) => Ok(Some(s)),
        StringOrOther::Other(_) => Ok(None),
    }
}

impl Turn {
    /// Creates a turn written by the end user.
    pub fn user(text: impl Into<String>) -> Self {
        Self { sender: Some(USER_SENDER.to_string()), text: Some(text.into()) }
    }

    /// Creates a turn written by the bot.
    pub fn bot(text: impl Into<String>) -> Self {
        Self { sender: Some("bot".to_string()), text: Some(text.into()) }
    }

    /// Returns true if this turn counts as a question from the end user.
    pub fn is_user_question(&self) -> bool {
        self.sender.as_deref() == Some(USER_SENDER)
            && self.text.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Role of a message in the provider's schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Fixed instruction message.
    System,
    /// Message from the end user.
    User,
    /// Message from the assistant.
    Assistant,
}

/// A message in the form the completion API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub role: Role,
    pub content: String,
}

impl ProviderMessage {
    /// Creates a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    /// Creates a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    /// Creates a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Response envelope returned by `POST /chat`.
///
/// `suggestions` is reserved for the UI and is always empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub suggestions: Vec<String>,
}

impl ChatReply {
    pub fn new(response: impl Into<String>) -> Self {
        Self { response: response.into(), suggestions: Vec::new() }
    }

    /// Reply for a transcript with no usable user turn.
    pub fn empty_input() -> Self {
        Self::new(EMPTY_INPUT_WARNING)
    }

    /// Reply for a failed completion call.
    pub fn provider_failure() -> Self {
        Self::new(PROVIDER_FAILURE_WARNING)
    }
}
