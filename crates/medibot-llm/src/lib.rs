//! Completion provider abstraction for medibot.
//!
//! The relay talks to its language model through [`CompletionProvider`], so the
//! HTTP layer can be exercised against a test double. [`OpenAiProvider`] is the
//! production implementation.

mod openai;

pub use openai::{build_request, OpenAiProvider};

use async_trait::async_trait;
use medibot_core::{ProviderMessage, RelayError};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 300;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionSettings {
    /// Default settings with a different model identifier.
    pub fn with_model(model: impl Into<String>) -> Self {
        Self { model: model.into(), ..Self::default() }
    }
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// A single-shot, non-streaming chat completion backend.
///
/// Implementations must be safe to call concurrently from many requests.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Sends `messages` and returns the text of the first choice.
    async fn complete(&self, messages: &[ProviderMessage]) -> Result<String, RelayError>;
}
