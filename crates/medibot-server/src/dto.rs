//! HTTP request DTOs.

use medibot_core::Turn;
use serde::Deserialize;

/// Body of `POST /chat`. A missing `messages` key is an empty transcript.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<Turn>,
}
