//! Transcript validation and translation into provider messages.

use crate::{ProviderMessage, Role, Turn, SYSTEM_PROMPT, USER_SENDER};

/// Returns true if at least one turn is a non-empty message from the user.
pub fn has_user_question(turns: &[Turn]) -> bool {
    turns.iter().any(Turn::is_user_question)
}

/// Maps a transcript sender onto a provider role.
///
/// Only `"user"` maps to [`Role::User`]; every other value, including a
/// missing sender, is treated as the assistant.
pub fn role_for(sender: Option<&str>) -> Role {
    match sender {
        Some(USER_SENDER) => Role::User,
        _ => Role::Assistant,
    }
}

/// Builds the provider message list for a transcript.
///
/// The system prompt always comes first. Each turn that carries `text`
/// produces exactly one message, in transcript order; turns without `text`
/// are skipped.
pub fn to_provider_messages(turns: &[Turn]) -> Vec<ProviderMessage> {
    let mut messages = Vec::with_capacity(turns.len() + 1);
    messages.push(ProviderMessage::system(SYSTEM_PROMPT));

    messages.extend(turns.iter().filter_map(|turn| {
        let text = turn.text.as_ref()?;
        Some(ProviderMessage {
            role: role_for(turn.sender.as_deref()),
            content: text.clone(),
        })
    }));

    messages
}
