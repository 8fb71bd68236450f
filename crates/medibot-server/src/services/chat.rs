//! The chat relay: validate, translate, dispatch, and wrap the reply.

use medibot_core::{has_user_question, to_provider_messages, ChatReply, Turn};
use medibot_llm::CompletionProvider;
use tracing::{debug, error, info};

/// Answers one transcript. Never fails: empty input and provider errors both
/// become fixed warning replies.
pub async fn handle_chat(provider: &dyn CompletionProvider, turns: &[Turn]) -> ChatReply {
    if !has_user_question(turns) {
        info!("No user question in transcript of {} turns", turns.len());
        return ChatReply::empty_input();
    }

    let messages = to_provider_messages(turns);

    match provider.complete(&messages).await {
        Ok(answer) => {
            debug!("Completion returned {} chars", answer.len());
            ChatReply::new(answer.trim())
        }
        Err(e) => {
            error!("Completion provider error: {}", e);
            ChatReply::provider_failure()
        }
    }
}
