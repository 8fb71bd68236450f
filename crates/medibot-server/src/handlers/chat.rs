//! Chat relay HTTP handler.

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use medibot_core::ChatReply;
use tracing::{info, warn};

use crate::dto::ChatRequest;
use crate::error::AppError;
use crate::services::chat as chat_service;
use crate::ServerState;

/// POST /chat - Relays a transcript to the completion provider.
///
/// Always answers 200 once the body parses; failures are reported in the reply text.
pub async fn chat(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, AppError> {
    let Json(req) = payload.map_err(|e| {
        warn!("Rejected chat body: {}", e.body_text());
        e
    })?;

    info!("Chat request with {} turns", req.messages.len());
    let reply = chat_service::handle_chat(state.provider.as_ref(), &req.messages).await;

    Ok(Json(reply))
}
