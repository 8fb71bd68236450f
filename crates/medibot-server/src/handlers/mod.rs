//! HTTP route handlers for the relay server.

pub mod chat;

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}
