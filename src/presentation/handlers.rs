// HTTP request handlers
use crate::application::dispatcher::InboundMessage;
use crate::presentation::app_state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Accept a relayed chat message. Directions requests are answered
/// asynchronously in the chat channel; anything else is ignored.
pub async fn receive_message(
    State(state): State<Arc<AppState>>,
    Json(message): Json<InboundMessage>,
) -> StatusCode {
    if state.dispatcher.dispatch(message) {
        StatusCode::ACCEPTED
    } else {
        StatusCode::NO_CONTENT
    }
}
