/// AI concierge endpoint
///
/// ```text
/// POST /v1/concierge/chat
/// { "message": "When is the dry season in Diani?", "context": "June wedding, 80 guests" }
/// ```
///
/// Answers `{ "reply": "..." }`. Without a configured Gemini key the route
/// answers 503; an upstream failure still answers 200 with an apology so the
/// chat widget keeps working.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use amari_shared::concierge::{ConciergeError, FALLBACK_REPLY};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 4000, message = "Message must be 1 to 4000 characters"))]
    pub message: String,

    #[validate(length(max = 2000, message = "Context must be at most 2000 characters"))]
    pub context: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let client = state
        .concierge
        .as_ref()
        .ok_or(ConciergeError::NotConfigured)?;

    if req.message.trim().is_empty() {
        return Err(ApiError::invalid_field("message", "Message is required"));
    }
    req.validate()?;

    let reply = match client.ask(req.message.trim(), req.context.as_deref()).await {
        Ok(reply) => reply,
        Err(err) => {
            tracing::error!(error = %err, model = client.model(), "Concierge request failed");
            FALLBACK_REPLY.to_string()
        }
    };

    Ok(Json(ChatResponse { reply }))
}
