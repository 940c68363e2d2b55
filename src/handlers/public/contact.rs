// handlers/public/contact.rs - POST /api/contact handler

use axum::extract::State;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::validation;

#[derive(Debug, Serialize)]
pub struct ContactReceipt {
    pub id: Uuid,
    pub message: &'static str,
}

/// POST /api/contact - Leave a message through the public contact form
///
/// Requires `name`, `email` and `message`. Stored messages are never
/// readable through the API.
pub async fn contact_post(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> ApiResult<ContactReceipt> {
    let message = validation::contact(&body)?;
    let stored = state.storage.create_contact_message(message).await?;

    Ok(ApiResponse::created(ContactReceipt {
        id: stored.id,
        message: "Message sent successfully",
    }))
}
