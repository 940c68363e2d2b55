// handlers/public/auth/signup.rs - POST /api/auth/signup handler

use axum::extract::State;
use serde_json::{Map, Value};

use super::SessionResponse;
use crate::app::AppState;
use crate::auth::password;
use crate::database::models::NewUser;
use crate::database::StorageError;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::validation;

/// POST /api/auth/signup - Create an account and start a session
///
/// Expected Input:
/// ```json
/// {
///   "username": "farmer1",
///   "email": "farmer1@example.com",
///   "password": "password123",
///   "fullName": "Rajesh Kumar"
/// }
/// ```
///
/// Responds 201 with `{ "user": {...}, "token": "eyJ..." }`. A taken
/// username or email is 400 `ALREADY_EXISTS`.
pub async fn signup_post(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> ApiResult<SessionResponse> {
    let input = validation::signup(&body)?;

    // Fast path for the common conflict; the unique constraint still
    // decides races between concurrent signups.
    if state.storage.get_user_by_username(&input.username).await?.is_some()
        || state.storage.get_user_by_email(&input.email).await?.is_some()
    {
        return Err(ApiError::already_exists("User already exists"));
    }

    let password_hash = password::hash_password(&input.password, state.bcrypt_cost())
        .await
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            ApiError::internal_server_error("An error occurred while processing your request")
        })?;

    let user = state
        .storage
        .create_user(NewUser {
            username: input.username,
            email: input.email,
            password_hash,
            full_name: input.full_name,
            role: None,
        })
        .await
        .map_err(|e| match e {
            StorageError::Duplicate(_) => {
                ApiError::already_exists("User already exists")
            }
            other => other.into(),
        })?;

    let session = SessionResponse::start(&state, user)?;
    tracing::info!("New user '{}' signed up ({})", session.user.username, session.user.id);
    Ok(ApiResponse::created(session))
}
