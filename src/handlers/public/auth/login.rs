// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::extract::State;
use serde_json::{Map, Value};

use super::SessionResponse;
use crate::app::AppState;
use crate::auth::password;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::validation;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// POST /api/auth/login - Exchange username and password for a token
///
/// Expected Input:
/// ```json
/// { "username": "farmer1", "password": "password123" }
/// ```
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": {
///     "user": { "id": "...", "username": "farmer1", "role": "farmer", ... },
///     "token": "eyJhbGciOiJIUzI1NiI..."
///   }
/// }
/// ```
///
/// An unknown username and a wrong password produce the same 401, and both
/// paths run one bcrypt operation.
pub async fn login_post(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> ApiResult<SessionResponse> {
    let input = validation::login(&body)?;

    let user = state.storage.get_user_by_username(&input.username).await?;
    let matches = password::check_credentials(
        &input.password,
        user.as_ref().map(|u| u.password_hash.as_str()),
        state.bcrypt_cost(),
    )
    .await
    .map_err(|e| {
        tracing::error!("Password verification failed: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })?;

    let user = match user {
        Some(user) if matches => user,
        _ => {
            tracing::warn!("Failed login attempt for '{}'", input.username);
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        }
    };

    let session = SessionResponse::start(&state, user)?;
    tracing::info!("User '{}' logged in ({})", session.user.username, session.user.id);
    Ok(ApiResponse::success(session))
}
