// handlers/protected/auth/me.rs - GET /api/auth/me handler

use axum::extract::State;

use crate::app::AppState;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/auth/me - Profile of the token's user
///
/// A valid token whose user no longer exists is 404 "User not found".
pub async fn me_get(State(state): State<AppState>, caller: AuthUser) -> ApiResult<User> {
    let user = state
        .storage
        .get_user(caller.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::success(user))
}
