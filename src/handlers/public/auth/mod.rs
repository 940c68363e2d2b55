// handlers/public/auth/mod.rs - Public authentication handlers
//
// Token acquisition endpoints that do not require authentication.

use serde::Serialize;

use crate::app::AppState;
use crate::database::models::User;
use crate::error::ApiError;

pub mod login; // POST /api/auth/login - authenticate and get JWT
pub mod signup; // POST /api/auth/signup - create account and get JWT

pub use login::login_post;
pub use signup::signup_post;

/// Body returned by signup and login
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,
    pub token: String,
}

impl SessionResponse {
    fn start(state: &AppState, user: User) -> Result<Self, ApiError> {
        let token = state.tokens.issue(user.id, &user.username).map_err(|e| {
            tracing::error!("Token generation failed: {}", e);
            ApiError::internal_server_error("An error occurred while processing your request")
        })?;
        Ok(Self { user, token })
    }
}
