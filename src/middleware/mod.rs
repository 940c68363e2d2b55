pub mod auth;
pub mod json;
pub mod response;

pub use auth::{require_auth, AuthUser};
pub use json::ApiJson;
pub use response::{ApiResponse, ApiResult};
