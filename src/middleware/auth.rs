use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{Claims, TokenService};
use crate::error::ApiError;

/// Authenticated caller, resolved from the bearer token
#[derive(Clone, Debug, PartialEq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

/// Bearer token authentication for every protected route.
///
/// Missing, malformed, tampered and expired tokens are all 401. On success
/// the caller is stored as an [`AuthUser`] request extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = authenticate(&state.tokens, request.headers())?;
    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

/// Resolve the bearer token in `headers` to the user it was issued to
pub fn authenticate(tokens: &TokenService, headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    let token = extract_bearer_token(headers).map_err(ApiError::unauthorized)?;

    let claims = tokens.verify(token).map_err(|e| {
        tracing::warn!("Rejected bearer token: {}", e);
        ApiError::unauthorized("Invalid or expired token")
    })?;

    Ok(AuthUser::from(claims))
}

/// Pull the token out of `Authorization: Bearer <token>`
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or("Access token required")?
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or("Authorization header must use Bearer token format")?
        .trim();
    if token.is_empty() {
        return Err("Access token required");
    }
    Ok(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Access token required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
    }

    /// Collects formatted log lines for the duration of one test
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn rejected_tokens_are_logged_as_warnings_without_the_token() {
        let tokens = TokenService::new("middleware-secret", 1).unwrap();
        let forged = TokenService::new("other-secret", 1)
            .unwrap()
            .issue(Uuid::new_v4(), "farmer1")
            .unwrap();

        let logs = Captured::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        let err = tracing::subscriber::with_default(subscriber, || {
            authenticate(&tokens, &headers(&format!("Bearer {}", forged))).unwrap_err()
        });

        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "Invalid or expired token");
        let text = logs.text();
        assert!(text.contains("WARN"), "{}", text);
        assert!(text.contains("Rejected bearer token"), "{}", text);
        assert!(!text.contains(&forged));
    }

    #[test]
    fn valid_token_resolves_to_its_user() {
        let tokens = TokenService::new("middleware-secret", 1).unwrap();
        let id = Uuid::new_v4();
        let token = tokens.issue(id, "farmer1").unwrap();

        let caller = authenticate(&tokens, &headers(&format!("Bearer {}", token))).unwrap();
        assert_eq!(caller.user_id, id);
        assert_eq!(caller.username, "farmer1");
    }

    #[test]
    fn rejects_missing_or_wrong_scheme() {
        assert!(extract_bearer_token(&HeaderMap::new()).is_err());
        assert!(extract_bearer_token(&headers("Basic dXNlcjpwdw==")).is_err());
        assert!(extract_bearer_token(&headers("Bearer   ")).is_err());
    }
}
