use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::TokenService;
use crate::config::{AppConfig, ConfigError};
use crate::database::Storage;
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::require_auth;

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub tokens: TokenService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, config: AppConfig) -> Result<Self, ConfigError> {
        let tokens = TokenService::new(&config.jwt_secret()?, config.security.jwt_expiry_hours)?;
        Ok(Self {
            storage,
            tokens,
            config: Arc::new(config),
        })
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.config.security.bcrypt_cost
    }
}

pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Everything else requires a bearer token
        .merge(protected_routes(state.clone()))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security.cors_origins));
    }

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(public::auth::signup_post))
        .route("/api/auth/login", post(public::auth::login_post))
        .route("/api/contact", post(public::contact::contact_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{crops, dashboard, drones, fields, health_records, pesticide_applications};

    Router::new()
        .route("/api/auth/me", get(protected::auth::me_get))
        .route("/api/crops", get(crops::crops_get).post(crops::crops_post))
        .route(
            "/api/crops/:id",
            get(crops::crop_get)
                .put(crops::crop_put)
                .delete(crops::crop_delete),
        )
        .route("/api/fields", get(fields::fields_get).post(fields::fields_post))
        .route("/api/fields/:id", get(fields::field_get))
        .route("/api/drones", get(drones::drones_get).post(drones::drones_post))
        .route("/api/drones/:id", get(drones::drone_get).put(drones::drone_put))
        .route(
            "/api/health-records",
            get(health_records::records_get).post(health_records::records_post),
        )
        .route("/api/health-records/:id", get(health_records::record_get))
        .route(
            "/api/pesticide-applications",
            get(pesticide_applications::applications_get)
                .post(pesticide_applications::applications_post),
        )
        .route(
            "/api/pesticide-applications/:id",
            get(pesticide_applications::application_get)
                .put(pesticide_applications::application_put),
        )
        .route("/api/dashboard/stats", get(dashboard::stats_get))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "CropWatch API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Crop, field, drone and plant health tracking for farmers",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/api/auth/signup, /api/auth/login (public), /api/auth/me (protected)",
                "contact": "/api/contact (public)",
                "crops": "/api/crops[/:id] (protected)",
                "fields": "/api/fields[/:id] (protected)",
                "drones": "/api/drones[/:id] (protected)",
                "health_records": "/api/health-records[/:id] (protected)",
                "pesticide_applications": "/api/pesticide-applications[/:id] (protected)",
                "dashboard": "/api/dashboard/stats (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.storage.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "storage": state.storage.name()
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "storage unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "storage": state.storage.name()
                    }
                })),
            )
        }
    }
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
