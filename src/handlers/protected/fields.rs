// handlers/protected/fields.rs - /api/fields handlers

use axum::extract::{Path, State};
use serde_json::{Map, Value};

use super::utils::{crop_access, field_access, parse_id, CROP, FIELD};
use crate::app::AppState;
use crate::database::models::Field;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::validation;

/// GET /api/fields - Caller's fields
pub async fn fields_get(State(state): State<AppState>, caller: AuthUser) -> ApiResult<Vec<Field>> {
    let fields = state.storage.list_fields(caller.user_id).await?;
    Ok(ApiResponse::success(fields))
}

/// POST /api/fields - Map a new field
///
/// Expected Input:
/// ```json
/// {
///   "name": "Punjab Field Zone A",
///   "cropId": "6f1c...",
///   "latitude": 30.5795,
///   "longitude": 75.9249,
///   "area": 1.2,
///   "boundaries": [[30.5779, 75.9216], [30.5812, 75.9216], [30.5812, 75.9282]]
/// }
/// ```
///
/// A `cropId` must name one of the caller's crops.
pub async fn fields_post(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> ApiResult<Field> {
    let field = validation::new_field(&body, caller.user_id)?;
    if let Some(crop_id) = field.crop_id {
        crop_access(state.storage.as_ref(), &caller, crop_id)
            .await?
            .reference(CROP, "cropId")?;
    }

    let field = state.storage.create_field(field).await?;
    Ok(ApiResponse::created(field))
}

/// GET /api/fields/:id
pub async fn field_get(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Field> {
    let id = parse_id(&id, FIELD)?;
    let field = field_access(state.storage.as_ref(), &caller, id)
        .await?
        .resource(FIELD, "view")?;
    Ok(ApiResponse::success(field))
}
