// handlers/protected/crops.rs - /api/crops handlers
//
// Crops belong directly to a user. Reads, updates and deletes by id all run
// the same existence-then-ownership check.

use axum::extract::{Path, State};
use serde::Serialize;
use serde_json::{Map, Value};

use super::utils::{crop_access, parse_id, CROP};
use crate::app::AppState;
use crate::database::models::Crop;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::validation;

/// GET /api/crops - Caller's crops
pub async fn crops_get(State(state): State<AppState>, caller: AuthUser) -> ApiResult<Vec<Crop>> {
    let crops = state.storage.list_crops(caller.user_id).await?;
    Ok(ApiResponse::success(crops))
}

/// POST /api/crops - Create a crop owned by the caller
///
/// Expected Input:
/// ```json
/// {
///   "name": "Main Rice Field",
///   "type": "rice",
///   "plantedDate": "2024-03-15",
///   "expectedHarvestDate": "2024-08-20",
///   "area": "2.5",
///   "growthStage": "seedling"
/// }
/// ```
///
/// `area` may be a numeric string. Any `userId` in the body is ignored.
pub async fn crops_post(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> ApiResult<Crop> {
    let crop = validation::new_crop(&body, caller.user_id)?;
    let crop = state.storage.create_crop(crop).await?;
    Ok(ApiResponse::created(crop))
}

/// GET /api/crops/:id
pub async fn crop_get(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Crop> {
    let id = parse_id(&id, CROP)?;
    let crop = crop_access(state.storage.as_ref(), &caller, id)
        .await?
        .resource(CROP, "view")?;
    Ok(ApiResponse::success(crop))
}

/// PUT /api/crops/:id - Partial update
///
/// Only the listed crop columns may appear in the body; `userId`, `id` and
/// `createdAt` are rejected.
pub async fn crop_put(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> ApiResult<Crop> {
    let id = parse_id(&id, CROP)?;
    crop_access(state.storage.as_ref(), &caller, id)
        .await?
        .resource(CROP, "update")?;

    let patch = validation::crop_patch(&body)?;
    let crop = state
        .storage
        .update_crop(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Crop not found"))?;
    Ok(ApiResponse::success(crop))
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub message: &'static str,
}

/// DELETE /api/crops/:id
pub async fn crop_delete(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let id = parse_id(&id, CROP)?;
    crop_access(state.storage.as_ref(), &caller, id)
        .await?
        .resource(CROP, "delete")?;

    if !state.storage.delete_crop(id).await? {
        return Err(ApiError::not_found("Crop not found"));
    }
    tracing::info!("User {} deleted crop {}", caller.user_id, id);
    Ok(ApiResponse::success(Deleted {
        message: "Crop deleted successfully",
    }))
}
