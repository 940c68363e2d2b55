// handlers/protected/drones.rs - /api/drones handlers

use axum::extract::{Path, State};
use serde_json::{Map, Value};

use super::utils::{drone_access, parse_id, DRONE};
use crate::app::AppState;
use crate::database::models::DroneConnection;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::validation;

/// GET /api/drones - Caller's drone connections
pub async fn drones_get(
    State(state): State<AppState>,
    caller: AuthUser,
) -> ApiResult<Vec<DroneConnection>> {
    let drones = state.storage.list_drones(caller.user_id).await?;
    Ok(ApiResponse::success(drones))
}

/// POST /api/drones - Register a drone
///
/// Expected Input:
/// ```json
/// { "droneName": "Drone Alpha-1", "connectionType": "wifi", "batteryLevel": 87 }
/// ```
pub async fn drones_post(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> ApiResult<DroneConnection> {
    let drone = validation::new_drone(&body, caller.user_id)?;
    let drone = state.storage.create_drone(drone).await?;
    Ok(ApiResponse::created(drone))
}

/// GET /api/drones/:id
pub async fn drone_get(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<DroneConnection> {
    let id = parse_id(&id, DRONE)?;
    let drone = drone_access(state.storage.as_ref(), &caller, id)
        .await?
        .resource(DRONE, "view")?;
    Ok(ApiResponse::success(drone))
}

/// PUT /api/drones/:id - Status, battery or name change
///
/// Every successful update also refreshes `lastSeen`.
pub async fn drone_put(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> ApiResult<DroneConnection> {
    let id = parse_id(&id, DRONE)?;
    drone_access(state.storage.as_ref(), &caller, id)
        .await?
        .resource(DRONE, "update")?;

    let patch = validation::drone_patch(&body)?;
    let drone = state
        .storage
        .update_drone(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Drone not found"))?;
    Ok(ApiResponse::success(drone))
}
