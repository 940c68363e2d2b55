// handlers/protected/pesticide_applications.rs - /api/pesticide-applications handlers

use axum::extract::{Path, Query, State};
use serde_json::{Map, Value};

use super::health_records::FieldQuery;
use super::utils::{
    application_access, field_access, health_record_access, parse_id, APPLICATION, FIELD,
    HEALTH_RECORD,
};
use crate::app::AppState;
use crate::database::models::PesticideApplication;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::validation;

/// GET /api/pesticide-applications[?fieldId=<id>]
pub async fn applications_get(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<FieldQuery>,
) -> ApiResult<Vec<PesticideApplication>> {
    let storage = state.storage.as_ref();

    let applications = match validation::field_filter(query.field_id.as_deref())? {
        Some(field_id) => {
            field_access(storage, &caller, field_id)
                .await?
                .resource(FIELD, "view")?;
            storage.list_pesticide_applications_by_field(field_id).await?
        }
        None => storage.list_pesticide_applications(caller.user_id).await?,
    };
    Ok(ApiResponse::success(applications))
}

/// POST /api/pesticide-applications - Record a recommendation or treatment
///
/// Expected Input:
/// ```json
/// {
///   "fieldId": "0b7e...",
///   "healthRecordId": "91c4...",
///   "pesticideType": "Neem oil spray",
///   "volumePerHectare": 2.5,
///   "totalVolume": 3.0,
///   "confidence": 85
/// }
/// ```
///
/// A `healthRecordId` must be a record on one of the caller's fields.
pub async fn applications_post(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> ApiResult<PesticideApplication> {
    let application = validation::new_pesticide_application(&body)?;
    let storage = state.storage.as_ref();

    field_access(storage, &caller, application.field_id)
        .await?
        .reference(FIELD, "fieldId")?;
    if let Some(record_id) = application.health_record_id {
        health_record_access(storage, &caller, record_id)
            .await?
            .reference(HEALTH_RECORD, "healthRecordId")?;
    }

    let application = storage.create_pesticide_application(application).await?;
    Ok(ApiResponse::created(application))
}

/// GET /api/pesticide-applications/:id
pub async fn application_get(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<PesticideApplication> {
    let id = parse_id(&id, APPLICATION)?;
    let application = application_access(state.storage.as_ref(), &caller, id)
        .await?
        .resource(APPLICATION, "view")?;
    Ok(ApiResponse::success(application))
}

/// PUT /api/pesticide-applications/:id - Status transition or reschedule
///
/// Expected Input:
/// ```json
/// { "status": "applied", "appliedAt": "2024-05-01T08:00:00Z", "scheduledFor": null }
/// ```
///
/// The owning field and health record cannot be changed.
pub async fn application_put(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> ApiResult<PesticideApplication> {
    let id = parse_id(&id, APPLICATION)?;
    application_access(state.storage.as_ref(), &caller, id)
        .await?
        .resource(APPLICATION, "update")?;

    let patch = validation::pesticide_patch(&body)?;
    let application = state
        .storage
        .update_pesticide_application(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Application not found"))?;
    Ok(ApiResponse::success(application))
}
