// handlers/protected/health_records.rs - /api/health-records handlers
//
// Health records carry no owner column; they belong to whoever owns the
// field they were recorded on.

use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::utils::{
    drone_access, field_access, health_record_access, parse_id, DRONE, FIELD, HEALTH_RECORD,
};
use crate::app::AppState;
use crate::database::models::PlantHealthRecord;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::validation;

/// `?fieldId=` filter shared by list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct FieldQuery {
    #[serde(rename = "fieldId")]
    pub field_id: Option<String>,
}

/// GET /api/health-records[?fieldId=<id>]
///
/// Without a filter, every record on the caller's fields. With one, the
/// field must exist and be the caller's.
pub async fn records_get(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<FieldQuery>,
) -> ApiResult<Vec<PlantHealthRecord>> {
    let storage = state.storage.as_ref();

    let records = match validation::field_filter(query.field_id.as_deref())? {
        Some(field_id) => {
            field_access(storage, &caller, field_id)
                .await?
                .resource(FIELD, "view")?;
            storage.list_health_records_by_field(field_id).await?
        }
        None => storage.list_health_records(caller.user_id).await?,
    };
    Ok(ApiResponse::success(records))
}

/// POST /api/health-records - Store a drone survey result
///
/// Expected Input:
/// ```json
/// {
///   "fieldId": "0b7e...",
///   "droneId": "5d2a...",
///   "healthScore": 94,
///   "infectionRate": 3.2,
///   "infectionType": "aphid",
///   "severity": "low",
///   "detectionConfidence": 85
/// }
/// ```
pub async fn records_post(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> ApiResult<PlantHealthRecord> {
    let record = validation::new_health_record(&body)?;
    let storage = state.storage.as_ref();

    field_access(storage, &caller, record.field_id)
        .await?
        .reference(FIELD, "fieldId")?;
    if let Some(drone_id) = record.drone_id {
        drone_access(storage, &caller, drone_id)
            .await?
            .reference(DRONE, "droneId")?;
    }

    let record = storage.create_health_record(record).await?;
    Ok(ApiResponse::created(record))
}

/// GET /api/health-records/:id
pub async fn record_get(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<PlantHealthRecord> {
    let id = parse_id(&id, HEALTH_RECORD)?;
    let record = health_record_access(state.storage.as_ref(), &caller, id)
        .await?
        .resource(HEALTH_RECORD, "view")?;
    Ok(ApiResponse::success(record))
}
