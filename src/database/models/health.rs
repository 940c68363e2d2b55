use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

text_enum!(Severity {
    Low => "low",
    Medium => "medium",
    High => "high",
});

/// Drone survey result for one field. Owned through `field_id`.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlantHealthRecord {
    pub id: Uuid,
    pub field_id: Uuid,
    pub drone_id: Option<Uuid>,
    pub health_score: i32,
    /// Percent of surveyed plants showing infection
    pub infection_rate: f64,
    /// aphid, fungal, bacterial, ...
    pub infection_type: Option<String>,
    pub severity: Severity,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub detection_confidence: i32,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPlantHealthRecord {
    pub field_id: Uuid,
    pub drone_id: Option<Uuid>,
    pub health_score: i32,
    pub infection_rate: f64,
    pub infection_type: Option<String>,
    pub severity: Severity,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub detection_confidence: i32,
}

impl NewPlantHealthRecord {
    pub fn into_record(self, id: Uuid, now: DateTime<Utc>) -> PlantHealthRecord {
        PlantHealthRecord {
            id,
            field_id: self.field_id,
            drone_id: self.drone_id,
            health_score: self.health_score,
            infection_rate: self.infection_rate,
            infection_type: self.infection_type,
            severity: self.severity,
            latitude: self.latitude,
            longitude: self.longitude,
            detection_confidence: self.detection_confidence,
            recorded_at: now,
        }
    }
}
