use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Ordered polygon corners as `[latitude, longitude]` pairs.
pub type Boundaries = Vec<[f64; 2]>;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: Uuid,
    pub user_id: Uuid,
    pub crop_id: Option<Uuid>,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Hectares
    pub area: f64,
    pub boundaries: Option<Json<Boundaries>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewField {
    pub user_id: Uuid,
    pub crop_id: Option<Uuid>,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub area: f64,
    pub boundaries: Option<Boundaries>,
}

impl NewField {
    pub fn into_field(self, id: Uuid, now: DateTime<Utc>) -> Field {
        Field {
            id,
            user_id: self.user_id,
            crop_id: self.crop_id,
            name: self.name,
            latitude: self.latitude,
            longitude: self.longitude,
            area: self.area,
            boundaries: self.boundaries.map(Json),
            created_at: now,
        }
    }
}
