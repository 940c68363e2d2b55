use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_GROWTH_STAGE: &str = "seedling";

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Crop {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    /// rice, wheat, cotton, corn, ...
    #[serde(rename = "type")]
    pub crop_type: String,
    pub planted_date: DateTime<Utc>,
    pub expected_harvest_date: DateTime<Utc>,
    pub growth_stage: String,
    /// Hectares
    pub area: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCrop {
    pub user_id: Uuid,
    pub name: String,
    pub crop_type: String,
    pub planted_date: DateTime<Utc>,
    pub expected_harvest_date: DateTime<Utc>,
    pub growth_stage: Option<String>,
    pub area: f64,
    pub is_active: Option<bool>,
}

impl NewCrop {
    pub fn into_crop(self, id: Uuid, now: DateTime<Utc>) -> Crop {
        Crop {
            id,
            user_id: self.user_id,
            name: self.name,
            crop_type: self.crop_type,
            planted_date: self.planted_date,
            expected_harvest_date: self.expected_harvest_date,
            growth_stage: self
                .growth_stage
                .unwrap_or_else(|| DEFAULT_GROWTH_STAGE.to_string()),
            area: self.area,
            is_active: self.is_active.unwrap_or(true),
            created_at: now,
        }
    }
}

/// Partial update; owner, id and creation time are not representable here.
#[derive(Debug, Clone, Default)]
pub struct CropPatch {
    pub name: Option<String>,
    pub crop_type: Option<String>,
    pub planted_date: Option<DateTime<Utc>>,
    pub expected_harvest_date: Option<DateTime<Utc>>,
    pub growth_stage: Option<String>,
    pub area: Option<f64>,
    pub is_active: Option<bool>,
}

impl CropPatch {
    pub fn apply(self, crop: &mut Crop) {
        if let Some(v) = self.name {
            crop.name = v;
        }
        if let Some(v) = self.crop_type {
            crop.crop_type = v;
        }
        if let Some(v) = self.planted_date {
            crop.planted_date = v;
        }
        if let Some(v) = self.expected_harvest_date {
            crop.expected_harvest_date = v;
        }
        if let Some(v) = self.growth_stage {
            crop.growth_stage = v;
        }
        if let Some(v) = self.area {
            crop.area = v;
        }
        if let Some(v) = self.is_active {
            crop.is_active = v;
        }
    }
}
