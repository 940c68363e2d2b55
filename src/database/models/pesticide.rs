use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_APPLICATION_METHOD: &str = "drone";
pub const DEFAULT_RECOMMENDED_BY: &str = "ai_system";

text_enum!(ApplicationStatus {
    Recommended => "recommended",
    Scheduled => "scheduled",
    Applied => "applied",
    Completed => "completed",
});

impl Default for ApplicationStatus {
    fn default() -> Self {
        ApplicationStatus::Recommended
    }
}

impl ApplicationStatus {
    /// Not yet carried out
    pub fn is_pending(&self) -> bool {
        matches!(self, ApplicationStatus::Recommended | ApplicationStatus::Scheduled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PesticideApplication {
    pub id: Uuid,
    pub field_id: Uuid,
    pub health_record_id: Option<Uuid>,
    pub pesticide_type: String,
    /// Liters
    pub volume_per_hectare: f64,
    /// Liters
    pub total_volume: f64,
    pub application_method: String,
    pub status: ApplicationStatus,
    pub recommended_by: String,
    pub confidence: i32,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPesticideApplication {
    pub field_id: Uuid,
    pub health_record_id: Option<Uuid>,
    pub pesticide_type: String,
    pub volume_per_hectare: f64,
    pub total_volume: f64,
    pub application_method: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub recommended_by: Option<String>,
    pub confidence: i32,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub applied_at: Option<DateTime<Utc>>,
}

impl NewPesticideApplication {
    pub fn into_application(self, id: Uuid, now: DateTime<Utc>) -> PesticideApplication {
        PesticideApplication {
            id,
            field_id: self.field_id,
            health_record_id: self.health_record_id,
            pesticide_type: self.pesticide_type,
            volume_per_hectare: self.volume_per_hectare,
            total_volume: self.total_volume,
            application_method: self
                .application_method
                .unwrap_or_else(|| DEFAULT_APPLICATION_METHOD.to_string()),
            status: self.status.unwrap_or_default(),
            recommended_by: self
                .recommended_by
                .unwrap_or_else(|| DEFAULT_RECOMMENDED_BY.to_string()),
            confidence: self.confidence,
            scheduled_for: self.scheduled_for,
            applied_at: self.applied_at,
            created_at: now,
        }
    }
}

/// Partial update. The nested options on timestamps distinguish
/// "leave alone" (`None`) from "clear" (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct PesticidePatch {
    pub pesticide_type: Option<String>,
    pub volume_per_hectare: Option<f64>,
    pub total_volume: Option<f64>,
    pub application_method: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub recommended_by: Option<String>,
    pub confidence: Option<i32>,
    pub scheduled_for: Option<Option<DateTime<Utc>>>,
    pub applied_at: Option<Option<DateTime<Utc>>>,
}

impl PesticidePatch {
    pub fn apply(self, app: &mut PesticideApplication) {
        if let Some(v) = self.pesticide_type {
            app.pesticide_type = v;
        }
        if let Some(v) = self.volume_per_hectare {
            app.volume_per_hectare = v;
        }
        if let Some(v) = self.total_volume {
            app.total_volume = v;
        }
        if let Some(v) = self.application_method {
            app.application_method = v;
        }
        if let Some(v) = self.status {
            app.status = v;
        }
        if let Some(v) = self.recommended_by {
            app.recommended_by = v;
        }
        if let Some(v) = self.confidence {
            app.confidence = v;
        }
        if let Some(v) = self.scheduled_for {
            app.scheduled_for = v;
        }
        if let Some(v) = self.applied_at {
            app.applied_at = v;
        }
    }
}
