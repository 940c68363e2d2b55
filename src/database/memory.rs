use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{
    ApplicationStatus, ConnectionType, ContactMessage, Crop, CropPatch, DroneConnection,
    DronePatch, DroneStatus, Field, NewContactMessage, NewCrop, NewDroneConnection, NewField,
    NewPesticideApplication, NewPlantHealthRecord, NewUser, PesticideApplication, PesticidePatch,
    PlantHealthRecord, Severity, User,
};
use crate::database::storage::{Storage, StorageError, StorageResult};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    crops: HashMap<Uuid, Crop>,
    fields: HashMap<Uuid, Field>,
    drones: HashMap<Uuid, DroneConnection>,
    health_records: HashMap<Uuid, PlantHealthRecord>,
    pesticide_applications: HashMap<Uuid, PesticideApplication>,
    contact_messages: HashMap<Uuid, ContactMessage>,
}

impl Tables {
    fn field_ids_of(&self, user_id: Uuid) -> HashSet<Uuid> {
        self.fields
            .values()
            .filter(|f| f.user_id == user_id)
            .map(|f| f.id)
            .collect()
    }
}

/// Process-local backend for development and tests. All state is lost on exit.
#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Demo farm: one farmer with a crop, a mapped field, a drone, a survey
    /// result and a pending pesticide recommendation.
    pub async fn seed_sample_data(&self, password_hash: String) -> StorageResult<User> {
        let user = self
            .create_user(NewUser {
                username: "farmer1".to_string(),
                email: "farmer1@example.com".to_string(),
                password_hash,
                full_name: "Rajesh Kumar".to_string(),
                role: None,
            })
            .await?;

        let planted = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).single().unwrap_or_else(Utc::now);
        let crop = self
            .create_crop(NewCrop {
                user_id: user.id,
                name: "Main Rice Field".to_string(),
                crop_type: "rice".to_string(),
                planted_date: planted,
                expected_harvest_date: planted + Duration::days(158),
                growth_stage: Some("flowering".to_string()),
                area: 2.5,
                is_active: Some(true),
            })
            .await?;

        let field = self
            .create_field(NewField {
                user_id: user.id,
                crop_id: Some(crop.id),
                name: "Punjab Field Zone A".to_string(),
                latitude: 30.5795555,
                longitude: 75.9249285,
                area: 1.2,
                boundaries: Some(vec![
                    [30.577888, 75.921646],
                    [30.581223, 75.921646],
                    [30.581223, 75.928211],
                    [30.577888, 75.928211],
                ]),
            })
            .await?;

        let drone = self
            .create_drone(NewDroneConnection {
                user_id: user.id,
                drone_name: "Drone Alpha-1".to_string(),
                connection_type: ConnectionType::Wifi,
                status: Some(DroneStatus::Connected),
                battery_level: Some(87),
            })
            .await?;

        let record = self
            .create_health_record(NewPlantHealthRecord {
                field_id: field.id,
                drone_id: Some(drone.id),
                health_score: 94,
                infection_rate: 3.2,
                infection_type: Some("aphid".to_string()),
                severity: Severity::Low,
                latitude: Some(30.5798),
                longitude: Some(75.9252),
                detection_confidence: 85,
            })
            .await?;

        self.create_pesticide_application(NewPesticideApplication {
            field_id: field.id,
            health_record_id: Some(record.id),
            pesticide_type: "Neem oil spray".to_string(),
            volume_per_hectare: 2.5,
            total_volume: 3.0,
            application_method: None,
            status: Some(ApplicationStatus::Recommended),
            recommended_by: None,
            confidence: 85,
            scheduled_for: None,
            applied_at: None,
        })
        .await?;

        tracing::info!("Seeded sample farm for '{}'", user.username);
        Ok(user)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> StorageResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        let mut tables = self.tables.write().await;
        // Same guarantee the unique indexes give the Postgres backend
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StorageError::Duplicate("username".to_string()));
        }
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StorageError::Duplicate("email".to_string()));
        }
        let user = user.into_user(Uuid::new_v4(), Utc::now());
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_crops(&self, user_id: Uuid) -> StorageResult<Vec<Crop>> {
        let tables = self.tables.read().await;
        Ok(tables
            .crops
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_crop(&self, id: Uuid) -> StorageResult<Option<Crop>> {
        Ok(self.tables.read().await.crops.get(&id).cloned())
    }

    async fn create_crop(&self, crop: NewCrop) -> StorageResult<Crop> {
        let crop = crop.into_crop(Uuid::new_v4(), Utc::now());
        self.tables.write().await.crops.insert(crop.id, crop.clone());
        Ok(crop)
    }

    async fn update_crop(&self, id: Uuid, patch: CropPatch) -> StorageResult<Option<Crop>> {
        let mut tables = self.tables.write().await;
        Ok(tables.crops.get_mut(&id).map(|crop| {
            patch.apply(crop);
            crop.clone()
        }))
    }

    async fn delete_crop(&self, id: Uuid) -> StorageResult<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.crops.remove(&id).is_some();
        if removed {
            // Mirrors ON DELETE SET NULL on fields.crop_id
            for field in tables.fields.values_mut() {
                if field.crop_id == Some(id) {
                    field.crop_id = None;
                }
            }
        }
        Ok(removed)
    }

    async fn list_fields(&self, user_id: Uuid) -> StorageResult<Vec<Field>> {
        let tables = self.tables.read().await;
        Ok(tables
            .fields
            .values()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_field(&self, id: Uuid) -> StorageResult<Option<Field>> {
        Ok(self.tables.read().await.fields.get(&id).cloned())
    }

    async fn create_field(&self, field: NewField) -> StorageResult<Field> {
        let field = field.into_field(Uuid::new_v4(), Utc::now());
        self.tables.write().await.fields.insert(field.id, field.clone());
        Ok(field)
    }

    async fn list_drones(&self, user_id: Uuid) -> StorageResult<Vec<DroneConnection>> {
        let tables = self.tables.read().await;
        Ok(tables
            .drones
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_drone(&self, id: Uuid) -> StorageResult<Option<DroneConnection>> {
        Ok(self.tables.read().await.drones.get(&id).cloned())
    }

    async fn create_drone(&self, drone: NewDroneConnection) -> StorageResult<DroneConnection> {
        let drone = drone.into_drone(Uuid::new_v4(), Utc::now());
        self.tables.write().await.drones.insert(drone.id, drone.clone());
        Ok(drone)
    }

    async fn update_drone(
        &self,
        id: Uuid,
        patch: DronePatch,
    ) -> StorageResult<Option<DroneConnection>> {
        let mut tables = self.tables.write().await;
        Ok(tables.drones.get_mut(&id).map(|drone| {
            patch.apply(drone, Utc::now());
            drone.clone()
        }))
    }

    async fn list_health_records(&self, user_id: Uuid) -> StorageResult<Vec<PlantHealthRecord>> {
        let tables = self.tables.read().await;
        let field_ids = tables.field_ids_of(user_id);
        Ok(tables
            .health_records
            .values()
            .filter(|r| field_ids.contains(&r.field_id))
            .cloned()
            .collect())
    }

    async fn list_health_records_by_field(
        &self,
        field_id: Uuid,
    ) -> StorageResult<Vec<PlantHealthRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .health_records
            .values()
            .filter(|r| r.field_id == field_id)
            .cloned()
            .collect())
    }

    async fn get_health_record(&self, id: Uuid) -> StorageResult<Option<PlantHealthRecord>> {
        Ok(self.tables.read().await.health_records.get(&id).cloned())
    }

    async fn create_health_record(
        &self,
        record: NewPlantHealthRecord,
    ) -> StorageResult<PlantHealthRecord> {
        let record = record.into_record(Uuid::new_v4(), Utc::now());
        self.tables
            .write()
            .await
            .health_records
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_pesticide_applications(
        &self,
        user_id: Uuid,
    ) -> StorageResult<Vec<PesticideApplication>> {
        let tables = self.tables.read().await;
        let field_ids = tables.field_ids_of(user_id);
        Ok(tables
            .pesticide_applications
            .values()
            .filter(|a| field_ids.contains(&a.field_id))
            .cloned()
            .collect())
    }

    async fn list_pesticide_applications_by_field(
        &self,
        field_id: Uuid,
    ) -> StorageResult<Vec<PesticideApplication>> {
        let tables = self.tables.read().await;
        Ok(tables
            .pesticide_applications
            .values()
            .filter(|a| a.field_id == field_id)
            .cloned()
            .collect())
    }

    async fn get_pesticide_application(
        &self,
        id: Uuid,
    ) -> StorageResult<Option<PesticideApplication>> {
        Ok(self.tables.read().await.pesticide_applications.get(&id).cloned())
    }

    async fn create_pesticide_application(
        &self,
        application: NewPesticideApplication,
    ) -> StorageResult<PesticideApplication> {
        let application = application.into_application(Uuid::new_v4(), Utc::now());
        self.tables
            .write()
            .await
            .pesticide_applications
            .insert(application.id, application.clone());
        Ok(application)
    }

    async fn update_pesticide_application(
        &self,
        id: Uuid,
        patch: PesticidePatch,
    ) -> StorageResult<Option<PesticideApplication>> {
        let mut tables = self.tables.write().await;
        Ok(tables.pesticide_applications.get_mut(&id).map(|app| {
            patch.apply(app);
            app.clone()
        }))
    }

    async fn create_contact_message(
        &self,
        message: NewContactMessage,
    ) -> StorageResult<ContactMessage> {
        let message = message.into_message(Uuid::new_v4(), Utc::now());
        self.tables
            .write()
            .await
            .contact_messages
            .insert(message.id, message.clone());
        Ok(message)
    }
}
