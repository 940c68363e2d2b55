use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{
    ContactMessage, Crop, CropPatch, DroneConnection, DronePatch, Field, NewContactMessage,
    NewCrop, NewDroneConnection, NewField, NewPesticideApplication, NewPlantHealthRecord, NewUser,
    PesticideApplication, PesticidePatch, PlantHealthRecord, User,
};

/// Errors from a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    /// A unique column (username, email) already holds the value
    #[error("duplicate value for {0}")]
    Duplicate(String),

    #[error("connection pool error: {0}")]
    Pool(#[source] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                let column = match db.constraint() {
                    Some(c) if c.contains("email") => "email",
                    Some(c) if c.contains("username") => "username",
                    _ => "unique key",
                };
                StorageError::Duplicate(column.to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StorageError::Pool(err)
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StorageError::Corrupt(err.to_string())
            }
            other => StorageError::Sqlx(other),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Uniform data-access contract over every entity.
///
/// Creates assign the id and creation timestamp; lookups report absence as
/// `Ok(None)`; updates merge a patch and return `Ok(None)` when the id is
/// unknown; deletes return whether a row was removed. No method validates
/// input or checks ownership, callers do both before reaching this layer.
/// List ordering is unspecified.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Backend name for logs and the health endpoint
    fn name(&self) -> &'static str;

    async fn ping(&self) -> StorageResult<()>;

    // Users
    async fn get_user(&self, id: Uuid) -> StorageResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> StorageResult<User>;

    // Crops
    async fn list_crops(&self, user_id: Uuid) -> StorageResult<Vec<Crop>>;
    async fn get_crop(&self, id: Uuid) -> StorageResult<Option<Crop>>;
    async fn create_crop(&self, crop: NewCrop) -> StorageResult<Crop>;
    async fn update_crop(&self, id: Uuid, patch: CropPatch) -> StorageResult<Option<Crop>>;
    async fn delete_crop(&self, id: Uuid) -> StorageResult<bool>;

    // Fields
    async fn list_fields(&self, user_id: Uuid) -> StorageResult<Vec<Field>>;
    async fn get_field(&self, id: Uuid) -> StorageResult<Option<Field>>;
    async fn create_field(&self, field: NewField) -> StorageResult<Field>;

    // Drones
    async fn list_drones(&self, user_id: Uuid) -> StorageResult<Vec<DroneConnection>>;
    async fn get_drone(&self, id: Uuid) -> StorageResult<Option<DroneConnection>>;
    async fn create_drone(&self, drone: NewDroneConnection) -> StorageResult<DroneConnection>;
    /// Also refreshes `last_seen`
    async fn update_drone(
        &self,
        id: Uuid,
        patch: DronePatch,
    ) -> StorageResult<Option<DroneConnection>>;

    // Plant health
    async fn list_health_records(&self, user_id: Uuid) -> StorageResult<Vec<PlantHealthRecord>>;
    async fn list_health_records_by_field(
        &self,
        field_id: Uuid,
    ) -> StorageResult<Vec<PlantHealthRecord>>;
    async fn get_health_record(&self, id: Uuid) -> StorageResult<Option<PlantHealthRecord>>;
    async fn create_health_record(
        &self,
        record: NewPlantHealthRecord,
    ) -> StorageResult<PlantHealthRecord>;

    // Pesticide applications
    async fn list_pesticide_applications(
        &self,
        user_id: Uuid,
    ) -> StorageResult<Vec<PesticideApplication>>;
    async fn list_pesticide_applications_by_field(
        &self,
        field_id: Uuid,
    ) -> StorageResult<Vec<PesticideApplication>>;
    async fn get_pesticide_application(
        &self,
        id: Uuid,
    ) -> StorageResult<Option<PesticideApplication>>;
    async fn create_pesticide_application(
        &self,
        application: NewPesticideApplication,
    ) -> StorageResult<PesticideApplication>;
    async fn update_pesticide_application(
        &self,
        id: Uuid,
        patch: PesticidePatch,
    ) -> StorageResult<Option<PesticideApplication>>;

    // Contact
    async fn create_contact_message(
        &self,
        message: NewContactMessage,
    ) -> StorageResult<ContactMessage>;
}
