use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{
    ContactMessage, Crop, CropPatch, DroneConnection, DronePatch, Field, NewContactMessage,
    NewCrop, NewDroneConnection, NewField, NewPesticideApplication, NewPlantHealthRecord, NewUser,
    PesticideApplication, PesticidePatch, PlantHealthRecord, User,
};
use crate::database::storage::{Storage, StorageResult};

/// Postgres backend. Ids and timestamps are assigned here rather than by
/// column defaults so both backends produce identical records.
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl Storage for PgStorage {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        let user = user.into_user(Uuid::new_v4(), Utc::now());
        // Unique violations surface as StorageError::Duplicate
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash, full_name, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.role)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_crops(&self, user_id: Uuid) -> StorageResult<Vec<Crop>> {
        let crops = sqlx::query_as::<_, Crop>(
            "SELECT * FROM crops WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(crops)
    }

    async fn get_crop(&self, id: Uuid) -> StorageResult<Option<Crop>> {
        let crop = sqlx::query_as::<_, Crop>("SELECT * FROM crops WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(crop)
    }

    async fn create_crop(&self, crop: NewCrop) -> StorageResult<Crop> {
        let crop = crop.into_crop(Uuid::new_v4(), Utc::now());
        let crop = sqlx::query_as::<_, Crop>(
            r#"
            INSERT INTO crops (id, user_id, name, crop_type, planted_date, expected_harvest_date,
                               growth_stage, area, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(crop.id)
        .bind(crop.user_id)
        .bind(&crop.name)
        .bind(&crop.crop_type)
        .bind(crop.planted_date)
        .bind(crop.expected_harvest_date)
        .bind(&crop.growth_stage)
        .bind(crop.area)
        .bind(crop.is_active)
        .bind(crop.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(crop)
    }

    async fn update_crop(&self, id: Uuid, patch: CropPatch) -> StorageResult<Option<Crop>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Crop>("SELECT * FROM crops WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(mut crop) = current else {
            return Ok(None);
        };
        patch.apply(&mut crop);

        let crop = sqlx::query_as::<_, Crop>(
            r#"
            UPDATE crops
            SET name = $2, crop_type = $3, planted_date = $4, expected_harvest_date = $5,
                growth_stage = $6, area = $7, is_active = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(crop.id)
        .bind(&crop.name)
        .bind(&crop.crop_type)
        .bind(crop.planted_date)
        .bind(crop.expected_harvest_date)
        .bind(&crop.growth_stage)
        .bind(crop.area)
        .bind(crop.is_active)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(crop))
    }

    async fn delete_crop(&self, id: Uuid) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM crops WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_fields(&self, user_id: Uuid) -> StorageResult<Vec<Field>> {
        let fields = sqlx::query_as::<_, Field>(
            "SELECT * FROM fields WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(fields)
    }

    async fn get_field(&self, id: Uuid) -> StorageResult<Option<Field>> {
        let field = sqlx::query_as::<_, Field>("SELECT * FROM fields WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(field)
    }

    async fn create_field(&self, field: NewField) -> StorageResult<Field> {
        let field = field.into_field(Uuid::new_v4(), Utc::now());
        let field = sqlx::query_as::<_, Field>(
            r#"
            INSERT INTO fields (id, user_id, crop_id, name, latitude, longitude, area,
                                boundaries, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(field.id)
        .bind(field.user_id)
        .bind(field.crop_id)
        .bind(&field.name)
        .bind(field.latitude)
        .bind(field.longitude)
        .bind(field.area)
        .bind(&field.boundaries)
        .bind(field.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(field)
    }

    async fn list_drones(&self, user_id: Uuid) -> StorageResult<Vec<DroneConnection>> {
        let drones = sqlx::query_as::<_, DroneConnection>(
            "SELECT * FROM drone_connections WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(drones)
    }

    async fn get_drone(&self, id: Uuid) -> StorageResult<Option<DroneConnection>> {
        let drone =
            sqlx::query_as::<_, DroneConnection>("SELECT * FROM drone_connections WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(drone)
    }

    async fn create_drone(&self, drone: NewDroneConnection) -> StorageResult<DroneConnection> {
        let drone = drone.into_drone(Uuid::new_v4(), Utc::now());
        let drone = sqlx::query_as::<_, DroneConnection>(
            r#"
            INSERT INTO drone_connections (id, user_id, drone_name, connection_type, status,
                                           battery_level, last_seen, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(drone.id)
        .bind(drone.user_id)
        .bind(&drone.drone_name)
        .bind(drone.connection_type)
        .bind(drone.status)
        .bind(drone.battery_level)
        .bind(drone.last_seen)
        .bind(drone.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(drone)
    }

    async fn update_drone(
        &self,
        id: Uuid,
        patch: DronePatch,
    ) -> StorageResult<Option<DroneConnection>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, DroneConnection>(
            "SELECT * FROM drone_connections WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(mut drone) = current else {
            return Ok(None);
        };
        patch.apply(&mut drone, Utc::now());

        let drone = sqlx::query_as::<_, DroneConnection>(
            r#"
            UPDATE drone_connections
            SET drone_name = $2, connection_type = $3, status = $4, battery_level = $5,
                last_seen = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(drone.id)
        .bind(&drone.drone_name)
        .bind(drone.connection_type)
        .bind(drone.status)
        .bind(drone.battery_level)
        .bind(drone.last_seen)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(drone))
    }

    async fn list_health_records(&self, user_id: Uuid) -> StorageResult<Vec<PlantHealthRecord>> {
        let records = sqlx::query_as::<_, PlantHealthRecord>(
            r#"
            SELECT r.* FROM plant_health_records r
            JOIN fields f ON f.id = r.field_id
            WHERE f.user_id = $1
            ORDER BY r.recorded_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn list_health_records_by_field(
        &self,
        field_id: Uuid,
    ) -> StorageResult<Vec<PlantHealthRecord>> {
        let records = sqlx::query_as::<_, PlantHealthRecord>(
            "SELECT * FROM plant_health_records WHERE field_id = $1 ORDER BY recorded_at",
        )
        .bind(field_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn get_health_record(&self, id: Uuid) -> StorageResult<Option<PlantHealthRecord>> {
        let record = sqlx::query_as::<_, PlantHealthRecord>(
            "SELECT * FROM plant_health_records WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn create_health_record(
        &self,
        record: NewPlantHealthRecord,
    ) -> StorageResult<PlantHealthRecord> {
        let record = record.into_record(Uuid::new_v4(), Utc::now());
        let record = sqlx::query_as::<_, PlantHealthRecord>(
            r#"
            INSERT INTO plant_health_records (id, field_id, drone_id, health_score, infection_rate,
                                              infection_type, severity, latitude, longitude,
                                              detection_confidence, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(record.id)
        .bind(record.field_id)
        .bind(record.drone_id)
        .bind(record.health_score)
        .bind(record.infection_rate)
        .bind(&record.infection_type)
        .bind(record.severity)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(record.detection_confidence)
        .bind(record.recorded_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    async fn list_pesticide_applications(
        &self,
        user_id: Uuid,
    ) -> StorageResult<Vec<PesticideApplication>> {
        let applications = sqlx::query_as::<_, PesticideApplication>(
            r#"
            SELECT a.* FROM pesticide_applications a
            JOIN fields f ON f.id = a.field_id
            WHERE f.user_id = $1
            ORDER BY a.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(applications)
    }

    async fn list_pesticide_applications_by_field(
        &self,
        field_id: Uuid,
    ) -> StorageResult<Vec<PesticideApplication>> {
        let applications = sqlx::query_as::<_, PesticideApplication>(
            "SELECT * FROM pesticide_applications WHERE field_id = $1 ORDER BY created_at",
        )
        .bind(field_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(applications)
    }

    async fn get_pesticide_application(
        &self,
        id: Uuid,
    ) -> StorageResult<Option<PesticideApplication>> {
        let application = sqlx::query_as::<_, PesticideApplication>(
            "SELECT * FROM pesticide_applications WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(application)
    }

    async fn create_pesticide_application(
        &self,
        application: NewPesticideApplication,
    ) -> StorageResult<PesticideApplication> {
        let app = application.into_application(Uuid::new_v4(), Utc::now());
        let app = sqlx::query_as::<_, PesticideApplication>(
            r#"
            INSERT INTO pesticide_applications (id, field_id, health_record_id, pesticide_type,
                                                volume_per_hectare, total_volume,
                                                application_method, status, recommended_by,
                                                confidence, scheduled_for, applied_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(app.id)
        .bind(app.field_id)
        .bind(app.health_record_id)
        .bind(&app.pesticide_type)
        .bind(app.volume_per_hectare)
        .bind(app.total_volume)
        .bind(&app.application_method)
        .bind(app.status)
        .bind(&app.recommended_by)
        .bind(app.confidence)
        .bind(app.scheduled_for)
        .bind(app.applied_at)
        .bind(app.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(app)
    }

    async fn update_pesticide_application(
        &self,
        id: Uuid,
        patch: PesticidePatch,
    ) -> StorageResult<Option<PesticideApplication>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, PesticideApplication>(
            "SELECT * FROM pesticide_applications WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(mut app) = current else {
            return Ok(None);
        };
        patch.apply(&mut app);

        let app = sqlx::query_as::<_, PesticideApplication>(
            r#"
            UPDATE pesticide_applications
            SET pesticide_type = $2, volume_per_hectare = $3, total_volume = $4,
                application_method = $5, status = $6, recommended_by = $7, confidence = $8,
                scheduled_for = $9, applied_at = $10
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(app.id)
        .bind(&app.pesticide_type)
        .bind(app.volume_per_hectare)
        .bind(app.total_volume)
        .bind(&app.application_method)
        .bind(app.status)
        .bind(&app.recommended_by)
        .bind(app.confidence)
        .bind(app.scheduled_for)
        .bind(app.applied_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(app))
    }

    async fn create_contact_message(
        &self,
        message: NewContactMessage,
    ) -> StorageResult<ContactMessage> {
        let message = message.into_message(Uuid::new_v4(), Utc::now());
        let message = sqlx::query_as::<_, ContactMessage>(
            r#"
            INSERT INTO contact_messages (id, name, email, message, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(message.id)
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.message)
        .bind(&message.status)
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }
}
