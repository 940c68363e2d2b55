// handlers/protected/utils.rs - Ownership checks shared by protected handlers
//
// Every owned record resolves to a user either directly (crops, fields,
// drones) or through its field (health records, pesticide applications).
// Lookups always check existence before ownership, so a caller probing
// another user's ids sees 404 for ids that do not exist and 403 for ids that do.

use uuid::Uuid;

use crate::database::models::{Crop, DroneConnection, Field, PesticideApplication, PlantHealthRecord};
use crate::database::{Storage, StorageResult};
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Display names for one kind of owned record
#[derive(Debug, Clone, Copy)]
pub struct Kind {
    pub name: &'static str,
    pub plural: &'static str,
}

pub const CROP: Kind = Kind { name: "Crop", plural: "crops" };
pub const FIELD: Kind = Kind { name: "Field", plural: "fields" };
pub const DRONE: Kind = Kind { name: "Drone", plural: "drones" };
pub const HEALTH_RECORD: Kind = Kind { name: "Health record", plural: "health records" };
pub const APPLICATION: Kind = Kind { name: "Application", plural: "pesticide applications" };

/// Outcome of resolving an id on behalf of a caller
#[derive(Debug)]
pub enum Access<T> {
    Missing,
    Foreign,
    Owned(T),
}

impl<T> Access<T> {
    fn check(record: Option<T>, owner: impl FnOnce(&T) -> Uuid, caller: &AuthUser) -> Self {
        match record {
            None => Access::Missing,
            Some(r) if owner(&r) != caller.user_id => Access::Foreign,
            Some(r) => Access::Owned(r),
        }
    }

    /// The record named in the URL: 404 when missing, 403 when someone else's
    pub fn resource(self, kind: Kind, action: &str) -> Result<T, ApiError> {
        match self {
            Access::Owned(r) => Ok(r),
            Access::Missing => Err(ApiError::not_found(format!("{} not found", kind.name))),
            Access::Foreign => Err(ApiError::forbidden(format!(
                "You can only {} your own {}",
                action, kind.plural
            ))),
        }
    }

    /// A record referenced from a request body: a missing id is a
    /// validation error on `key`, someone else's is 403
    pub fn reference(self, kind: Kind, key: &str) -> Result<T, ApiError> {
        match self {
            Access::Owned(r) => Ok(r),
            Access::Missing => Err(ApiError::field_error(
                key,
                format!("{} does not exist", kind.name.to_lowercase()),
            )),
            Access::Foreign => Err(ApiError::forbidden(format!(
                "You can only use your own {}",
                kind.plural
            ))),
        }
    }
}

fn logged<T>(access: Access<T>, caller: &AuthUser, kind: Kind, id: Uuid) -> Access<T> {
    if let Access::Foreign = access {
        tracing::warn!(
            caller = %caller.user_id,
            resource = kind.name,
            id = %id,
            "Ownership check failed"
        );
    }
    access
}

/// Path ids that are not UUIDs cannot name any record
pub fn parse_id(raw: &str, kind: Kind) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(format!("{} not found", kind.name)))
}

pub async fn crop_access(
    storage: &dyn Storage,
    caller: &AuthUser,
    id: Uuid,
) -> StorageResult<Access<Crop>> {
    let access = Access::check(storage.get_crop(id).await?, |c| c.user_id, caller);
    Ok(logged(access, caller, CROP, id))
}

pub async fn field_access(
    storage: &dyn Storage,
    caller: &AuthUser,
    id: Uuid,
) -> StorageResult<Access<Field>> {
    let access = Access::check(storage.get_field(id).await?, |f| f.user_id, caller);
    Ok(logged(access, caller, FIELD, id))
}

pub async fn drone_access(
    storage: &dyn Storage,
    caller: &AuthUser,
    id: Uuid,
) -> StorageResult<Access<DroneConnection>> {
    let access = Access::check(storage.get_drone(id).await?, |d| d.user_id, caller);
    Ok(logged(access, caller, DRONE, id))
}

/// Owner of a field, or None when the field is gone
async fn field_owner(storage: &dyn Storage, field_id: Uuid) -> StorageResult<Option<Uuid>> {
    Ok(storage.get_field(field_id).await?.map(|f| f.user_id))
}

pub async fn health_record_access(
    storage: &dyn Storage,
    caller: &AuthUser,
    id: Uuid,
) -> StorageResult<Access<PlantHealthRecord>> {
    let Some(record) = storage.get_health_record(id).await? else {
        return Ok(Access::Missing);
    };
    let access = match field_owner(storage, record.field_id).await? {
        None => Access::Missing,
        Some(owner) if owner != caller.user_id => Access::Foreign,
        Some(_) => Access::Owned(record),
    };
    Ok(logged(access, caller, HEALTH_RECORD, id))
}

pub async fn application_access(
    storage: &dyn Storage,
    caller: &AuthUser,
    id: Uuid,
) -> StorageResult<Access<PesticideApplication>> {
    let Some(app) = storage.get_pesticide_application(id).await? else {
        return Ok(Access::Missing);
    };
    let access = match field_owner(storage, app.field_id).await? {
        None => Access::Missing,
        Some(owner) if owner != caller.user_id => Access::Foreign,
        Some(_) => Access::Owned(app),
    };
    Ok(logged(access, caller, APPLICATION, id))
}
