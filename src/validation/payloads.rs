//! Typed payloads for each request body.
//!
//! Creates ignore keys they do not know. Updates are strict: anything that is
//! not an updatable column is reported back.

use serde_json::{Map, Value};
use uuid::Uuid;

use super::{
    boolean, boundaries, choice, email, latitude, longitude, percentage, positive, score,
    secret, text, timestamp, uuid, FieldErrors, Input,
};
use crate::database::models::{
    ConnectionType, CropPatch, DronePatch, NewContactMessage, NewCrop, NewDroneConnection,
    NewField, NewPesticideApplication, NewPlantHealthRecord, PesticidePatch, Severity,
};

type Body = Map<String, Value>;

/// Keys that are never writable once a record exists
const IMMUTABLE: &[&str] = &["id", "userId", "fieldId", "createdAt", "lastSeen", "recordedAt"];

#[derive(Debug, Clone)]
pub struct SignupInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

pub fn signup(body: &Body) -> Result<SignupInput, FieldErrors> {
    let mut input = Input::new(body);
    let username = input.required("username", text);
    let email = input.required("email", email);
    let password = input.required("password", secret);
    let full_name = input.required("fullName", text);

    let (Some(username), Some(email), Some(password), Some(full_name)) =
        (username, email, password, full_name)
    else {
        return Err(input.into_errors());
    };
    input.finish()?;

    Ok(SignupInput {
        username,
        email,
        password,
        full_name,
    })
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

pub fn login(body: &Body) -> Result<LoginInput, FieldErrors> {
    let mut input = Input::new(body);
    let username = input.required("username", text);
    let password = input.required("password", secret);

    let (Some(username), Some(password)) = (username, password) else {
        return Err(input.into_errors());
    };
    Ok(LoginInput { username, password })
}

pub fn new_crop(body: &Body, user_id: Uuid) -> Result<NewCrop, FieldErrors> {
    let mut input = Input::new(body);
    let name = input.required("name", text);
    let crop_type = input.required("type", text);
    let planted_date = input.required("plantedDate", timestamp);
    let expected_harvest_date = input.required("expectedHarvestDate", timestamp);
    let growth_stage = input.optional("growthStage", text);
    let area = input.required("area", positive);
    let is_active = input.optional("isActive", boolean);

    let (Some(name), Some(crop_type), Some(planted_date), Some(expected_harvest_date), Some(area)) =
        (name, crop_type, planted_date, expected_harvest_date, area)
    else {
        return Err(input.into_errors());
    };
    input.finish()?;

    Ok(NewCrop {
        user_id,
        name,
        crop_type,
        planted_date,
        expected_harvest_date,
        growth_stage,
        area,
        is_active,
    })
}

pub fn crop_patch(body: &Body) -> Result<CropPatch, FieldErrors> {
    let mut input = Input::new(body);
    input.only(
        &[
            "name",
            "type",
            "plantedDate",
            "expectedHarvestDate",
            "growthStage",
            "area",
            "isActive",
        ],
        IMMUTABLE,
    );

    let patch = CropPatch {
        name: input.replace("name", text),
        crop_type: input.replace("type", text),
        planted_date: input.replace("plantedDate", timestamp),
        expected_harvest_date: input.replace("expectedHarvestDate", timestamp),
        growth_stage: input.replace("growthStage", text),
        area: input.replace("area", positive),
        is_active: input.replace("isActive", boolean),
    };
    input.finish()?;
    Ok(patch)
}

pub fn new_field(body: &Body, user_id: Uuid) -> Result<NewField, FieldErrors> {
    let mut input = Input::new(body);
    let crop_id = input.optional("cropId", uuid);
    let name = input.required("name", text);
    let lat = input.required("latitude", latitude);
    let lon = input.required("longitude", longitude);
    let area = input.required("area", positive);
    let boundaries = input.optional("boundaries", boundaries);

    let (Some(name), Some(latitude), Some(longitude), Some(area)) = (name, lat, lon, area) else {
        return Err(input.into_errors());
    };
    input.finish()?;

    Ok(NewField {
        user_id,
        crop_id,
        name,
        latitude,
        longitude,
        area,
        boundaries,
    })
}

pub fn new_drone(body: &Body, user_id: Uuid) -> Result<NewDroneConnection, FieldErrors> {
    let mut input = Input::new(body);
    let drone_name = input.required("droneName", text);
    let connection_type = input.required("connectionType", choice::<ConnectionType>);
    let status = input.optional("status", choice);
    let battery_level = input.optional("batteryLevel", score);

    let (Some(drone_name), Some(connection_type)) = (drone_name, connection_type) else {
        return Err(input.into_errors());
    };
    input.finish()?;

    Ok(NewDroneConnection {
        user_id,
        drone_name,
        connection_type,
        status,
        battery_level,
    })
}

pub fn drone_patch(body: &Body) -> Result<DronePatch, FieldErrors> {
    let mut input = Input::new(body);
    input.only(
        &["droneName", "connectionType", "status", "batteryLevel"],
        IMMUTABLE,
    );

    let patch = DronePatch {
        drone_name: input.replace("droneName", text),
        connection_type: input.replace("connectionType", choice),
        status: input.replace("status", choice),
        battery_level: input.replace("batteryLevel", score),
    };
    input.finish()?;
    Ok(patch)
}

pub fn new_health_record(body: &Body) -> Result<NewPlantHealthRecord, FieldErrors> {
    let mut input = Input::new(body);
    let field_id = input.required("fieldId", uuid);
    let drone_id = input.optional("droneId", uuid);
    let health_score = input.required("healthScore", score);
    let infection_rate = input.required("infectionRate", percentage);
    let infection_type = input.optional("infectionType", text);
    let severity = input.required("severity", choice::<Severity>);
    let lat = input.optional("latitude", latitude);
    let lon = input.optional("longitude", longitude);
    let detection_confidence = input.required("detectionConfidence", score);

    let (
        Some(field_id),
        Some(health_score),
        Some(infection_rate),
        Some(severity),
        Some(detection_confidence),
    ) = (field_id, health_score, infection_rate, severity, detection_confidence)
    else {
        return Err(input.into_errors());
    };
    input.finish()?;

    Ok(NewPlantHealthRecord {
        field_id,
        drone_id,
        health_score,
        infection_rate,
        infection_type,
        severity,
        latitude: lat,
        longitude: lon,
        detection_confidence,
    })
}

pub fn new_pesticide_application(body: &Body) -> Result<NewPesticideApplication, FieldErrors> {
    let mut input = Input::new(body);
    let field_id = input.required("fieldId", uuid);
    let health_record_id = input.optional("healthRecordId", uuid);
    let pesticide_type = input.required("pesticideType", text);
    let volume_per_hectare = input.required("volumePerHectare", positive);
    let total_volume = input.required("totalVolume", positive);
    let application_method = input.optional("applicationMethod", text);
    let status = input.optional("status", choice);
    let recommended_by = input.optional("recommendedBy", text);
    let confidence = input.required("confidence", score);
    let scheduled_for = input.optional("scheduledFor", timestamp);
    let applied_at = input.optional("appliedAt", timestamp);

    let (
        Some(field_id),
        Some(pesticide_type),
        Some(volume_per_hectare),
        Some(total_volume),
        Some(confidence),
    ) = (field_id, pesticide_type, volume_per_hectare, total_volume, confidence)
    else {
        return Err(input.into_errors());
    };
    input.finish()?;

    Ok(NewPesticideApplication {
        field_id,
        health_record_id,
        pesticide_type,
        volume_per_hectare,
        total_volume,
        application_method,
        status,
        recommended_by,
        confidence,
        scheduled_for,
        applied_at,
    })
}

pub fn pesticide_patch(body: &Body) -> Result<PesticidePatch, FieldErrors> {
    let mut input = Input::new(body);
    // healthRecordId is fixed at creation along with the field
    let mut immutable = IMMUTABLE.to_vec();
    immutable.push("healthRecordId");
    input.only(
        &[
            "pesticideType",
            "volumePerHectare",
            "totalVolume",
            "applicationMethod",
            "status",
            "recommendedBy",
            "confidence",
            "scheduledFor",
            "appliedAt",
        ],
        &immutable,
    );

    let patch = PesticidePatch {
        pesticide_type: input.replace("pesticideType", text),
        volume_per_hectare: input.replace("volumePerHectare", positive),
        total_volume: input.replace("totalVolume", positive),
        application_method: input.replace("applicationMethod", text),
        status: input.replace("status", choice),
        recommended_by: input.replace("recommendedBy", text),
        confidence: input.replace("confidence", score),
        scheduled_for: input.nullable("scheduledFor", timestamp),
        applied_at: input.nullable("appliedAt", timestamp),
    };
    input.finish()?;
    Ok(patch)
}

pub fn contact(body: &Body) -> Result<NewContactMessage, FieldErrors> {
    let mut input = Input::new(body);
    let name = input.required("name", text);
    let email = input.required("email", email);
    let message = input.required("message", text);

    let (Some(name), Some(email), Some(message)) = (name, email, message) else {
        return Err(input.into_errors());
    };
    Ok(NewContactMessage {
        name,
        email,
        message,
    })
}

/// `?fieldId=` on list endpoints
pub fn field_filter(raw: Option<&str>) -> Result<Option<Uuid>, FieldErrors> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => Uuid::parse_str(s).map(Some).map_err(|_| {
            let mut errors = FieldErrors::default();
            errors.add("fieldId", "must be a valid id");
            errors
        }),
    }
}
