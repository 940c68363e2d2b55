use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_BATTERY_LEVEL: i32 = 100;

text_enum!(ConnectionType {
    Wifi => "wifi",
    Bluetooth => "bluetooth",
});

text_enum!(DroneStatus {
    Connected => "connected",
    Disconnected => "disconnected",
    Scanning => "scanning",
});

impl Default for DroneStatus {
    fn default() -> Self {
        DroneStatus::Connected
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DroneConnection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub drone_name: String,
    pub connection_type: ConnectionType,
    pub status: DroneStatus,
    /// Percent, 0-100
    pub battery_level: i32,
    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDroneConnection {
    pub user_id: Uuid,
    pub drone_name: String,
    pub connection_type: ConnectionType,
    pub status: Option<DroneStatus>,
    pub battery_level: Option<i32>,
}

impl NewDroneConnection {
    pub fn into_drone(self, id: Uuid, now: DateTime<Utc>) -> DroneConnection {
        DroneConnection {
            id,
            user_id: self.user_id,
            drone_name: self.drone_name,
            connection_type: self.connection_type,
            status: self.status.unwrap_or_default(),
            battery_level: self.battery_level.unwrap_or(DEFAULT_BATTERY_LEVEL),
            last_seen: now,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DronePatch {
    pub drone_name: Option<String>,
    pub connection_type: Option<ConnectionType>,
    pub status: Option<DroneStatus>,
    pub battery_level: Option<i32>,
}

impl DronePatch {
    /// Merge into `drone`; every update counts as a sighting.
    pub fn apply(self, drone: &mut DroneConnection, now: DateTime<Utc>) {
        if let Some(v) = self.drone_name {
            drone.drone_name = v;
        }
        if let Some(v) = self.connection_type {
            drone.connection_type = v;
        }
        if let Some(v) = self.status {
            drone.status = v;
        }
        if let Some(v) = self.battery_level {
            drone.battery_level = v;
        }
        drone.last_seen = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_spellings_round_trip_through_str() {
        assert_eq!("bluetooth".parse::<ConnectionType>().unwrap(), ConnectionType::Bluetooth);
        assert_eq!(DroneStatus::Scanning.as_str(), "scanning");
        assert!("zigbee".parse::<ConnectionType>().is_err());
        assert_eq!(ConnectionType::choices(), "wifi, bluetooth");
    }

    #[test]
    fn defaults_apply_on_creation() {
        let now = Utc::now();
        let drone = NewDroneConnection {
            user_id: Uuid::new_v4(),
            drone_name: "Alpha-1".into(),
            connection_type: ConnectionType::Wifi,
            status: None,
            battery_level: None,
        }
        .into_drone(Uuid::new_v4(), now);

        assert_eq!(drone.status, DroneStatus::Connected);
        assert_eq!(drone.battery_level, 100);
        assert_eq!(drone.last_seen, now);

        let json = serde_json::to_value(&drone).unwrap();
        assert_eq!(json["connectionType"], "wifi");
        assert_eq!(json["status"], "connected");
    }
}
