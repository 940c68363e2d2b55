// handlers/protected/mod.rs - Tier 2: bearer token required (/api/*)
//
// Every handler here receives the caller as an `AuthUser` extractor and
// scopes reads and writes to that user's records.

pub mod auth;
pub mod crops;
pub mod dashboard;
pub mod drones;
pub mod fields;
pub mod health_records;
pub mod pesticide_applications;
pub mod utils;
