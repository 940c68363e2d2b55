// handlers/public/mod.rs - Tier 1: no authentication required

pub mod auth;
pub mod contact;
