// handlers/protected/auth/mod.rs - Session endpoints for authenticated users

pub mod me; // GET /api/auth/me - current user profile

pub use me::me_get;
