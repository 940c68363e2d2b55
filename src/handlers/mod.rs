// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (bearer token). Routes are wired up in
// `app.rs`; the protected tier sits behind `middleware::require_auth`.

pub mod protected; // Tier 2: JWT authentication required (/api/*)
pub mod public; // Tier 1: No authentication required
