// handlers/mod.rs - Tiered handler layout
//
// Protected (JWT auth) → Elevated (JWT auth + platform admin role claim)
pub mod elevated; // /api/impersonate/:target_id, /api/impersonate/businesses
pub mod protected; // /api/impersonate/revert, /api/impersonate/status
