pub mod revert; // POST /api/impersonate/revert
pub mod status; // GET /api/impersonate/status

pub use revert::impersonate_revert;
pub use status::impersonate_status;
