pub mod begin; // POST /api/impersonate/:target_id
pub mod businesses; // GET /api/impersonate/businesses

pub use begin::impersonate_begin;
pub use businesses::impersonate_businesses;
