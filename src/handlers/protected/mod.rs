// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Any authenticated caller may reach these; the impersonation token in the
// request is the capability being exercised.
pub mod impersonate;

pub use impersonate::*;
