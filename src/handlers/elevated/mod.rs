// handlers/elevated/mod.rs - Elevated handlers (platform admin JWT required)
//
// Routes here sit behind `require_root_middleware`. The service re-checks the
// caller's tier against the directory, so a stale role claim cannot slip through.
pub mod impersonate;

pub use impersonate::*;
