pub mod impersonation_service;

pub use impersonation_service::{
    ImpersonationError, ImpersonationGrant, ImpersonationService, ImpersonationStatus,
    IssuedImpersonation,
};
