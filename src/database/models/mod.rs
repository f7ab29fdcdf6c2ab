pub mod company;
pub mod user;

pub use company::{BusinessView, Company};
pub use user::{PlatformUser, UserRole, UserSnapshot};
