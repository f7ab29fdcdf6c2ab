pub mod directory;
pub mod manager;
pub mod memory;
pub mod models;

pub use directory::{DirectoryError, IdentityDirectory, PgDirectory};
pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryDirectory;
