pub mod directory;
pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;

pub use directory::UserDirectory;
pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryUserDirectory;
pub use postgres::PgUserDirectory;
