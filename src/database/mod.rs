pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod storage;

pub use manager::{build_storage, DatabaseError};
pub use memory::MemoryStorage;
pub use postgres::PgStorage;
pub use storage::{Storage, StorageError, StorageResult};
