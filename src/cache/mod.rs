// Cache storage module
// Author: kelexine (https://github.com/kelexine)

mod memory;
pub mod models;
mod sqlite;
mod storage;

pub use memory::MemoryCacheStorage;
pub use sqlite::SqliteCacheStorage;
pub use models::StoreSummary;
pub use storage::CacheStorage;
