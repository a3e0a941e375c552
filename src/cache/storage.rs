// Cache store abstraction
// Author: kelexine (https://github.com/kelexine)

use crate::cache::models::StoreSummary;
use crate::error::{AgentError, Result};
use crate::models::{AgentResponse, RequestKey};
use async_trait::async_trait;

/// A set of named key-value stores mapping requests to response snapshots.
///
/// Stores are enumerated in creation order. Entries are replaced wholesale on
/// `put` and are never mutated in place. Only `GET` keys can be stored;
/// matching any other method is always a miss.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open the store called `name`, creating it if absent.
    async fn open(&self, name: &str) -> Result<()>;

    /// Names of all existing stores, oldest first.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Delete a store with all its entries. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Look the key up across every store, oldest first.
    async fn match_request(&self, key: &RequestKey) -> Result<Option<AgentResponse>>;

    /// Look the key up in one store.
    async fn match_in(&self, name: &str, key: &RequestKey) -> Result<Option<AgentResponse>>;

    /// Write one entry into `name`, creating the store if needed.
    async fn put(&self, name: &str, key: RequestKey, response: AgentResponse) -> Result<()>;

    /// Write several entries into `name` in one step. Either all are written
    /// or, on error, none are.
    async fn put_all(&self, name: &str, entries: Vec<(RequestKey, AgentResponse)>) -> Result<()>;

    /// Name and entry count of every store, oldest first.
    async fn summaries(&self) -> Result<Vec<StoreSummary>>;
}

/// Reject keys the stores cannot hold.
pub(crate) fn require_get(key: &RequestKey) -> Result<()> {
    if key.is_get() {
        Ok(())
    } else {
        Err(AgentError::CacheStorage(format!(
            "Request method '{}' is unsupported for {}",
            key.method(),
            key.url()
        )))
    }
}
