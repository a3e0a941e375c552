// In-process cache store
// Author: kelexine (https://github.com/kelexine)

use super::models::StoreSummary;
use super::storage::{require_get, CacheStorage};
use crate::error::Result;
use crate::models::{AgentResponse, RequestKey};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

struct NamedStore {
    name: String,
    entries: HashMap<RequestKey, AgentResponse>,
}

impl NamedStore {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: HashMap::new(),
        }
    }
}

/// Cache stores held in memory for the lifetime of the process.
///
/// Cheap to clone; clones share the same stores.
#[derive(Clone, Default)]
pub struct MemoryCacheStorage {
    /// Stores in creation order
    stores: Arc<RwLock<Vec<NamedStore>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(stores: &[NamedStore], name: &str) -> Option<usize> {
        stores.iter().position(|s| s.name == name)
    }

    fn store_mut<'a>(stores: &'a mut Vec<NamedStore>, name: &str) -> &'a mut NamedStore {
        let idx = match Self::position(stores, name) {
            Some(idx) => idx,
            None => {
                debug!("Creating cache store {}", name);
                stores.push(NamedStore::new(name));
                stores.len() - 1
            }
        };
        &mut stores[idx]
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<()> {
        let mut stores = self.stores.write().await;
        Self::store_mut(&mut stores, name);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let stores = self.stores.read().await;
        Ok(stores.iter().map(|s| s.name.clone()).collect())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let mut stores = self.stores.write().await;
        match Self::position(&stores, name) {
            Some(idx) => {
                let removed = stores.remove(idx);
                debug!("Deleted cache store {} ({} entries)", name, removed.entries.len());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn match_request(&self, key: &RequestKey) -> Result<Option<AgentResponse>> {
        if !key.is_get() {
            return Ok(None);
        }
        let stores = self.stores.read().await;
        Ok(stores.iter().find_map(|s| s.entries.get(key).cloned()))
    }

    async fn match_in(&self, name: &str, key: &RequestKey) -> Result<Option<AgentResponse>> {
        if !key.is_get() {
            return Ok(None);
        }
        let stores = self.stores.read().await;
        Ok(Self::position(&stores, name).and_then(|idx| stores[idx].entries.get(key).cloned()))
    }

    async fn put(&self, name: &str, key: RequestKey, response: AgentResponse) -> Result<()> {
        require_get(&key)?;
        let mut stores = self.stores.write().await;
        Self::store_mut(&mut stores, name).entries.insert(key, response);
        Ok(())
    }

    async fn put_all(&self, name: &str, entries: Vec<(RequestKey, AgentResponse)>) -> Result<()> {
        // Validate everything before touching the store
        for (key, _) in &entries {
            require_get(key)?;
        }
        let mut stores = self.stores.write().await;
        Self::store_mut(&mut stores, name).entries.extend(entries);
        Ok(())
    }

    async fn summaries(&self) -> Result<Vec<StoreSummary>> {
        let stores = self.stores.read().await;
        Ok(stores
            .iter()
            .map(|s| StoreSummary {
                name: s.name.clone(),
                entries: s.entries.len(),
            })
            .collect())
    }
}
