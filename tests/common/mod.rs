// Shared test doubles for the agent's collaborators
// Author: kelexine (https://github.com/kelexine)

#![allow(dead_code)]

use async_trait::async_trait;
use offline_agent::agent::CacheLifecycleManager;
use offline_agent::cache::{CacheStorage, MemoryCacheStorage, StoreSummary};
use offline_agent::config::{AgentConfig, NotificationConfig};
use offline_agent::error::{AgentError, Result};
use offline_agent::models::{AgentRequest, AgentResponse, RequestKey};
use offline_agent::network::Network;
use offline_agent::notify::{NotificationOptions, Notifier, WindowOpener};
use parking_lot::Mutex;
use reqwest::Url;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const ORIGIN: &str = "https://app.example.com";

pub fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

/// Network that answers from a route table and can be switched offline.
#[derive(Default)]
pub struct StubNetwork {
    routes: Mutex<HashMap<String, AgentResponse>>,
    offline: AtomicBool,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl StubNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn route(self, path: &str, response: AgentResponse) -> Self {
        self.routes.lock().insert(path.to_string(), response);
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &AgentRequest) -> Result<AgentResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(AgentError::Network(format!("offline: {}", request.url)));
        }
        self.routes
            .lock()
            .get(request.url.path())
            .cloned()
            .ok_or_else(|| AgentError::Network(format!("unreachable: {}", request.url)))
    }
}

/// Memory storage whose deletes and writes can be made to fail.
#[derive(Clone, Default)]
pub struct FlakyStorage {
    pub inner: MemoryCacheStorage,
    pub fail_delete: Arc<AtomicBool>,
    pub fail_put: Arc<AtomicBool>,
    pub puts: Arc<AtomicUsize>,
}

#[async_trait]
impl CacheStorage for FlakyStorage {
    async fn open(&self, name: &str) -> Result<()> {
        self.inner.open(name).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.inner.keys().await
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AgentError::CacheStorage(format!("cannot delete {}", name)));
        }
        self.inner.delete(name).await
    }

    async fn match_request(&self, key: &RequestKey) -> Result<Option<AgentResponse>> {
        self.inner.match_request(key).await
    }

    async fn match_in(&self, name: &str, key: &RequestKey) -> Result<Option<AgentResponse>> {
        self.inner.match_in(name, key).await
    }

    async fn put(&self, name: &str, key: RequestKey, response: AgentResponse) -> Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(AgentError::CacheStorage("quota exceeded".to_string()));
        }
        self.inner.put(name, key, response).await
    }

    async fn put_all(&self, name: &str, entries: Vec<(RequestKey, AgentResponse)>) -> Result<()> {
        self.inner.put_all(name, entries).await
    }

    async fn summaries(&self) -> Result<Vec<StoreSummary>> {
        self.inner.summaries().await
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub shown: Mutex<Vec<(Uuid, String, NotificationOptions)>>,
    pub closed: Mutex<Vec<Uuid>>,
}

impl Notifier for RecordingNotifier {
    fn show(&self, title: &str, options: &NotificationOptions) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.shown.lock().push((id, title.to_string(), options.clone()));
        Ok(id)
    }

    fn close(&self, id: Uuid) -> Result<()> {
        self.closed.lock().push(id);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingWindows {
    pub opened: Mutex<Vec<String>>,
}

impl WindowOpener for RecordingWindows {
    fn open_window(&self, url: &Url) -> Result<()> {
        self.opened.lock().push(url.to_string());
        Ok(())
    }
}

pub fn agent_config(version: &str, precache: &[&str]) -> AgentConfig {
    AgentConfig {
        origin: ORIGIN.to_string(),
        cache_version: version.to_string(),
        precache: precache.iter().map(|p| p.to_string()).collect(),
        ..AgentConfig::default()
    }
}

pub struct Harness {
    pub agent: CacheLifecycleManager,
    pub storage: FlakyStorage,
    pub network: Arc<StubNetwork>,
    pub notifier: Arc<RecordingNotifier>,
    pub windows: Arc<RecordingWindows>,
}

pub fn harness(config: AgentConfig, network: StubNetwork) -> Harness {
    let storage = FlakyStorage::default();
    let network = Arc::new(network);
    let notifier = Arc::new(RecordingNotifier::default());
    let windows = Arc::new(RecordingWindows::default());

    let agent = CacheLifecycleManager::new(
        &config,
        &NotificationConfig::default(),
        Arc::new(storage.clone()),
        network.clone(),
    )
    .unwrap()
    .with_notifier(notifier.clone())
    .with_window_opener(windows.clone());

    Harness {
        agent,
        storage,
        network,
        notifier,
        windows,
    }
}
