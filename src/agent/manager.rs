// Cache lifecycle manager - install, activate, fetch interception, push
// Author: kelexine (https://github.com/kelexine)

use super::events::{
    ActivateReport, AgentEvent, EventOutcome, FetchResult, InstallReport, PrecacheFailure,
    StoreDeletionFailure,
};
use super::state::LifecycleState;
use crate::cache::CacheStorage;
use crate::config::{AgentConfig, NotificationConfig};
use crate::error::{AgentError, Result};
use crate::metrics;
use crate::models::{resolve_identifier, AgentRequest, AgentResponse, RequestKey};
use crate::network::Network;
use crate::notify::{
    NotificationAction, NotificationData, NotificationOptions, Notifier, SystemBrowser,
    TracingNotifier, WindowOpener, ACTION_CLOSE, ACTION_EXPLORE,
};
use futures::future::join_all;
use parking_lot::Mutex;
use reqwest::Url;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Mediates between intercepted requests, the network and the cache stores.
///
/// The only store ever written is the one named by the configured cache
/// version. Cheap to clone; clones share collaborators and lifecycle state,
/// so concurrent fetches can each hold their own handle.
#[derive(Clone)]
pub struct CacheLifecycleManager {
    config: AgentConfig,
    notification: NotificationConfig,
    origin: Url,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    notifier: Arc<dyn Notifier>,
    windows: Arc<dyn WindowOpener>,
    state: Arc<Mutex<LifecycleState>>,
}

impl CacheLifecycleManager {
    /// Create a manager with the default notifier and window opener.
    pub fn new(
        config: &AgentConfig,
        notification: &NotificationConfig,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Result<Self> {
        let origin = Url::parse(&config.origin)
            .map_err(|e| AgentError::Config(format!("Invalid origin '{}': {}", config.origin, e)))?;

        Ok(Self {
            config: config.clone(),
            notification: notification.clone(),
            origin,
            storage,
            network,
            notifier: Arc::new(TracingNotifier),
            windows: Arc::new(SystemBrowser),
            state: Arc::new(Mutex::new(LifecycleState::default())),
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_window_opener(mut self, windows: Arc<dyn WindowOpener>) -> Self {
        self.windows = windows;
        self
    }

    /// Name of the current store.
    pub fn version(&self) -> &str {
        &self.config.cache_version
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock()
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    fn set_state(&self, next: LifecycleState) {
        let mut state = self.state.lock();
        debug!("Lifecycle {} -> {}", *state, next);
        *state = next;
    }

    /// Dispatch one lifecycle signal.
    pub async fn handle_event(&self, event: AgentEvent) -> Result<EventOutcome> {
        let name = event.name();
        let outcome = match event {
            AgentEvent::Install => self.install().await.map(EventOutcome::Installed),
            AgentEvent::Activate => self.activate().await.map(EventOutcome::Activated),
            AgentEvent::Fetch(request) => self.fetch(request).await.map(EventOutcome::Fetched),
            AgentEvent::Sync { tag } => Ok(EventOutcome::Synced {
                handled: self.sync(&tag),
            }),
            AgentEvent::Push { data } => self.push(data).map(EventOutcome::NotificationShown),
            AgentEvent::NotificationClick { id, action } => self
                .notification_click(id, action.as_deref())
                .map(|opened| EventOutcome::NotificationClicked { opened }),
        };
        metrics::record_event(name, outcome.is_ok());
        outcome
    }

    /// Open the current store and precache every configured resource.
    ///
    /// Never fails: precache problems are logged and reported, and the agent
    /// reaches `installed` regardless.
    pub async fn install(&self) -> Result<InstallReport> {
        self.set_state(LifecycleState::Installing);
        info!("Installing cache {}", self.version());

        let report = match self.precache().await {
            Ok(report) => report,
            Err(e) => {
                warn!("Precache into {} failed: {}", self.version(), e);
                InstallReport {
                    version: self.version().to_string(),
                    cached: Vec::new(),
                    failed: self
                        .config
                        .precache
                        .iter()
                        .map(|identifier| PrecacheFailure {
                            identifier: identifier.clone(),
                            reason: e.to_string(),
                        })
                        .collect(),
                }
            }
        };

        metrics::record_precache(report.cached.len(), report.failed.len());
        self.refresh_store_count().await;
        self.set_state(LifecycleState::Installed);

        info!(
            "Installed {}: {} cached, {} failed",
            report.version,
            report.cached.len(),
            report.failed.len()
        );
        Ok(report)
    }

    async fn precache(&self) -> Result<InstallReport> {
        let version = self.version();
        self.storage.open(version).await?;

        let results = join_all(self.config.precache.iter().map(|id| self.precache_one(id))).await;

        let mut entries = Vec::new();
        let mut cached = Vec::new();
        let mut failed = Vec::new();
        for (identifier, result) in self.config.precache.iter().zip(results) {
            match result {
                Ok(entry) => {
                    cached.push(identifier.clone());
                    entries.push(entry);
                }
                Err(e) => {
                    warn!("Failed to precache {}: {}", identifier, e);
                    failed.push(PrecacheFailure {
                        identifier: identifier.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if self.config.atomic_precache && !failed.is_empty() {
            warn!(
                "Atomic precache: discarding {} fetched entries because {} failed",
                entries.len(),
                failed.len()
            );
            for identifier in cached.drain(..) {
                failed.push(PrecacheFailure {
                    identifier,
                    reason: "discarded by atomic precache".to_string(),
                });
            }
        } else if !entries.is_empty() {
            self.storage.put_all(version, entries).await?;
        }

        Ok(InstallReport {
            version: version.to_string(),
            cached,
            failed,
        })
    }

    async fn precache_one(&self, identifier: &str) -> Result<(RequestKey, AgentResponse)> {
        let request = AgentRequest::get(resolve_identifier(&self.origin, identifier)?);
        let response = self.network.fetch(&request).await?;
        metrics::record_network_fetch(true);

        if !response.is_ok() {
            return Err(AgentError::Network(format!(
                "{} returned status {}",
                request.url, response.status
            )));
        }
        Ok((request.key(), response))
    }

    /// Delete every store except the current one.
    ///
    /// A store that cannot be deleted is logged and reported; activation still
    /// completes.
    pub async fn activate(&self) -> Result<ActivateReport> {
        {
            let mut state = self.state.lock();
            if !state.can_activate() {
                return Err(AgentError::Lifecycle(format!(
                    "cannot activate while {}",
                    *state
                )));
            }
            *state = LifecycleState::Activating;
        }
        info!("Activating cache {}", self.version());

        let names = match self.storage.keys().await {
            Ok(names) => names,
            Err(e) => {
                warn!("Could not enumerate cache stores: {}", e);
                Vec::new()
            }
        };
        let stale: Vec<String> = names
            .into_iter()
            .filter(|name| name != self.version())
            .collect();

        let results = join_all(stale.iter().map(|name| {
            info!("Deleting old cache {}", name);
            self.storage.delete(name)
        }))
        .await;

        let mut report = ActivateReport {
            version: self.version().to_string(),
            ..Default::default()
        };
        for (name, result) in stale.into_iter().zip(results) {
            match result {
                Ok(_) => {
                    metrics::record_eviction(true);
                    report.deleted.push(name);
                }
                Err(e) => {
                    warn!("Failed to delete old cache {}: {}", name, e);
                    metrics::record_eviction(false);
                    report.failed.push(StoreDeletionFailure {
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.refresh_store_count().await;
        self.set_state(LifecycleState::Activated);
        info!(
            "Activated {}: {} old stores deleted",
            report.version,
            report.deleted.len()
        );
        Ok(report)
    }

    /// Serve a request from the cache, else the network, else the offline
    /// fallback for document navigations.
    pub async fn fetch(&self, request: AgentRequest) -> Result<FetchResult> {
        let started = Instant::now();
        let result = self.fetch_inner(request).await;

        let source = match &result {
            Ok(fetched) => fetched.source.as_str(),
            Err(_) => "error",
        };
        metrics::record_fetch(source, started.elapsed().as_secs_f64());
        result
    }

    async fn fetch_inner(&self, request: AgentRequest) -> Result<FetchResult> {
        let key = request.key();

        match self.storage.match_request(&key).await {
            Ok(Some(response)) => {
                debug!("Cache hit: {}", key);
                metrics::record_cache_hit();
                return Ok(FetchResult::from_cache(response));
            }
            Ok(None) => {
                debug!("Cache miss: {}", key);
                metrics::record_cache_miss();
            }
            Err(e) => {
                warn!("Cache lookup for {} failed, treating as miss: {}", key, e);
                metrics::record_cache_miss();
            }
        }

        match self.network.fetch(&request).await {
            Ok(response) => {
                metrics::record_network_fetch(true);
                if !response.is_cacheable() {
                    debug!(
                        "Not caching {} (status {}, type {})",
                        key,
                        response.status,
                        response.response_type.as_str()
                    );
                    return Ok(FetchResult::from_network(response, None));
                }
                if !key.is_get() {
                    debug!("Not caching {} (only GET is stored)", key);
                    return Ok(FetchResult::from_network(response, None));
                }
                let write = self.spawn_cache_write(key, response.clone());
                Ok(FetchResult::from_network(response, Some(write)))
            }
            Err(e) => {
                metrics::record_network_fetch(false);
                if !request.is_document() {
                    debug!("Network failed for {}: {}", key, e);
                    return Err(e);
                }
                warn!("Network failed for navigation {}: {}", key, e);
                self.offline_fallback().await
            }
        }
    }

    /// Store a copy of a network response without making the caller wait.
    fn spawn_cache_write(&self, key: RequestKey, response: AgentResponse) -> JoinHandle<()> {
        let storage = Arc::clone(&self.storage);
        let version = self.config.cache_version.clone();

        tokio::spawn(async move {
            match storage.put(&version, key.clone(), response).await {
                Ok(()) => {
                    debug!("Cached {} in {}", key, version);
                    metrics::record_cache_write(true);
                }
                Err(e) => {
                    warn!("Cache write for {} failed: {}", key, e);
                    metrics::record_cache_write(false);
                }
            }
        })
    }

    async fn offline_fallback(&self) -> Result<FetchResult> {
        let url = resolve_identifier(&self.origin, &self.config.offline_fallback)?;
        let key = RequestKey::get(&url);

        match self.storage.match_request(&key).await {
            Ok(Some(response)) => {
                info!("Serving offline fallback {}", url);
                metrics::record_offline_fallback();
                Ok(FetchResult::offline_fallback(response))
            }
            Ok(None) => Err(AgentError::OfflineUnavailable(url.to_string())),
            Err(e) => {
                warn!("Offline fallback lookup failed: {}", e);
                Err(AgentError::OfflineUnavailable(url.to_string()))
            }
        }
    }

    /// Background sync hook. Returns whether the tag was recognized.
    pub fn sync(&self, tag: &str) -> bool {
        if tag == self.config.sync_tag {
            info!("Background sync triggered ({})", tag);
            true
        } else {
            debug!("Ignoring sync tag {}", tag);
            false
        }
    }

    /// Display a notification for a push message.
    pub fn push(&self, data: Option<String>) -> Result<Uuid> {
        info!("Push message received");
        let options = self.notification_options(data);
        let id = self.notifier.show(&self.notification.title, &options)?;
        metrics::record_notification("shown");
        Ok(id)
    }

    fn notification_options(&self, data: Option<String>) -> NotificationOptions {
        let n = &self.notification;
        NotificationOptions {
            body: data.unwrap_or_else(|| n.default_body.clone()),
            icon: n.icon.clone(),
            badge: n.badge.clone(),
            vibrate: n.vibrate.clone(),
            data: NotificationData {
                date_of_arrival: chrono::Utc::now().timestamp_millis(),
                primary_key: 1,
            },
            actions: vec![
                NotificationAction {
                    action: ACTION_EXPLORE.to_string(),
                    title: n.explore_title.clone(),
                    icon: Some(n.icon.clone()),
                },
                NotificationAction {
                    action: ACTION_CLOSE.to_string(),
                    title: n.close_title.clone(),
                    icon: None,
                },
            ],
        }
    }

    /// Close the notification and open the application for `explore`.
    ///
    /// Returns the URL of the opened window, if any.
    pub fn notification_click(&self, id: Uuid, action: Option<&str>) -> Result<Option<String>> {
        info!("Notification {} clicked (action: {:?})", id, action);
        metrics::record_notification("clicked");

        if let Err(e) = self.notifier.close(id) {
            warn!("Could not close notification {}: {}", id, e);
        }

        if action != Some(ACTION_EXPLORE) {
            return Ok(None);
        }

        let url = resolve_identifier(&self.origin, &self.config.app_root)?;
        self.windows.open_window(&url)?;
        metrics::record_notification("opened_window");
        Ok(Some(url.to_string()))
    }

    async fn refresh_store_count(&self) {
        if let Ok(names) = self.storage.keys().await {
            metrics::update_store_count(names.len());
        }
    }
}
