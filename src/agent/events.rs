// Lifecycle signals and their outcomes
// Author: kelexine (https://github.com/kelexine)

use crate::models::{AgentRequest, AgentResponse};
use serde::Serialize;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Every signal the hosting runtime can deliver to the agent.
#[derive(Debug)]
pub enum AgentEvent {
    /// First registration or update: populate the current store.
    Install,
    /// Take control: evict every non-current store.
    Activate,
    /// An outgoing request to intercept.
    Fetch(AgentRequest),
    /// Background sync opportunity.
    Sync { tag: String },
    /// Push message with an optional text payload.
    Push { data: Option<String> },
    /// The user interacted with a displayed notification.
    NotificationClick { id: Uuid, action: Option<String> },
}

impl AgentEvent {
    /// Short name used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Activate => "activate",
            Self::Fetch(_) => "fetch",
            Self::Sync { .. } => "sync",
            Self::Push { .. } => "push",
            Self::NotificationClick { .. } => "notificationclick",
        }
    }
}

/// Result of dispatching one [`AgentEvent`].
#[derive(Debug)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivateReport),
    Fetched(FetchResult),
    Synced { handled: bool },
    NotificationShown(Uuid),
    NotificationClicked { opened: Option<String> },
}

/// What install managed to precache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub version: String,
    /// Identifiers written into the current store.
    pub cached: Vec<String>,
    /// Identifiers left uncached, with the reason.
    pub failed: Vec<PrecacheFailure>,
}

impl InstallReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrecacheFailure {
    pub identifier: String,
    pub reason: String,
}

/// What activate evicted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivateReport {
    pub version: String,
    pub deleted: Vec<String>,
    pub failed: Vec<StoreDeletionFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreDeletionFailure {
    pub name: String,
    pub reason: String,
}

/// Where a fetch response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseSource {
    Cache,
    Network,
    OfflineFallback,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Network => "network",
            Self::OfflineFallback => "offline-fallback",
        }
    }
}

/// A response handed back to the requester.
///
/// `cache_write` is the detached task storing a copy of a network response.
/// Dropping the handle leaves the task running; awaiting it is only needed
/// when the caller must observe the write.
#[derive(Debug)]
pub struct FetchResult {
    pub response: AgentResponse,
    pub source: ResponseSource,
    pub cache_write: Option<JoinHandle<()>>,
}

impl FetchResult {
    pub fn from_cache(response: AgentResponse) -> Self {
        Self {
            response,
            source: ResponseSource::Cache,
            cache_write: None,
        }
    }

    pub fn from_network(response: AgentResponse, cache_write: Option<JoinHandle<()>>) -> Self {
        Self {
            response,
            source: ResponseSource::Network,
            cache_write,
        }
    }

    pub fn offline_fallback(response: AgentResponse) -> Self {
        Self {
            response,
            source: ResponseSource::OfflineFallback,
            cache_write: None,
        }
    }
}
