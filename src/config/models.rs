//! Configuration data structures for the offline agent.
//!
//! This module defines the schema for the application settings: the local
//! proxy listener, the cache lifecycle (version, precache list, fallback),
//! the upstream HTTP client, notification presentation and logging.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Version identifier naming the current cache store.
///
/// Bumping this value evicts the whole previous cache generation on the next
/// activation.
pub const CACHE_VERSION: &str = "app-cache-v1.0.2";

/// Resources written into the current store at install time, in order.
pub const PRECACHE_URLS: &[&str] = &[
    "/",
    "/index.html",
    "/manifest.json",
    "/icon-192.png",
    "/icon-512.png",
];

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Local proxy listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Cache lifecycle settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Where cache stores are kept.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Upstream HTTP client settings.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Push notification presentation.
    #[serde(default)]
    pub notification: NotificationConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the local proxy server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `127.0.0.1`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `8080`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest request body accepted for forwarding, in bytes.
    /// Default: `10 MiB`
    #[serde(default = "default_body_limit")]
    pub max_body_bytes: usize,
}

/// Settings for the cache lifecycle manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Origin of the web application being fronted (scheme, host, port).
    /// Default: `http://127.0.0.1:3000`
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Name of the current cache store.
    /// Default: [`CACHE_VERSION`]
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Resource paths precached at install time.
    /// Default: [`PRECACHE_URLS`]
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Page served from the cache when a document navigation fails offline.
    /// Default: `/index.html`
    #[serde(default = "default_offline_fallback")]
    pub offline_fallback: String,

    /// Write nothing at install time unless every precache entry succeeds.
    /// Set to `false` to keep whatever entries could be fetched.
    /// Default: `true`
    #[serde(default = "default_atomic_precache")]
    pub atomic_precache: bool,

    /// Sync tag that triggers the background sync hook.
    /// Default: `background-sync`
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,

    /// Path opened when a notification's explore action is chosen.
    /// Default: `/`
    #[serde(default = "default_app_root")]
    pub app_root: String,
}

/// Backend holding the cache stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SQLite database on disk; stores survive restarts.
    #[default]
    Sqlite,
    /// Process memory; everything is lost on exit.
    Memory,
}

/// Settings for cache store persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Default: `sqlite`
    #[serde(default)]
    pub backend: StorageBackend,

    /// Database file for the `sqlite` backend.
    /// Default: `offline-agent/cache.db` under the platform cache directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Settings for the upstream HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Overall request timeout in seconds.
    /// Default: `30`
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// TCP connect timeout in seconds.
    /// Default: `10`
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Maximum number of idle connections kept per host.
    /// Default: `10`
    #[serde(default = "default_pool_size")]
    pub pool_max_idle_per_host: usize,
}

/// Presentation of push notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Notification title.
    #[serde(default = "default_notification_title")]
    pub title: String,

    /// Body used when a push arrives without a payload.
    #[serde(default = "default_notification_body")]
    pub default_body: String,

    #[serde(default = "default_icon")]
    pub icon: String,

    #[serde(default = "default_badge")]
    pub badge: String,

    /// Vibration pattern in milliseconds (vibrate, pause, vibrate, ...).
    #[serde(default = "default_vibrate")]
    pub vibrate: Vec<u32>,

    /// Label of the action that opens the application.
    #[serde(default = "default_explore_title")]
    pub explore_title: String,

    /// Label of the action that dismisses the notification.
    #[serde(default = "default_close_title")]
    pub close_title: String,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default trait implementations linking to custom logic

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_body_limit(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            cache_version: default_cache_version(),
            precache: default_precache(),
            offline_fallback: default_offline_fallback(),
            atomic_precache: default_atomic_precache(),
            sync_tag: default_sync_tag(),
            app_root: default_app_root(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            pool_max_idle_per_host: default_pool_size(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: default_notification_title(),
            default_body: default_notification_body(),
            icon: default_icon(),
            badge: default_badge(),
            vibrate: default_vibrate(),
            explore_title: default_explore_title(),
            close_title: default_close_title(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Helper functions for serde defaults
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit() -> usize {
    10 * 1024 * 1024
}

fn default_origin() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_cache_version() -> String {
    CACHE_VERSION.to_string()
}

fn default_precache() -> Vec<String> {
    PRECACHE_URLS.iter().map(|p| p.to_string()).collect()
}

fn default_offline_fallback() -> String {
    "/index.html".to_string()
}

fn default_atomic_precache() -> bool {
    true
}

fn default_sync_tag() -> String {
    "background-sync".to_string()
}

fn default_app_root() -> String {
    "/".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_pool_size() -> usize {
    10
}

fn default_notification_title() -> String {
    "Offline App".to_string()
}

fn default_notification_body() -> String {
    "You have a new update from the app".to_string()
}

fn default_icon() -> String {
    "/icon-192.png".to_string()
}

fn default_badge() -> String {
    "/icon-72.png".to_string()
}

fn default_vibrate() -> Vec<u32> {
    vec![100, 50, 100]
}

fn default_explore_title() -> String {
    "Open app".to_string()
}

fn default_close_title() -> String {
    "Close".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
