// CLI module for offline-agent
// Author: kelexine (https://github.com/kelexine)

use crate::config::StorageBackend;
use clap::Parser;
use std::path::PathBuf;

/// offline-agent - Offline-first caching proxy for a web application
#[derive(Parser, Debug)]
#[command(name = "offline-agent", version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML config file (default: ~/.offline-agent/config.toml)
    #[arg(short, long, env = "OFFLINE_AGENT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Origin of the web application to front, e.g. https://app.example.com
    #[arg(long)]
    pub origin: Option<String>,

    /// Port for the local proxy
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Cache version to install and keep; older stores are evicted
    #[arg(long)]
    pub cache_version: Option<String>,

    /// Cache database file (default: platform cache directory)
    #[arg(long)]
    pub cache_path: Option<PathBuf>,

    /// Keep cache stores in memory only
    #[arg(long)]
    pub in_memory: bool,

    /// Start without delivering install and activate signals
    #[arg(long)]
    pub no_lifecycle: bool,
}

impl Args {
    /// Apply command-line overrides on top of loaded configuration.
    pub fn apply(&self, config: &mut crate::config::AppConfig) {
        if let Some(origin) = &self.origin {
            config.agent.origin = origin.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(version) = &self.cache_version {
            config.agent.cache_version = version.clone();
        }
        if let Some(path) = &self.cache_path {
            config.cache.path = Some(path.clone());
        }
        if self.in_memory {
            config.cache.backend = StorageBackend::Memory;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_overrides_apply() {
        let args = Args::parse_from([
            "offline-agent",
            "--origin",
            "https://app.example.com",
            "--port",
            "9000",
            "--cache-version",
            "app-cache-v3",
        ]);
        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.agent.origin, "https://app.example.com");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.agent.cache_version, "app-cache-v3");
        assert!(!args.no_lifecycle);
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let args = Args::parse_from(["offline-agent"]);
        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.cache.backend, StorageBackend::Sqlite);
        assert!(config.cache.path.is_none());
    }

    #[test]
    fn test_cache_overrides() {
        let args = Args::parse_from([
            "offline-agent",
            "--cache-path",
            "/tmp/agent.db",
            "--in-memory",
        ]);
        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.cache.path, Some(PathBuf::from("/tmp/agent.db")));
        assert_eq!(config.cache.backend, StorageBackend::Memory);
    }
}
