// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{AgentError, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. CLI arguments (highest, applied by the caller)
    /// 2. Environment variables
    /// 3. Config file
    /// 4. Defaults (lowest)
    ///
    /// An explicit `path` must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p.to_path_buf()).required(true),
            None => File::from(Self::default_config_path()).required(false),
        };

        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            .add_source(file)
            // Override with environment variables (OFFLINE_AGENT_AGENT__CACHE_VERSION, ...)
            .add_source(
                Environment::with_prefix("OFFLINE_AGENT")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("agent.precache")
                    .with_list_parse_key("notification.vibrate")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AgentError::Config(e.to_string()))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AgentError::Config(e.to_string()))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject settings the agent cannot run with.
    pub fn validate(&self) -> Result<()> {
        let origin = reqwest::Url::parse(&self.agent.origin).map_err(|e| {
            AgentError::Config(format!("Invalid origin '{}': {}", self.agent.origin, e))
        })?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(AgentError::Config(format!(
                "Origin must be http or https, got '{}'",
                origin.scheme()
            )));
        }
        if self.agent.cache_version.trim().is_empty() {
            return Err(AgentError::Config("cache_version must not be empty".to_string()));
        }
        Ok(())
    }

    fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".offline-agent")
            .join("config.toml")
    }
}
