//! Profile management
//!
//! Profiles are named store configurations: the container and root prefix to
//! use plus the credentials and timeouts of the Swift endpoint.

use serde::{Deserialize, Serialize};

use crate::auth::AuthOptions;
use crate::config::ConfigManager;
use crate::error::{Error, Result};
use crate::store::StoreOptions;

/// Timeout configuration for a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_ms: u64,

    /// Read timeout in milliseconds
    #[serde(default = "default_read_timeout")]
    pub read_ms: u64,
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_read_timeout() -> u64 {
    30000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: default_connect_timeout(),
            read_ms: default_read_timeout(),
        }
    }
}

/// A profile names one store on one Swift endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Unique name for this profile
    pub name: String,

    /// Container, root prefix and index settings
    #[serde(flatten)]
    pub store: StoreOptions,

    /// Authentication parameters; missing values fall back to the environment
    #[serde(default)]
    pub auth: AuthOptions,

    /// Timeout configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<TimeoutConfig>,
}

impl Profile {
    /// Create a new profile for a container
    pub fn new(name: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store: StoreOptions::new(container),
            auth: AuthOptions::default(),
            timeout: None,
        }
    }

    /// Get the effective timeout configuration
    pub fn timeout_config(&self) -> TimeoutConfig {
        self.timeout.clone().unwrap_or_default()
    }
}

/// Named profiles stored in the configuration file
pub struct ProfileManager {
    config_manager: ConfigManager,
}

impl ProfileManager {
    /// Profiles in the file a specific manager reads
    pub fn with_config_manager(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    /// Profiles in the default configuration file
    pub fn new() -> Result<Self> {
        ConfigManager::new().map(Self::with_config_manager)
    }

    pub fn list(&self) -> Result<Vec<Profile>> {
        Ok(self.config_manager.load()?.profiles)
    }

    /// Look up a profile by name
    pub fn get(&self, name: &str) -> Result<Profile> {
        self.config_manager
            .load()?
            .profile(name)
            .cloned()
            .ok_or_else(|| Error::ProfileNotFound(name.to_string()))
    }

    /// Add a profile or replace the one with the same name
    pub fn set(&self, profile: Profile) -> Result<()> {
        tracing::debug!(profile = %profile.name, "Saving profile");
        self.config_manager.update(|config| {
            config.upsert(profile);
            Ok(())
        })
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        self.config_manager.update(|config| {
            config
                .remove(name)
                .map(drop)
                .ok_or_else(|| Error::ProfileNotFound(name.to_string()))
        })
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.config_manager.load()?.profile(name).is_some())
    }
}
