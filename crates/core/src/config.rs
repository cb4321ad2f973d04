//! Configuration file
//!
//! Profiles live in one TOML document at `$ZS_CONFIG_DIR/config.toml`, or
//! `<config dir>/zs/config.toml` when the variable is unset. The document
//! carries a `schema_version`; files written by a newer release are refused
//! rather than silently rewritten.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::profile::Profile;

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "ZS_CONFIG_DIR";

/// Contents of the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub schema_version: u32,

    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            profiles: Vec::new(),
        }
    }
}

impl Config {
    /// Profile with this name
    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Insert a profile, replacing any profile of the same name in place
    pub fn upsert(&mut self, profile: Profile) {
        match self.profiles.iter_mut().find(|p| p.name == profile.name) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
    }

    /// Remove a profile, returning it when it existed
    pub fn remove(&mut self, name: &str) -> Option<Profile> {
        let position = self.profiles.iter().position(|p| p.name == name)?;
        Some(self.profiles.remove(position))
    }
}

/// Default location of the configuration file
fn default_config_path() -> Result<PathBuf> {
    let dir = match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
            .join("zs"),
    };
    Ok(dir.join("config.toml"))
}

/// Reads and writes the configuration file
#[derive(Debug)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Manager for the default configuration file
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(default_config_path()?))
    }

    /// Manager for a specific file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn config_path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration, or an empty one when the file does not exist
    pub fn load(&self) -> Result<Config> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(e.into()),
        };

        let config: Config = toml::from_str(&content)?;
        match config.schema_version.cmp(&SCHEMA_VERSION) {
            std::cmp::Ordering::Equal => Ok(config),
            std::cmp::Ordering::Less => Ok(upgrade(config)),
            std::cmp::Ordering::Greater => Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {SCHEMA_VERSION}. Please upgrade zs.",
                config.schema_version
            ))),
        }
    }

    /// Write the configuration
    ///
    /// The file is readable by its owner only, since profiles may hold keys
    /// and tokens. It is written next to the target and renamed into place.
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        let staging = self.path.with_extension("toml.tmp");
        {
            let mut file = owner_only_file(&staging)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&staging, &self.path)?;

        tracing::debug!(path = %self.path.display(), profiles = config.profiles.len(), "Saved configuration");
        Ok(())
    }

    /// Load, modify and save the configuration
    pub fn update<T>(&self, change: impl FnOnce(&mut Config) -> Result<T>) -> Result<T> {
        let mut config = self.load()?;
        let result = change(&mut config)?;
        self.save(&config)?;
        Ok(result)
    }
}

fn upgrade(mut config: Config) -> Config {
    tracing::info!(
        from = config.schema_version,
        to = SCHEMA_VERSION,
        "Upgrading configuration"
    );
    config.schema_version = SCHEMA_VERSION;
    config
}

#[cfg(unix)]
fn owner_only_file(path: &Path) -> Result<std::fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn owner_only_file(path: &Path) -> Result<std::fs::File> {
    Ok(std::fs::File::create(path)?)
}
