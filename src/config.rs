//! Configuration loading and management
//!
//! Handles parsing of `.join.toml` configuration files. Lookup order is the
//! working directory, then the per-user config directory, then defaults.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::model::{Priority, TaskState};

/// Name of the project-local configuration file
pub const CONFIG_FILENAME: &str = ".join.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Document store connection
    #[serde(default)]
    pub store: StoreConfig,

    /// Identity of the person using this client
    #[serde(default)]
    pub user: UserConfig,

    /// Board defaults
    #[serde(default)]
    pub board: BoardConfig,
}

/// Document store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database root, e.g. `https://<project>.firebasedatabase.app`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Token sent as the `auth` query parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Per-request timeout; requests wait indefinitely when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

/// User configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    /// Contact id assigned to every task this user creates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,
}

/// Board configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Column new tasks start in
    #[serde(default = "default_state")]
    pub default_state: String,

    /// Priority preselected in the task form
    #[serde(default = "default_priority")]
    pub default_priority: String,
}

fn default_state() -> String {
    "todo".to_string()
}

fn default_priority() -> String {
    "Medium".to_string()
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            default_state: default_state(),
            default_priority: default_priority(),
        }
    }
}

impl BoardConfig {
    pub fn state(&self) -> Result<TaskState> {
        self.default_state.parse().map_err(|_| {
            Error::InvalidConfig(format!(
                "board.default_state: invalid state '{}'",
                self.default_state
            ))
        })
    }

    pub fn priority(&self) -> Result<Priority> {
        self.default_priority.parse().map_err(|_| {
            Error::InvalidConfig(format!(
                "board.default_priority: invalid priority '{}'",
                self.default_priority
            ))
        })
    }
}

impl StoreConfig {
    fn validate(&self) -> Result<()> {
        if let Some(url) = &self.base_url {
            let url = url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::InvalidConfig(format!(
                    "store.base_url must start with http:// or https:// (got '{url}')"
                )));
            }
        }
        if self.request_timeout_secs == Some(0) {
            return Err(Error::InvalidConfig(
                "store.request_timeout_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.join.toml` from `dir`, else the user config file, else defaults.
    ///
    /// An unreadable or invalid file falls back to defaults with a warning.
    pub fn load_from_dir(dir: &Path) -> Self {
        let local = dir.join(CONFIG_FILENAME);
        let candidates = [Some(local), Self::user_config_path()];
        for path in candidates.into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            return match Self::load(&path) {
                Ok(config) => config,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "ignoring invalid config");
                    Self::default()
                }
            };
        }
        Self::default()
    }

    /// Per-user config file (`<config dir>/join-board/config.toml`)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "join-board").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.store.validate()?;
        self.board.state()?;
        self.board.priority()?;
        if let Some(contact) = &self.user.contact_id {
            if contact.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "user.contact_id cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
