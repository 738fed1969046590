//! Configuration management for trustgate
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. CLI arguments (highest precedence)
//! 2. Environment variables (`TRUSTGATE_*` prefix)
//! 3. trustgate.local.toml (gitignored, local overrides)
//! 4. trustgate.toml (git-tracked, project config)
//! 5. ~/.config/trustgate/config.toml (user defaults)
//! 6. Built-in defaults (lowest precedence)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod error;
mod loader;
mod layout;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use layout::{ProjectLayout, user_config_file};

/// Main trustgate configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustgateConfig {
    pub project: ProjectConfig,
    pub ledger: LedgerConfig,
    pub trust: TrustConfig,
    pub access: AccessConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "trustgate-project".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub backend: LedgerBackend,
    /// Journal file for the `file` backend.
    pub path: PathBuf,
    /// Sync the journal to disk after every commit.
    pub fsync: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: LedgerBackend::File,
            path: ProjectLayout::default_ledger_path(),
            fsync: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LedgerBackend {
    /// Nothing survives the process.
    Memory,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    /// Deactivate a user or device whose trust level reaches zero.
    pub auto_deactivate_at_zero: bool,
    /// Trust level given to newly registered records.
    pub default_level: u8,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            auto_deactivate_at_zero: false,
            default_level: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub authorization: AuthorizationMode,
    /// Log every decision and trust adjustment.
    pub audit: bool,
    /// Deny requests involving a deactivated user or device.
    pub deny_deactivated: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            authorization: AuthorizationMode::LedgerAdmin,
            audit: true,
            deny_deactivated: false,
        }
    }
}

/// Who may manage user and device records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AuthorizationMode {
    /// Callers must be active administrators registered in the ledger.
    LedgerAdmin,
    /// Every caller is allowed.
    Trusted,
}

impl TrustgateConfig {
    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Check values the type system cannot
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.trust.default_level > 100 {
            return Err(ConfigError::ValidationError(format!(
                "trust.default_level must be within 0..=100, got {}",
                self.trust.default_level
            )));
        }
        if self.ledger.backend == LedgerBackend::File && self.ledger.path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "ledger.path is required for the file backend".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve relative paths to absolute
    pub fn resolve_paths(&mut self, base_dir: impl AsRef<Path>) {
        let base = base_dir.as_ref();

        if self.ledger.path.is_relative() {
            self.ledger.path = base.join(&self.ledger.path);
        }
    }
}
