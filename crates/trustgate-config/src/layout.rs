//! On-disk layout of a trustgate project.
//!
//! ```text
//! {project}/
//!   trustgate.toml          tracked project config
//!   trustgate.local.toml    untracked overrides
//!   .trustgate/
//!     ledger.jsonl          default journal for the file backend
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::ConfigError;

pub const CONFIG_FILE: &str = "trustgate.toml";
pub const LOCAL_CONFIG_FILE: &str = "trustgate.local.toml";
pub const STATE_DIR: &str = ".trustgate";
pub const LEDGER_FILE: &str = "ledger.jsonl";

/// Files and directories of the project rooted at one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn local_config_file(&self) -> PathBuf {
        self.root.join(LOCAL_CONFIG_FILE)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    /// Journal used when `ledger.path` is left at its default.
    pub fn ledger_file(&self) -> PathBuf {
        self.state_dir().join(LEDGER_FILE)
    }

    pub fn gitignore(&self) -> PathBuf {
        self.root.join(".gitignore")
    }

    /// A project exists once its `trustgate.toml` has been written.
    pub fn is_initialized(&self) -> bool {
        self.config_file().exists()
    }

    /// The default journal path relative to any project root.
    pub fn default_ledger_path() -> PathBuf {
        Path::new(STATE_DIR).join(LEDGER_FILE)
    }
}

/// Per-user defaults, e.g. `~/.config/trustgate/config.toml` on Linux.
pub fn user_config_file() -> Result<PathBuf, ConfigError> {
    ProjectDirs::from("org", "Trustgate", "trustgate")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .ok_or_else(|| ConfigError::XdgError("no home directory for user config".to_string()))
}
