//! Configuration loader with multi-source merging

use crate::{ProjectLayout, TrustgateConfig, user_config_file};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Prefix of environment overrides.
const ENV_PREFIX: &str = "TRUSTGATE";

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    include_user_config: bool,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            include_user_config: true,
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Skip ~/.config/trustgate/config.toml
    pub fn without_user_config(mut self) -> Self {
        self.include_user_config = false;
        self
    }

    /// Files merged over the defaults, lowest precedence first.
    fn layered_files(&self) -> Vec<PathBuf> {
        let layout = ProjectLayout::new(&self.project_dir);
        let mut files = Vec::with_capacity(3);
        if self.include_user_config {
            if let Ok(user_file) = user_config_file() {
                files.push(user_file);
            }
        }
        files.push(layout.config_file());
        files.push(layout.local_config_file());
        files
    }

    /// Load, validate, and resolve the configuration.
    ///
    /// Precedence, highest first: environment, `trustgate.local.toml`,
    /// `trustgate.toml`, the user file, built-in defaults.
    pub fn load(self) -> Result<TrustgateConfig> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&TrustgateConfig::default())?);

        for file in self.layered_files().into_iter().filter(|f| f.exists()) {
            builder = builder.add_source(
                config::File::from(file.as_path())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Keys contain underscores, so sections nest with a double underscore:
        // TRUSTGATE_LEDGER__BACKEND=memory
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut merged: TrustgateConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        merged.validate()?;
        merged.resolve_paths(&self.project_dir);
        Ok(merged)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuthorizationMode, LedgerBackend};
    use std::fs;
    use tempfile::tempdir;

    fn loader(dir: &Path) -> ConfigLoader {
        ConfigLoader::new()
            .with_project_dir(dir)
            .without_user_config()
    }

    #[test]
    fn test_load_defaults() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config = loader(temp_dir.path()).load().expect("Failed to load config");

        assert_eq!(config.ledger.backend, LedgerBackend::File);
        assert_eq!(config.trust.default_level, 50);
    }

    #[test]
    fn test_load_project_config() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        // Write project config
        let config_content = r#"
[project]
name = "plant-floor"

[ledger]
backend = "memory"

[trust]
auto_deactivate_at_zero = true
default_level = 70

[access]
authorization = "trusted"
deny_deactivated = true
"#;
        fs::write(project_dir.join("trustgate.toml"), config_content)
            .expect("Failed to write config");

        let config = loader(project_dir).load().expect("Failed to load config");

        assert_eq!(config.project.name, "plant-floor");
        assert_eq!(config.ledger.backend, LedgerBackend::Memory);
        assert!(config.trust.auto_deactivate_at_zero);
        assert_eq!(config.trust.default_level, 70);
        assert_eq!(config.access.authorization, AuthorizationMode::Trusted);
        assert!(config.access.deny_deactivated);
        // Unspecified keys keep their defaults.
        assert!(config.access.audit);
    }

    #[test]
    fn test_local_overrides() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        // Write project config
        fs::write(
            project_dir.join("trustgate.toml"),
            r#"
[ledger]
path = "shared/ledger.jsonl"
"#,
        )
        .expect("Failed to write project config");

        // Write local override
        fs::write(
            project_dir.join("trustgate.local.toml"),
            r#"
[ledger]
path = "scratch/ledger.jsonl"
fsync = false
"#,
        )
        .expect("Failed to write local config");

        let config = loader(project_dir).load().expect("Failed to load config");

        // Local config should override project config
        assert_eq!(config.ledger.path, project_dir.join("scratch/ledger.jsonl"));
        assert!(!config.ledger.fsync);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();
        fs::write(
            project_dir.join("trustgate.toml"),
            "[trust]\ndefault_level = 140\n",
        )
        .expect("Failed to write config");

        let err = loader(project_dir).load().unwrap_err();
        assert!(err.to_string().contains("default_level"));
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();
        fs::write(project_dir.join("trustgate.toml"), "[ledger]\nbackend = \"etcd\"\n")
            .expect("Failed to write config");

        assert!(loader(project_dir).load().is_err());
    }

    // Environment overrides use a double underscore between section and key:
    //
    // TRUSTGATE_LEDGER__BACKEND=memory
    // TRUSTGATE_TRUST__AUTO_DEACTIVATE_AT_ZERO=true
    //
    // Setting variables is unsafe under edition 2024, so the CLI integration
    // tests cover this through the child process environment.

    #[test]
    fn test_path_resolution() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        let config = loader(project_dir).load().expect("Failed to load config");

        // Relative paths should be resolved to absolute
        assert!(config.ledger.path.is_absolute());
        assert!(config.ledger.path.starts_with(project_dir));
    }
}
