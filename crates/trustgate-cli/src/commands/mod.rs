//! CLI command implementations.

pub mod config;
pub mod device;
pub mod feedback;
pub mod init;
pub mod request;
pub mod user;
pub mod version;

use std::path::Path;

use anyhow::{Context as _, Result};
use clap::ValueEnum;
use trustgate_abac::{AccessEngine, EngineOptions, EvaluationOptions, TrustPolicy, TrustedCallers};
use trustgate_config::{AuthorizationMode, LedgerBackend, ProjectLayout, TrustgateConfig};
use trustgate_ledger::{FileLedger, Ledger, MemoryLedger};

/// The engine the commands run against. The backend is picked at runtime.
pub type Engine = AccessEngine<Box<dyn Ledger>>;

/// Output format for commands that print records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Global options shared by every command that touches the ledger.
#[derive(Debug, Clone)]
pub struct Context {
    pub project_dir: String,
    pub caller: Option<String>,
}

impl Context {
    /// Loads the project configuration.
    ///
    /// An uninitialized directory is only accepted when the configuration
    /// selects the memory backend (e.g. `TRUSTGATE_LEDGER__BACKEND=memory`).
    pub fn config(&self) -> Result<TrustgateConfig> {
        let project_path = Path::new(&self.project_dir);
        let config = TrustgateConfig::load_from_dir(project_path)
            .context("Failed to load configuration")?;

        if config.ledger.backend == LedgerBackend::File
            && !ProjectLayout::new(project_path).is_initialized()
        {
            anyhow::bail!(
                "Project not initialized. Run 'trustgate init' in {} first.",
                project_path.display()
            );
        }

        Ok(config)
    }

    /// Opens the ledger and builds an engine from the project configuration.
    pub fn engine(&self) -> Result<Engine> {
        let config = self.config()?;
        open_engine(&config)
    }

    /// The caller identity for registry operations.
    pub fn caller(&self, config: &TrustgateConfig) -> Result<String> {
        match (&self.caller, config.access.authorization) {
            (Some(caller), _) => Ok(caller.clone()),
            (None, AuthorizationMode::Trusted) => Ok("trustgate-cli".to_string()),
            (None, AuthorizationMode::LedgerAdmin) => anyhow::bail!(
                "This command requires an administrator. Pass --caller <USER_ID> or set TRUSTGATE_CALLER."
            ),
        }
    }
}

/// Builds an engine over the configured ledger backend.
pub fn open_engine(config: &TrustgateConfig) -> Result<Engine> {
    let ledger: Box<dyn Ledger> = match config.ledger.backend {
        LedgerBackend::Memory => Box::new(MemoryLedger::new()),
        LedgerBackend::File => {
            let ledger = FileLedger::open(&config.ledger.path).with_context(|| {
                format!("Failed to open ledger at {}", config.ledger.path.display())
            })?;
            tracing::debug!(path = %ledger.path().display(), fsync = config.ledger.fsync, "Opened file ledger");
            if config.ledger.fsync {
                Box::new(ledger)
            } else {
                Box::new(ledger.without_fsync())
            }
        }
    };

    let options = EngineOptions {
        evaluation: EvaluationOptions::default()
            .with_deny_deactivated(config.access.deny_deactivated),
        trust: TrustPolicy::default().with_auto_deactivate(config.trust.auto_deactivate_at_zero),
    };

    let mut engine = AccessEngine::new(ledger).with_options(options);
    if config.access.authorization == AuthorizationMode::Trusted {
        engine = engine.with_authorizer(TrustedCallers);
    }
    if !config.access.audit {
        engine = engine.without_audit();
    }
    Ok(engine)
}

/// Asks for confirmation unless `yes` is set.
///
/// Without a terminal the prompt fails, so scripts must pass `--yes`.
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("Confirmation needs an interactive terminal; pass --yes to skip it")
}
