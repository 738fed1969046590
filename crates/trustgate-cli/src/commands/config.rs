//! Configuration commands.

use anyhow::Result;
use clap::ValueEnum;

use super::Context;
use crate::style::{print_json, print_labeled, print_section, print_spacer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    #[default]
    Text,
    Json,
    Toml,
}

/// Show the merged configuration.
pub fn show(ctx: &Context, format: ConfigFormat) -> Result<()> {
    let config = ctx.config()?;

    match format {
        ConfigFormat::Json => print_json(&config)?,
        ConfigFormat::Toml => println!("{}", toml::to_string_pretty(&config)?),
        ConfigFormat::Text => {
            print_section("trustgate configuration");
            print_spacer();

            println!("Project:");
            print_labeled("Name", &config.project.name);
            print_spacer();

            println!("Ledger:");
            print_labeled("Backend", &format!("{:?}", config.ledger.backend));
            print_labeled("Path", &config.ledger.path.display().to_string());
            print_labeled("Fsync", &config.ledger.fsync.to_string());
            print_spacer();

            println!("Trust:");
            print_labeled(
                "Auto-deactivate at zero",
                &config.trust.auto_deactivate_at_zero.to_string(),
            );
            print_labeled("Default level", &config.trust.default_level.to_string());
            print_spacer();

            println!("Access:");
            print_labeled(
                "Authorization",
                &format!("{:?}", config.access.authorization),
            );
            print_labeled("Audit", &config.access.audit.to_string());
            print_labeled(
                "Deny deactivated",
                &config.access.deny_deactivated.to_string(),
            );
        }
    }

    Ok(())
}
