//! Initialize command - creates a new trustgate project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use trustgate_abac::demo_admins;
use trustgate_config::{ProjectLayout, TrustgateConfig};

use super::{confirm, open_engine};
use crate::style::{
    colors::SemanticStyle, print_code_example, print_hint, print_labeled, print_spacer,
    print_success,
};

const GITIGNORE: &str = r"# trustgate local state
.trustgate/

# Local config overrides (not tracked in git)
trustgate.local.toml
";

pub fn run(path: &str, seed: bool, yes: bool) -> Result<()> {
    let project_dir = Path::new(path);
    let layout = ProjectLayout::new(project_dir);

    if layout.is_initialized()
        && !confirm(
            &format!(
                "trustgate.toml already exists in {}. Overwrite it?",
                project_dir.display()
            ),
            yes,
        )?
    {
        println!("Cancelled.");
        return Ok(());
    }

    print_spacer();
    println!("Initializing trustgate project...");
    print_spacer();

    fs::create_dir_all(layout.state_dir())
        .context("Failed to create project directory")?;

    let mut config = TrustgateConfig::default();
    if let Some(name) = project_dir
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
    {
        config.project.name = name;
    }
    let config_content =
        toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
    fs::write(layout.config_file(), config_content)
        .context("Failed to write trustgate.toml")?;
    print_success("Wrote trustgate.toml");

    let gitignore_path = layout.gitignore();
    if !gitignore_path.exists() {
        fs::write(&gitignore_path, GITIGNORE).context("Failed to write .gitignore")?;
        print_success("Created .gitignore");
    }

    if seed {
        let config = TrustgateConfig::load_from_dir(project_dir)
            .context("Failed to load configuration")?;
        let engine = open_engine(&config)?;
        let admins = demo_admins();
        let names: Vec<String> = admins.iter().map(|u| u.id.to_string()).collect();
        engine
            .bootstrap(admins)
            .context("Failed to seed the ledger")?;
        print_success(&format!("Seeded administrators {}", names.join(", ")));
    }

    print_spacer();
    print_success("Project initialized successfully!");
    print_spacer();

    let canonical_path = project_dir
        .canonicalize()
        .unwrap_or_else(|_| project_dir.to_path_buf());
    print_labeled("Location", &canonical_path.display().to_string());
    print_labeled("Config", "trustgate.toml");
    print_labeled("Ledger", &config.ledger.path.display().to_string());

    print_spacer();
    println!("{}", "Next steps:".header());
    if seed {
        print_code_example("trustgate --caller User0 device add Sensor1 --network 127.2.2.0 --type Sensor");
    } else {
        print_hint("Seed the first administrators with 'trustgate init --seed --yes'");
    }
    print_code_example("trustgate request evaluate R1 --type U2D --action Read --requester User0 --device Sensor1");
    print_spacer();

    Ok(())
}
