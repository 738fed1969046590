//! trustgate command-line interface.
//!
//! Attribute-based access decisions and trust feedback for IoT fleets.
//!
//! # Quick Start
//!
//! ```bash
//! # Create a project and seed the demo administrators
//! trustgate init ./plant --seed --yes
//!
//! # Register a device as an administrator
//! trustgate -C ./plant --caller User0 device add Sensor1 --network 127.2.2.0 --type Sensor
//!
//! # Evaluate a request, then report how it went
//! trustgate -C ./plant request evaluate R1 --type U2D --action Read --requester User0 --device Sensor1
//! trustgate -C ./plant feedback R1 Satisfactory Satisfactory
//! ```

mod commands;
mod style;

use std::io::IsTerminal;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{Context, OutputFormat, config::ConfigFormat};

/// trustgate - attribute-based access decisions and trust feedback for IoT fleets.
#[derive(Parser)]
#[command(name = "trustgate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory containing trustgate.toml.
    #[arg(short = 'C', long, global = true, default_value = ".")]
    project_dir: String,

    /// User ID performing registry operations.
    #[arg(long, global = true, env = "TRUSTGATE_CALLER")]
    caller: Option<String>,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Initialize a new project.
    Init {
        /// Project directory to create.
        #[arg(default_value = ".")]
        path: String,

        /// Seed the ledger with the demo administrators User0 and User1.
        #[arg(long)]
        seed: bool,

        /// Overwrite an existing trustgate.toml without asking.
        #[arg(short, long)]
        yes: bool,
    },

    /// Configuration commands.
    #[command(subcommand)]
    Config(ConfigCommands),

    /// User registry commands.
    #[command(subcommand)]
    User(UserCommands),

    /// Device registry commands.
    #[command(subcommand)]
    Device(DeviceCommands),

    /// Access request commands.
    #[command(subcommand)]
    Request(RequestCommands),

    /// Adjust trust levels after an evaluated request.
    Feedback {
        /// Key of the evaluated request.
        key: String,

        /// Feedback about the requester (exactly "Satisfactory" raises trust).
        requester_feedback: String,

        /// Feedback about the target device (exactly "Satisfactory" raises trust).
        device_feedback: String,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the merged configuration.
    Show {
        /// Output format.
        #[arg(short, long, value_enum, default_value_t)]
        format: ConfigFormat,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Register a user.
    Add(commands::user::AddArgs),

    /// Change a user's attributes.
    Update(commands::user::UpdateArgs),

    /// Deactivate a user.
    Deactivate {
        /// User ID.
        id: String,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Show one user.
    Show {
        /// User ID.
        id: String,

        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// List all users.
    List {
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },
}

#[derive(Subcommand)]
enum DeviceCommands {
    /// Register a device.
    Add(commands::device::AddArgs),

    /// Change a device's attributes.
    Update(commands::device::UpdateArgs),

    /// Deactivate a device.
    Deactivate {
        /// Device ID.
        id: String,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Show one device.
    Show {
        /// Device ID.
        id: String,

        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// List all devices.
    List {
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },
}

#[derive(Subcommand)]
enum RequestCommands {
    /// Evaluate a request and store the verdict.
    Evaluate(commands::request::EvaluateArgs),

    /// Show a stored request.
    Show {
        /// Request key.
        key: String,

        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Print the stored permission (ALLOW or DENY).
    Permission {
        /// Request key.
        key: String,
    },

    /// List all stored requests.
    List {
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays parseable. RUST_LOG overrides the level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    style::set_no_color(
        cli.no_color || std::env::var_os("NO_COLOR").is_some() || !std::io::stdout().is_terminal(),
    );

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            style::print_error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let ctx = Context {
        project_dir: cli.project_dir,
        caller: cli.caller,
    };

    match cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
        Commands::Init { path, seed, yes } => commands::init::run(&path, seed, yes),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show { format } => commands::config::show(&ctx, format),
        },
        Commands::User(cmd) => match cmd {
            UserCommands::Add(args) => commands::user::add(&ctx, args),
            UserCommands::Update(args) => commands::user::update(&ctx, args),
            UserCommands::Deactivate { id, yes } => commands::user::deactivate(&ctx, &id, yes),
            UserCommands::Show { id, format } => commands::user::show(&ctx, &id, format),
            UserCommands::List { format } => commands::user::list(&ctx, format),
        },
        Commands::Device(cmd) => match cmd {
            DeviceCommands::Add(args) => commands::device::add(&ctx, args),
            DeviceCommands::Update(args) => commands::device::update(&ctx, args),
            DeviceCommands::Deactivate { id, yes } => {
                commands::device::deactivate(&ctx, &id, yes)
            }
            DeviceCommands::Show { id, format } => commands::device::show(&ctx, &id, format),
            DeviceCommands::List { format } => commands::device::list(&ctx, format),
        },
        Commands::Request(cmd) => match cmd {
            RequestCommands::Evaluate(args) => commands::request::evaluate(&ctx, args),
            RequestCommands::Show { key, format } => commands::request::show(&ctx, &key, format),
            RequestCommands::Permission { key } => commands::request::permission(&ctx, &key),
            RequestCommands::List { format } => commands::request::list(&ctx, format),
        },
        Commands::Feedback {
            key,
            requester_feedback,
            device_feedback,
            format,
        } => commands::feedback::run(
            &ctx,
            &key,
            &requester_feedback,
            &device_feedback,
            format,
        ),
    }
}
