//! User registry commands.

use anyhow::Result;
use clap::Args;
use trustgate_abac::UserUpdate;
use trustgate_types::{TrustLevel, User, UserId, UserLevel, Validity};

use super::{Context, OutputFormat, confirm, open_engine};
use crate::style::{
    USER_COLUMNS, colors::SemanticStyle, print_info_table, print_json, print_record_table,
    print_success, user_entries, user_row,
};

#[derive(Debug, Args)]
pub struct AddArgs {
    /// User ID.
    pub id: String,

    /// Network the user is attached to (e.g. 127.2.2.0).
    #[arg(short, long)]
    pub network: String,

    /// Access level: Admin, Guest, or any other label.
    #[arg(short, long)]
    pub level: String,

    /// Public key.
    #[arg(long, default_value = "")]
    pub public_key: String,

    /// Clearance compared against actuator security levels.
    #[arg(short, long, default_value = "")]
    pub clearance: String,

    /// Zone the user is located in.
    #[arg(short, long, default_value = "")]
    pub zone: String,

    /// Validity marker ("Not valid" restricts a guest).
    #[arg(long)]
    pub validity: Option<String>,

    /// Initial trust level (0-100). Defaults to trust.default_level.
    #[arg(short, long)]
    pub trust: Option<u8>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// User ID.
    pub id: String,

    /// New access level.
    #[arg(short, long)]
    pub level: Option<String>,

    /// New clearance.
    #[arg(short, long)]
    pub clearance: Option<String>,

    /// New zone.
    #[arg(short, long)]
    pub zone: Option<String>,

    /// New validity marker.
    #[arg(long)]
    pub validity: Option<String>,
}

/// Register a user.
pub fn add(ctx: &Context, args: AddArgs) -> Result<()> {
    let config = ctx.config()?;
    let caller = ctx.caller(&config)?;
    let engine = open_engine(&config)?;

    let trust = TrustLevel::new(args.trust.unwrap_or(config.trust.default_level))?;
    let mut user = User::new(
        args.id.as_str(),
        args.network.as_str(),
        UserLevel::from(args.level.as_str()),
    )
    .with_public_key(args.public_key)
    .with_clearance(args.clearance)
    .with_zone(args.zone)
    .with_trust_level(trust);
    if let Some(validity) = args.validity {
        user = user.with_validity(Validity::new(validity));
    }

    engine.register_user(&caller, user)?;
    print_success(&format!("Registered user {}", args.id.header()));
    Ok(())
}

/// Change a user's access attributes.
pub fn update(ctx: &Context, args: UpdateArgs) -> Result<()> {
    let mut update = UserUpdate::default();
    if let Some(level) = args.level {
        update = update.level(UserLevel::from(level));
    }
    if let Some(clearance) = args.clearance {
        update = update.clearance(clearance);
    }
    if let Some(zone) = args.zone {
        update = update.zone(zone);
    }
    if let Some(validity) = args.validity {
        update = update.validity(Validity::new(validity));
    }
    if update.is_empty() {
        anyhow::bail!("Nothing to update. Pass at least one of --level, --clearance, --zone, --validity.");
    }

    let config = ctx.config()?;
    let caller = ctx.caller(&config)?;
    let engine = open_engine(&config)?;

    let user = engine.update_user(&caller, &UserId::new(args.id), update)?;
    print_success(&format!("Updated user {}", user.id.header()));
    print_info_table(&user_entries(&user));
    Ok(())
}

/// Mark a user deactivated. The record is kept.
pub fn deactivate(ctx: &Context, id: &str, yes: bool) -> Result<()> {
    if !confirm(&format!("Deactivate user {id}?"), yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    let config = ctx.config()?;
    let caller = ctx.caller(&config)?;
    let engine = open_engine(&config)?;

    let user = engine.deactivate_user(&caller, &UserId::new(id))?;
    print_success(&format!("Deactivated user {}", user.id.header()));
    Ok(())
}

pub fn show(ctx: &Context, id: &str, format: OutputFormat) -> Result<()> {
    let user = ctx.engine()?.user(&UserId::new(id))?;
    match format {
        OutputFormat::Json => print_json(&user),
        OutputFormat::Text => {
            print_info_table(&user_entries(&user));
            Ok(())
        }
    }
}

pub fn list(ctx: &Context, format: OutputFormat) -> Result<()> {
    let users = ctx.engine()?.users()?;
    match format {
        OutputFormat::Json => print_json(&users),
        OutputFormat::Text => {
            let rows: Vec<Vec<String>> = users.iter().map(user_row).collect();
            print_record_table("user", &USER_COLUMNS, &rows);
            Ok(())
        }
    }
}
