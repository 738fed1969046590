//! Device registry commands.

use std::str::FromStr;

use anyhow::Result;
use clap::Args;
use trustgate_abac::DeviceUpdate;
use trustgate_types::{Device, DeviceId, DeviceType, TimeWindow, TrustLevel};

use super::{Context, OutputFormat, confirm, open_engine};
use crate::style::{
    DEVICE_COLUMNS, colors::SemanticStyle, device_entries, device_row, print_info_table,
    print_json, print_record_table, print_success,
};

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Device ID.
    pub id: String,

    /// Network the device is attached to.
    #[arg(short, long)]
    pub network: String,

    /// Device type: Sensor, Actuator, or Both.
    #[arg(short = 't', long = "type", value_parser = DeviceType::from_str)]
    pub device_type: DeviceType,

    /// Public key.
    #[arg(long, default_value = "")]
    pub public_key: String,

    /// Security level an actuating user's clearance must match.
    #[arg(short, long, default_value = "")]
    pub security_level: String,

    /// Zone the device is located in.
    #[arg(short, long, default_value = "")]
    pub zone: String,

    /// Start of the access window (inclusive).
    #[arg(long, default_value_t = 0)]
    pub window_start: i64,

    /// End of the access window (inclusive).
    #[arg(long, default_value_t = 0)]
    pub window_end: i64,

    /// Initial trust level (0-100). Defaults to trust.default_level.
    #[arg(long)]
    pub trust: Option<u8>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Device ID.
    pub id: String,

    /// New security level.
    #[arg(short, long)]
    pub security_level: Option<String>,

    /// New zone.
    #[arg(short, long)]
    pub zone: Option<String>,

    /// New window start (requires --window-end).
    #[arg(long, requires = "window_end")]
    pub window_start: Option<i64>,

    /// New window end (requires --window-start).
    #[arg(long, requires = "window_start")]
    pub window_end: Option<i64>,
}

/// Register a device.
pub fn add(ctx: &Context, args: AddArgs) -> Result<()> {
    let config = ctx.config()?;
    let caller = ctx.caller(&config)?;
    let engine = open_engine(&config)?;

    let trust = TrustLevel::new(args.trust.unwrap_or(config.trust.default_level))?;
    let device = Device::new(args.id.as_str(), args.network.as_str(), args.device_type)
        .with_public_key(args.public_key)
        .with_security_level(args.security_level)
        .with_zone(args.zone)
        .with_window(TimeWindow::new(args.window_start, args.window_end))
        .with_trust_level(trust);

    engine.register_device(&caller, device)?;
    print_success(&format!("Registered device {}", args.id.header()));
    Ok(())
}

/// Change a device's access attributes.
pub fn update(ctx: &Context, args: UpdateArgs) -> Result<()> {
    let mut update = DeviceUpdate::default();
    if let Some(level) = args.security_level {
        update = update.security_level(level);
    }
    if let Some(zone) = args.zone {
        update = update.zone(zone);
    }
    if let (Some(start), Some(end)) = (args.window_start, args.window_end) {
        update = update.window(TimeWindow::new(start, end));
    }
    if update.is_empty() {
        anyhow::bail!("Nothing to update. Pass --security-level, --zone, or a window.");
    }

    let config = ctx.config()?;
    let caller = ctx.caller(&config)?;
    let engine = open_engine(&config)?;

    let device = engine.update_device(&caller, &DeviceId::new(args.id), update)?;
    print_success(&format!("Updated device {}", device.id.header()));
    print_info_table(&device_entries(&device));
    Ok(())
}

/// Mark a device deactivated. The record is kept.
pub fn deactivate(ctx: &Context, id: &str, yes: bool) -> Result<()> {
    if !confirm(&format!("Deactivate device {id}?"), yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    let config = ctx.config()?;
    let caller = ctx.caller(&config)?;
    let engine = open_engine(&config)?;

    let device = engine.deactivate_device(&caller, &DeviceId::new(id))?;
    print_success(&format!("Deactivated device {}", device.id.header()));
    Ok(())
}

pub fn show(ctx: &Context, id: &str, format: OutputFormat) -> Result<()> {
    let device = ctx.engine()?.device(&DeviceId::new(id))?;
    match format {
        OutputFormat::Json => print_json(&device),
        OutputFormat::Text => {
            print_info_table(&device_entries(&device));
            Ok(())
        }
    }
}

pub fn list(ctx: &Context, format: OutputFormat) -> Result<()> {
    let devices = ctx.engine()?.devices()?;
    match format {
        OutputFormat::Json => print_json(&devices),
        OutputFormat::Text => {
            let rows: Vec<Vec<String>> = devices.iter().map(device_row).collect();
            print_record_table("device", &DEVICE_COLUMNS, &rows);
            Ok(())
        }
    }
}
