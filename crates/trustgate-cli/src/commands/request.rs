//! Access request commands.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context as _, Result};
use clap::Args;
use serde_json::json;
use trustgate_abac::AccessRequest;
use trustgate_types::{Request, RequestKey};

use super::{Context, OutputFormat};
use crate::style::{
    colors::{self, SemanticStyle},
    print_info_table, print_json, print_labeled, print_record_table, print_success, print_warn,
};

#[derive(Debug, Args)]
pub struct EvaluateArgs {
    /// Key the evaluated request is stored under.
    pub key: String,

    /// Request type: U2D (user to device) or D2D (device to device).
    #[arg(short = 't', long = "type")]
    pub request_type: String,

    /// Action: Read or Action.
    #[arg(short, long)]
    pub action: String,

    /// Requesting user ID (U2D) or device ID (D2D).
    #[arg(short, long)]
    pub requester: String,

    /// Target device ID.
    #[arg(short, long)]
    pub device: String,

    /// Request time in seconds since the Unix epoch. Defaults to now.
    #[arg(long)]
    pub time: Option<i64>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

fn now() -> Result<i64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("System clock is before the Unix epoch")?;
    Ok(i64::try_from(elapsed.as_secs())?)
}

/// Evaluate a request and store it with its verdict.
///
/// A denial is a successful evaluation and exits zero.
pub fn evaluate(ctx: &Context, args: EvaluateArgs) -> Result<()> {
    let time = match args.time {
        Some(time) => time,
        None => now()?,
    };
    let request = AccessRequest::parse(
        &args.request_type,
        &args.action,
        args.requester,
        args.device.as_str(),
        time,
    )?;

    let engine = ctx.engine()?;
    let key = RequestKey::new(args.key);
    let decision = engine.evaluate(&key, request)?;

    match args.format {
        OutputFormat::Json => print_json(&json!({
            "key": key,
            "permission": decision.permission,
            "rule": decision.rule,
            "reason": decision.reason,
        })),
        OutputFormat::Text => {
            let verdict = format!("{} {}", colors::permission(decision.permission), key.header());
            if decision.is_allowed() {
                print_success(&verdict);
            } else {
                print_warn(&verdict);
            }
            print_labeled("Rule", decision.rule.name());
            print_labeled("Reason", &decision.reason);
            Ok(())
        }
    }
}

fn request_entries(key: &RequestKey, request: &Request) -> Vec<(&'static str, String)> {
    vec![
        ("Key", key.to_string()),
        ("Type", request.request_type.to_string()),
        ("Action", request.action.to_string()),
        ("Requester", request.requester().to_string()),
        ("Device", request.device_id.to_string()),
        ("Time", request.time.to_string()),
        ("Permission", colors::permission(request.permission)),
    ]
}

pub fn show(ctx: &Context, key: &str, format: OutputFormat) -> Result<()> {
    let key = RequestKey::new(key);
    let request = ctx.engine()?.request(&key)?;
    match format {
        OutputFormat::Json => print_json(&request),
        OutputFormat::Text => {
            print_info_table(&request_entries(&key, &request));
            Ok(())
        }
    }
}

/// Print the stored verdict alone, for scripts.
pub fn permission(ctx: &Context, key: &str) -> Result<()> {
    let permission = ctx.engine()?.permission(&RequestKey::new(key))?;
    println!("{permission}");
    Ok(())
}

const REQUEST_COLUMNS: [&str; 7] = [
    "Key", "Type", "Action", "Requester", "Device", "Time", "Permission",
];

pub fn list(ctx: &Context, format: OutputFormat) -> Result<()> {
    let requests = ctx.engine()?.requests()?;
    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = requests
                .iter()
                .map(|(key, request)| json!({ "key": key, "request": request }))
                .collect();
            print_json(&entries)
        }
        OutputFormat::Text => {
            let rows: Vec<Vec<String>> = requests
                .iter()
                .map(|(key, request)| {
                    vec![
                        key.to_string(),
                        request.request_type.to_string(),
                        request.action.to_string(),
                        request.requester_id.clone(),
                        request.device_id.to_string(),
                        request.time.to_string(),
                        colors::permission(request.permission),
                    ]
                })
                .collect();
            print_record_table("request", &REQUEST_COLUMNS, &rows);
            Ok(())
        }
    }
}
