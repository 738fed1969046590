//! Trust feedback command.

use anyhow::Result;
use trustgate_abac::{Feedback, TrustChange};
use trustgate_types::RequestKey;

use super::{Context, OutputFormat};
use crate::style::{colors::SemanticStyle, print_info_table, print_json, print_success, print_warn};

fn describe(change: &TrustChange) -> String {
    let delta = change.delta();
    let delta = if delta == 0 {
        "±0".muted()
    } else {
        format!("{delta:+}")
    };
    format!("{} → {} ({delta})", change.before, change.after)
}

/// Apply feedback for an evaluated request.
///
/// The exact label `Satisfactory` raises a level by one; any other text,
/// including `satisfactory` in lowercase, lowers it.
pub fn run(
    ctx: &Context,
    key: &str,
    requester_feedback: &str,
    device_feedback: &str,
    format: OutputFormat,
) -> Result<()> {
    let engine = ctx.engine()?;
    let outcome = engine.adjust_trust(
        &RequestKey::new(key),
        &Feedback::from(requester_feedback),
        &Feedback::from(device_feedback),
    )?;

    if format == OutputFormat::Json {
        return print_json(&outcome);
    }

    print_success(&format!("Trust adjusted for request {}", outcome.request_key.header()));
    print_info_table(&[
        ("Requester", outcome.requester.clone()),
        ("Requester trust", describe(&outcome.requester_change)),
        ("Device", outcome.device.to_string()),
        ("Device trust", describe(&outcome.device_change)),
    ]);

    if outcome.requester_change.deactivated {
        print_warn(&format!("{} reached zero trust and was deactivated", outcome.requester));
    }
    if outcome.device_change.deactivated {
        print_warn(&format!("device/{} reached zero trust and was deactivated", outcome.device));
    }
    Ok(())
}
