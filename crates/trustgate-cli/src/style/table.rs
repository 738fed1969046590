//! Table formatting using comfy-table.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use trustgate_types::{Device, User};

use super::colors::{self, SemanticStyle};

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled table with a bold header row.
pub fn record_table(columns: &[&str], rows: &[Vec<String>]) -> Table {
    let mut table = base_table();

    let header_cells: Vec<Cell> = columns
        .iter()
        .map(|col| {
            if super::no_color() {
                Cell::new(col)
            } else {
                Cell::new(col)
                    .add_attribute(Attribute::Bold)
                    .fg(Color::Cyan)
            }
        })
        .collect();
    table.set_header(header_cells);

    for row in rows {
        table.add_row(row);
    }

    table
}

/// Prints records as a table with a count footer, or a note when empty.
pub fn print_record_table(noun: &str, columns: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        println!("{}", format!("No {noun}s registered.").muted());
        return;
    }

    println!("{}", record_table(columns, rows));

    let count = rows.len();
    let word = if count == 1 {
        noun.to_string()
    } else {
        format!("{noun}s")
    };
    println!("{}", format!("({count} {word})").muted());
}

/// Creates a key-value info table (two columns: key and value).
pub fn info_table(entries: &[(&str, String)]) -> Table {
    let mut table = base_table();

    for (key, value) in entries {
        let key_cell = if super::no_color() {
            Cell::new(key)
        } else {
            Cell::new(key).fg(Color::DarkGrey)
        };
        table.add_row(vec![key_cell, Cell::new(value)]);
    }

    table
}

/// Prints a key-value info table.
pub fn print_info_table(entries: &[(&str, String)]) {
    println!("{}", info_table(entries));
}

// ============================================================================
// Record Layouts
// ============================================================================

pub const USER_COLUMNS: [&str; 7] = ["ID", "Network", "Level", "Clearance", "Zone", "Trust", "Status"];

pub fn user_row(user: &User) -> Vec<String> {
    vec![
        user.id.to_string(),
        user.network_id.to_string(),
        user.level.to_string(),
        user.clearance.to_string(),
        user.zone.to_string(),
        user.trust_level.to_string(),
        colors::status(user.status),
    ]
}

pub fn user_entries(user: &User) -> Vec<(&'static str, String)> {
    vec![
        ("ID", user.id.to_string()),
        ("Network", user.network_id.to_string()),
        ("Public key", user.public_key.clone()),
        ("Level", user.level.to_string()),
        ("Clearance", user.clearance.to_string()),
        ("Zone", user.zone.to_string()),
        ("Validity", user.validity.to_string()),
        ("Trust level", user.trust_level.to_string()),
        ("Status", colors::status(user.status)),
    ]
}

pub const DEVICE_COLUMNS: [&str; 8] = [
    "ID", "Network", "Type", "Security", "Zone", "Window", "Trust", "Status",
];

pub fn device_row(device: &Device) -> Vec<String> {
    vec![
        device.id.to_string(),
        device.network_id.to_string(),
        device.device_type.to_string(),
        device.security_level.to_string(),
        device.zone.to_string(),
        device.window.to_string(),
        device.trust_level.to_string(),
        colors::status(device.status),
    ]
}

pub fn device_entries(device: &Device) -> Vec<(&'static str, String)> {
    vec![
        ("ID", device.id.to_string()),
        ("Network", device.network_id.to_string()),
        ("Public key", device.public_key.clone()),
        ("Type", device.device_type.to_string()),
        ("Security level", device.security_level.to_string()),
        ("Zone", device.zone.to_string()),
        ("Window", device.window.to_string()),
        ("Trust level", device.trust_level.to_string()),
        ("Status", colors::status(device.status)),
    ]
}
