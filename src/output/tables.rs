use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::workflow::Severity;

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

/// Green/red cell for a pass/fail outcome.
pub fn outcome_cell(ok: bool, pass: &str, fail: &str) -> Cell {
    if ok {
        Cell::new(format!("✓ {pass}")).fg(TableColor::Green)
    } else {
        Cell::new(format!("✗ {fail}")).fg(TableColor::Red)
    }
}

/// Like [`outcome_cell`], but a failure is only a warning.
pub fn advisory_cell(ok: bool) -> Cell {
    if ok {
        Cell::new("✓ passed").fg(TableColor::Green)
    } else {
        Cell::new("⚠ advisory").fg(TableColor::Yellow)
    }
}

pub fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Warning => Cell::new("warning").fg(TableColor::Yellow),
        Severity::Info => Cell::new("info").fg(TableColor::Blue),
    }
}
