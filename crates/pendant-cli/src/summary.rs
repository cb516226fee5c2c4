//! Table rendering for command output.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use pendant_persistence::{BackupInfo, DomainStatus, FileState, SaveReport};

pub fn status_table(statuses: &[DomainStatus]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Domain"),
        header_cell("File"),
        header_cell("Bytes"),
        header_cell("Records"),
        header_cell("State"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);

    for status in statuses {
        let file_name = status
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = status.bytes.map(|b| b.to_string()).unwrap_or_default();
        let records = match &status.state {
            FileState::Valid { records } => records.to_string(),
            _ => String::new(),
        };
        table.add_row(vec![
            Cell::new(status.domain.label()),
            Cell::new(file_name),
            Cell::new(bytes),
            Cell::new(records),
            state_cell(&status.state),
        ]);
    }
    table
}

pub fn backups_table(backups: &[BackupInfo]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Backup"),
        header_cell("Created"),
        header_cell("Files"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);

    for backup in backups {
        table.add_row(vec![
            Cell::new(&backup.name),
            Cell::new(backup.created.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(backup.domains.len()),
        ]);
    }
    table
}

pub fn save_table(report: &SaveReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Domain"), header_cell("Result")]);
    apply_table_style(&mut table);

    for (domain, result) in &report.results {
        let cell = match result {
            Ok(outcome) => Cell::new(format!("{outcome:?}").to_lowercase()).fg(Color::Green),
            Err(e) => Cell::new(e.user_message()).fg(Color::Red),
        };
        table.add_row(vec![Cell::new(domain.label()), cell]);
    }
    table
}

fn state_cell(state: &FileState) -> Cell {
    match state {
        FileState::Valid { .. } => Cell::new("ok").fg(Color::Green),
        FileState::Empty => Cell::new("empty").fg(Color::Yellow),
        FileState::Missing => Cell::new("missing").fg(Color::Yellow),
        FileState::Corrupt { reason } => Cell::new(format!("corrupt: {reason}")).fg(Color::Red),
        FileState::Unreadable { reason } => {
            Cell::new(format!("unreadable: {reason}")).fg(Color::Red)
        }
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}
