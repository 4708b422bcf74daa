//! Fixed-width text rendering of result sets.

use rusqlite::types::ValueRef;

use crate::types::ResultSet;

/// Render a single engine value as display text.
pub fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(value) => value.to_string(),
        ValueRef::Real(value) => value.to_string(),
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        ValueRef::Blob(bytes) => format!("<{} byte blob>", bytes.len()),
    }
}

/// Format a result set as fixed-width text: a header line followed by one
/// line per row, columns right-aligned to the widest cell.
pub fn format_table(set: &ResultSet) -> String {
    let mut widths: Vec<usize> = set.columns.iter().map(|name| name.chars().count()).collect();
    for row in &set.rows {
        for (index, value) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(value.chars().count());
            }
        }
    }

    let mut out = format_row(&set.columns, &widths);
    for row in &set.rows {
        out.push_str(&format_row(row, &widths));
    }
    out
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let rendered: Vec<String> = cells
        .iter()
        .zip(widths.iter().copied())
        .map(|(cell, width)| format!("{:>width$}", cell))
        .collect();
    let mut line = rendered.join("  ");
    line.push('\n');
    line
}
