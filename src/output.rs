use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tabled::{settings::Style, Table as TextTable, Tabled};
use tracing::info;

use crate::engine::with_derived;
use crate::error::ExportError;
use crate::types::{Measure, SchemaKind, Table, COL_MONTH, COL_PACKAGE, COL_YEAR};
use crate::util::{format_int, format_number};

fn export_headers(kind: SchemaKind, derived: bool) -> Vec<&'static str> {
    let mut headers = vec![COL_MONTH, COL_YEAR, COL_PACKAGE];
    headers.extend(kind.count_measures().iter().map(|m| m.column()));
    headers.push(Measure::Amount.column());
    if derived {
        match kind {
            SchemaKind::Solo => headers.push("Average Value"),
            SchemaKind::Firm => headers.extend(["Users per Firm", "Revenue per User", "Revenue per Firm"]),
        }
    }
    headers
}

/// Write `table` as delimited text for download.
///
/// Amount and ratio columns get 2 decimals and thousands separators,
/// count columns thousands separators, Year is left as is. An empty
/// table writes only the header row.
pub fn write_export<W: Write>(writer: W, table: &Table, derived: bool) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(export_headers(table.kind, derived))?;
    for d in with_derived(table) {
        let r = &d.record;
        let mut row = vec![r.month.to_string(), r.year.to_string(), r.package.clone()];
        for m in table.kind.count_measures() {
            row.push(format_int(r.measure(*m) as u64));
        }
        row.push(format_number(r.amount, 2));
        if derived {
            match table.kind {
                SchemaKind::Solo => row.push(format_number(d.average_value, 2)),
                SchemaKind::Firm => {
                    row.push(format_number(d.users_per_firm, 2));
                    row.push(format_number(d.revenue_per_user, 2));
                    row.push(format_number(d.revenue_per_firm, 2));
                }
            }
        }
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_to_path(path: &Path, table: &Table, derived: bool) -> Result<(), ExportError> {
    write_export(File::create(path)?, table, derived)?;
    info!(path = %path.display(), rows = table.len(), "exported filtered table");
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ExportError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", render_preview(rows, max_rows));
}

pub fn render_preview<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)\n".to_string();
    }
    let table_str = TextTable::new(slice).with(Style::markdown()).to_string();
    format!("{}\n", table_str)
}
