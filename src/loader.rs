use crate::error::LoadError;
use crate::schema::{find_column, validate};
use crate::types::{RawTable, SchemaKind, Table};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub filled_cells: usize,
    pub years: Vec<i32>,
}

/// Read and validate a CSV upload from disk.
pub fn load_csv(path: &Path, kind: SchemaKind) -> Result<(Table, LoadReport), LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "csv" {
        return Err(LoadError::UnsupportedFormat(
            path.display().to_string(),
        ));
    }
    info!(path = %path.display(), schema = kind.name(), "loading upload");
    read_csv(File::open(path)?, kind)
}

/// Read any CSV source, fill blank numeric cells with zero, then validate.
pub fn read_csv<R: Read>(reader: R, kind: SchemaKind) -> Result<(Table, LoadReport), LoadError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let mut raw = RawTable {
        headers,
        rows: Vec::new(),
    };
    for result in rdr.records() {
        let record = result?;
        let mut row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
        // Short rows are padded so every column has a cell.
        if row.len() < raw.headers.len() {
            row.resize(raw.headers.len(), String::new());
        }
        // Fully blank lines carry no data.
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        raw.rows.push(row);
    }

    let filled_cells = fill_missing_numeric(&mut raw, kind);
    if filled_cells > 0 {
        debug!(filled_cells, "filled blank numeric cells with 0");
    }

    let table = validate(&raw, kind).map_err(|e| {
        warn!(error = %e, "upload rejected");
        e
    })?;

    let mut years: Vec<i32> = table.records.iter().map(|r| r.year).collect();
    years.sort_unstable();
    years.dedup();

    let report = LoadReport {
        total_rows: table.len(),
        filled_cells,
        years,
    };
    info!(rows = report.total_rows, "upload accepted");
    Ok((table, report))
}

/// Replace empty Amount and count cells with `"0"`. Returns how many
/// cells were filled. Year, Month and package cells are left alone.
pub fn fill_missing_numeric(raw: &mut RawTable, kind: SchemaKind) -> usize {
    let columns: Vec<usize> = kind
        .measures()
        .iter()
        .filter_map(|m| find_column(raw, m.column()))
        .collect();
    let mut filled = 0usize;
    for row in &mut raw.rows {
        for &idx in &columns {
            if let Some(cell) = row.get_mut(idx) {
                if cell.trim().is_empty() {
                    *cell = "0".to_string();
                    filled += 1;
                }
            }
        }
    }
    filled
}
