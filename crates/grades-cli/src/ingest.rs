//! Reading student rows from CSV and patches from JSON.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use grades_core::Patches;
use grades_model::{CellValue, ColKind, Course, Row};
use tracing::{debug, info};

use crate::logging::redact_value;

/// Reads one row per CSV record. The header row names the column ids.
///
/// Score cells that parse as numbers become numbers; empty cells become the
/// empty placeholder; everything else stays text so the store can report it.
pub fn read_rows<R: Read>(course: &Course, reader: R) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = reader.headers().context("read CSV header")?.clone();
    if headers.is_empty() {
        bail!("CSV header is empty");
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("read CSV record {}", idx + 1))?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(col_id, field)| (col_id, parse_cell(course, col_id, field)))
            .collect();
        if let Some(id) = row.get(&course.row_id_col_id) {
            debug!(row = idx + 1, id = redact_value(&id.to_string()), "read row");
        }
        rows.push(row);
    }
    info!(course = %course.id, rows = rows.len(), "read CSV rows");
    Ok(rows)
}

pub fn read_rows_file(course: &Course, path: &Path) -> Result<Vec<Row>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    read_rows(course, file).with_context(|| format!("load {}", path.display()))
}

fn parse_cell(course: &Course, col_id: &str, field: &str) -> CellValue {
    if field.is_empty() {
        return CellValue::empty();
    }
    let is_score = course
        .col(col_id)
        .is_some_and(|col| col.col_kind() == ColKind::Score);
    if is_score && let Ok(value) = field.parse::<f64>() {
        return CellValue::Number(value);
    }
    CellValue::from(field)
}

/// Reads a JSON object mapping row ids to partial rows.
pub fn read_patches<R: Read>(reader: R) -> Result<Patches> {
    let patches: Patches = serde_json::from_reader(reader).context("parse patch JSON")?;
    info!(rows = patches.len(), "read patches");
    Ok(patches)
}

pub fn read_patches_file(path: &Path) -> Result<Patches> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    read_patches(file).with_context(|| format!("load {}", path.display()))
}
