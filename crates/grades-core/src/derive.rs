#![deny(unsafe_code)]

//! Derivation of the full table from raw rows.
//!
//! Stages, in order:
//!
//! 1. wrap every raw row with an empty statistic marker;
//! 2. column pass: evaluate calculated columns for ordinary rows (cached);
//! 3. row pass: append one aggregate row per calculated-row definition;
//! 4. column pass again over the whole table, so aggregate rows get
//!    calculated-column values too (not cached).
//!
//! Formula failures never abort derivation. The failing cell is left out of
//! its row and the failure is reported alongside the table.

use grades_model::{
    CellValue, ColKind, ColumnDef, Course, ErrorSet, FullRow, FullTable, GradeError, Row,
};
use tracing::{trace, warn};

use crate::rows::RawRows;

/// A derived table together with the formula failures met while building it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FullTableReport {
    pub table: FullTable,
    pub errors: ErrorSet,
}

/// Which column-pass failures are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Record {
    AllRows,
    /// Ordinary rows were already reported by the cached pass.
    StatisticRows,
}

/// Stage 1: ordinary rows with an empty statistic marker.
pub(crate) fn wrap_rows(rows: &RawRows) -> FullTable {
    rows.iter()
        .map(|(_, row)| FullRow::ordinary(Row::clone(row)))
        .collect()
}

/// Evaluates every calculated column against each row of `table`.
///
/// Each formula sees the row as it was before this pass; results are placed
/// in column-index order.
pub(crate) fn column_pass(
    course: &Course,
    table: &[FullRow],
    record: Record,
    errors: &mut ErrorSet,
) -> FullTable {
    let mut out = Vec::with_capacity(table.len());
    for row in table {
        let mut next = row.clone();
        for col in course.calc_cols() {
            let Some(result) = col.evaluate(course, &row.cells) else {
                continue;
            };
            match result {
                Ok(value) => next.cells.insert(col.col_id.clone(), value),
                Err(_) if record == Record::StatisticRows && !row.is_statistic() => {}
                Err(error) => {
                    let label = row_label(course, row);
                    warn!(
                        course = %course.id,
                        col_id = %col.col_id,
                        code = %error.code,
                        "calculated column failed: {}",
                        error.message
                    );
                    errors.push_error(GradeError::new(
                        error.code,
                        format!("{} on row {label}: {}", col.col_id, error.message),
                    ));
                }
            }
        }
        next.cells.sort_by_key(|col_id| course.order_key(col_id));
        out.push(next);
    }
    trace!(course = %course.id, rows = out.len(), "column pass complete");
    out
}

/// Builds one aggregate row per calculated-row definition.
///
/// Score and calc columns are aggregated over the values found in `table`, in
/// row order; other active columns hold the empty placeholder.
pub(crate) fn row_pass(
    course: &Course,
    active: &[String],
    table: &[FullRow],
    errors: &mut ErrorSet,
) -> FullTable {
    let mut out = Vec::with_capacity(course.calc_rows().len());
    for calc_row in course.calc_rows() {
        let mut cells = Row::with_capacity(active.len());
        for col_id in active {
            let kind = course.col(col_id).map(ColumnDef::col_kind);
            if !matches!(kind, Some(ColKind::Score | ColKind::Calc)) {
                cells.insert(col_id.clone(), CellValue::empty());
                continue;
            }
            let values = column_values(table, col_id);
            match calc_row.evaluate(course, &values) {
                Ok(value) => cells.insert(col_id.clone(), value),
                Err(error) => {
                    warn!(
                        course = %course.id,
                        row_id = %calc_row.row_id,
                        col_id = %col_id,
                        code = %error.code,
                        "calculated row failed: {}",
                        error.message
                    );
                    errors.push_error(GradeError::new(
                        error.code,
                        format!(
                            "{} for column {col_id}: {}",
                            calc_row.row_id, error.message
                        ),
                    ));
                }
            }
        }
        out.push(FullRow::statistic(calc_row.row_id.clone(), cells));
    }
    trace!(course = %course.id, rows = out.len(), "row pass complete");
    out
}

/// Values of `col_id` across `table`, skipping rows that lack the column.
fn column_values(table: &[FullRow], col_id: &str) -> Vec<CellValue> {
    table
        .iter()
        .filter_map(|row| row.get(col_id).cloned())
        .collect()
}

fn row_label(course: &Course, row: &FullRow) -> String {
    if row.is_statistic() {
        return row.stat.clone();
    }
    row.get(&course.row_id_col_id)
        .map(ToString::to_string)
        .unwrap_or_default()
}
