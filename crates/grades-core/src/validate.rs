#![deny(unsafe_code)]

//! Validation of table mutations against the course schema.
//!
//! Every routine records violations into an [`ErrorSet`] and keeps going, so
//! a caller sees all problems with a request at once.

use grades_model::{CellValue, ColKind, ColumnKind, Course, ErrorCode, ErrorSet, Row};

use crate::Patches;
use crate::rows::RawRows;

/// How a score check treats the empty placeholder cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlankScore {
    Allow,
    Reject,
}

/// Checks that `col_id` may be added as a new, empty column.
pub(crate) fn check_add_column(course: &Course, active: &[String], col_id: &str) -> ErrorSet {
    let mut errors = ErrorSet::new();
    let addable = course
        .col(col_id)
        .is_some_and(|col| col.col_kind() != ColKind::Calc);
    if !addable || active.iter().any(|id| id == col_id) {
        errors.push(
            ErrorCode::BadArg,
            format!("'{col_id}' is not a valid column to add"),
        );
    }
    errors
}

/// Validates a complete row for upsert and returns its row id when present.
///
/// `active` is the established active column set; on the first upsert it is
/// the row's own column set.
pub(crate) fn check_upsert(
    course: &Course,
    active: &[String],
    row: &Row,
    errors: &mut ErrorSet,
) -> Option<String> {
    let added: Vec<&str> = row
        .col_ids()
        .filter(|col_id| !active.iter().any(|id| id == col_id))
        .collect();
    if !added.is_empty() {
        errors.push(
            ErrorCode::BadArg,
            format!("new columns {}", added.join(", ")),
        );
    }
    let missing: Vec<&str> = active
        .iter()
        .map(String::as_str)
        .filter(|col_id| !row.contains(col_id))
        .collect();
    if !missing.is_empty() {
        errors.push(
            ErrorCode::BadArg,
            format!("missing columns {}", missing.join(", ")),
        );
    }

    for (col_id, value) in row.iter() {
        if value.is_null() {
            errors.push(ErrorCode::BadArg, format!("{col_id} is null"));
        }
        let Some(col) = course.col(col_id) else {
            errors.push(ErrorCode::BadArg, format!("unknown column {col_id}"));
            continue;
        };
        match col.kind {
            ColumnKind::Calc(_) => errors.push(
                ErrorCode::BadArg,
                format!("attempt to add data for calculated column {col_id}"),
            ),
            ColumnKind::Score { min, max } if !value.is_null() => {
                check_score(col_id, value, min, max, BlankScore::Allow, errors);
            }
            _ => {}
        }
    }

    match row.get(&course.row_id_col_id) {
        Some(CellValue::Text(id)) if !id.is_empty() => Some(id.clone()),
        Some(CellValue::Text(_)) => {
            errors.push(
                ErrorCode::BadArg,
                format!("empty ID for column {}", course.row_id_col_id),
            );
            None
        }
        _ => {
            errors.push(
                ErrorCode::BadArg,
                format!("no entry for ID column {}", course.row_id_col_id),
            );
            None
        }
    }
}

/// Validates every targeted row/column pair of `patches`.
pub(crate) fn check_patches(
    course: &Course,
    active: &[String],
    rows: &RawRows,
    patches: &Patches,
) -> ErrorSet {
    let mut errors = ErrorSet::new();
    for (row_id, patch) in patches {
        if !rows.contains(row_id) {
            errors.push(ErrorCode::BadArg, format!("unknown row id {row_id}"));
            continue;
        }
        for (col_id, value) in patch.iter() {
            if !active.iter().any(|id| id == col_id) {
                errors.push(ErrorCode::BadArg, format!("unknown column id {col_id}"));
                continue;
            }
            if value.is_null() {
                errors.push(
                    ErrorCode::BadArg,
                    format!("{col_id} is null on row {row_id}"),
                );
                continue;
            }
            if course.is_passthrough(col_id) {
                continue;
            }
            let Some(col) = course.col(col_id) else {
                errors.push(ErrorCode::BadArg, format!("unknown column id {col_id}"));
                continue;
            };
            match col.kind {
                ColumnKind::Calc(_) => errors.push(
                    ErrorCode::BadArg,
                    format!("attempt to patch calculated column {col_id} on row {row_id}"),
                ),
                ColumnKind::Score { min, max } => {
                    let mut cell = ErrorSet::new();
                    check_score(col_id, value, min, max, BlankScore::Reject, &mut cell);
                    if !cell.is_empty() {
                        errors.push(
                            ErrorCode::Range,
                            format!("invalid patch value for {col_id} on row {row_id}"),
                        );
                    }
                }
                ColumnKind::Id | ColumnKind::Info => {}
            }
        }
    }
    errors
}

/// Records a `RANGE` error unless `value` is a number within `[min, max]`.
fn check_score(
    col_id: &str,
    value: &CellValue,
    min: f64,
    max: f64,
    blank: BlankScore,
    errors: &mut ErrorSet,
) {
    match value {
        CellValue::Number(n) if *n < min || *n > max || n.is_nan() => errors.push(
            ErrorCode::Range,
            format!("{col_id} value {value} out of range [{min}, {max}]"),
        ),
        CellValue::Number(_) => {}
        _ if blank == BlankScore::Allow && value.is_blank() => {}
        _ => errors.push(
            ErrorCode::Range,
            format!("{col_id} value '{value}' is not a number"),
        ),
    }
}
