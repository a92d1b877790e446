use std::sync::Arc;

use anyhow::{Result, anyhow};
use comfy_table::Table;
use tracing::{info, info_span, warn};

use grades_cli::ingest::{read_patches_file, read_rows_file};
use grades_cli::logging::redact_value;
use grades_cli::render::{Grid, JsonReport, apply_table_style, to_json};
use grades_core::Grades;
use grades_course::default_catalog;
use grades_model::ErrorSet;

use crate::cli::{OutputArg, ShowArgs};

/// Result of `show`: either rendered output or the validation errors that
/// stopped it.
pub enum ShowOutcome {
    Rendered {
        output: String,
        /// Formula failures; the affected cells are missing from `output`.
        warnings: ErrorSet,
    },
    Rejected(ErrorSet),
}

pub fn run_courses() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Course", "Name", "Columns", "Statistic rows"]);
    apply_table_style(&mut table);
    for course in default_catalog().courses() {
        let stats: Vec<&str> = course
            .calc_rows()
            .iter()
            .map(|calc_row| calc_row.row_id.as_str())
            .collect();
        let cols: Vec<&str> = course.cols().iter().map(|col| col.col_id.as_str()).collect();
        table.add_row(vec![
            course.id.clone(),
            course.name.clone(),
            cols.join(", "),
            stats.join(", "),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_show(args: &ShowArgs) -> Result<ShowOutcome> {
    let course = default_catalog()
        .get(&args.course)
        .ok_or_else(|| anyhow!("unknown course '{}' (see `gradebook courses`)", args.course))?;
    let span = info_span!("show", course = %course.id);
    let _guard = span.enter();

    let rows = read_rows_file(&course, &args.data)?;
    let mut grades = match Grades::from_rows(Arc::clone(&course), rows) {
        Ok(grades) => grades,
        Err(errors) => return Ok(ShowOutcome::Rejected(errors)),
    };
    info!(rows = grades.len(), "loaded rows");

    for col_id in &args.add_columns {
        grades = match grades.add_column(col_id) {
            Ok(next) => next,
            Err(errors) => return Ok(ShowOutcome::Rejected(errors)),
        };
        info!(col_id = %col_id, "added column");
    }

    if let Some(path) = &args.patch {
        let patches = read_patches_file(path)?;
        grades = match grades.patch(&patches) {
            Ok(next) => next,
            Err(errors) => return Ok(ShowOutcome::Rejected(errors)),
        };
        for row_id in patches.keys() {
            info!(row = redact_value(row_id), "patched row");
        }
    }

    if args.raw {
        let col_ids = grades.col_ids().unwrap_or_default();
        let rows = grades.raw_table();
        let output = match args.output {
            OutputArg::Table => Grid::from_raw(col_ids, &rows).to_table(&course).to_string(),
            OutputArg::Csv => Grid::from_raw(col_ids, &rows).to_csv()?,
            OutputArg::Json => to_json(&JsonReport {
                course: &course.id,
                table: &rows,
                errors: &ErrorSet::new(),
            })?,
        };
        return Ok(ShowOutcome::Rendered {
            output,
            warnings: ErrorSet::new(),
        });
    }

    let report = grades.full_table_report();
    for error in &report.errors {
        warn!(%error, "formula failed");
    }
    let output = match args.output {
        OutputArg::Table => Grid::from_full(&course, &report.table)
            .to_table(&course)
            .to_string(),
        OutputArg::Csv => Grid::from_full(&course, &report.table).to_csv()?,
        OutputArg::Json => to_json(&JsonReport {
            course: &course.id,
            table: &report.table,
            errors: &report.errors,
        })?,
    };
    Ok(ShowOutcome::Rendered {
        output,
        warnings: report.errors,
    })
}
