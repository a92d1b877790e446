//! Rendering tables as terminal tables, CSV or JSON.

use anyhow::{Context, Result};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use grades_model::{ColKind, Course, ErrorSet, FullTable, Row, STAT_HDR};
use serde::Serialize;

/// A table flattened to display strings, with column ids as headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Grid {
    /// Stored rows under the active columns.
    pub fn from_raw(col_ids: &[String], rows: &[&Row]) -> Self {
        let rows = rows.iter().map(|row| cells(col_ids, row)).collect();
        Self {
            headers: col_ids.to_vec(),
            rows,
        }
    }

    /// Full rows under the statistic marker plus every column that occurs in
    /// the table, in column-index order.
    pub fn from_full(course: &Course, table: &FullTable) -> Self {
        let mut col_ids: Vec<&str> = Vec::new();
        for row in table {
            for col_id in row.cells.col_ids() {
                if !col_ids.contains(&col_id) {
                    col_ids.push(col_id);
                }
            }
        }
        col_ids.sort_by_key(|col_id| course.order_key(col_id));
        let col_ids: Vec<String> = col_ids.into_iter().map(str::to_string).collect();

        let rows = table
            .iter()
            .map(|row| {
                let mut line = vec![row.stat.clone()];
                line.extend(cells(&col_ids, &row.cells));
                line
            })
            .collect();
        let mut headers = vec![STAT_HDR.to_string()];
        headers.extend(col_ids);
        Self { headers, rows }
    }

    /// # Errors
    ///
    /// Fails only if the CSV writer cannot encode a record.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers).context("write CSV header")?;
        for row in &self.rows {
            writer.write_record(row).context("write CSV record")?;
        }
        let bytes = writer.into_inner().context("flush CSV output")?;
        String::from_utf8(bytes).context("CSV output is not UTF-8")
    }

    /// Terminal table with display names as headers; statistic rows are
    /// highlighted and numeric columns right-aligned.
    pub fn to_table(&self, course: &Course) -> Table {
        let mut table = Table::new();
        table.set_header(
            self.headers
                .iter()
                .map(|col_id| header_cell(display_name(course, col_id))),
        );
        apply_table_style(&mut table);
        for (idx, col_id) in self.headers.iter().enumerate() {
            let numeric = course
                .col(col_id)
                .is_some_and(|col| matches!(col.col_kind(), ColKind::Score | ColKind::Calc));
            if numeric && let Some(column) = table.column_mut(idx) {
                column.set_cell_alignment(CellAlignment::Right);
            }
        }
        let has_stat = self.headers.first().is_some_and(|hdr| hdr == STAT_HDR);
        for row in &self.rows {
            let is_stat = has_stat && row.first().is_some_and(|stat| !stat.is_empty());
            table.add_row(row.iter().map(|value| {
                if is_stat {
                    Cell::new(value).fg(Color::Cyan).add_attribute(Attribute::Bold)
                } else {
                    Cell::new(value)
                }
            }));
        }
        table
    }
}

fn cells(col_ids: &[String], row: &Row) -> Vec<String> {
    col_ids
        .iter()
        .map(|col_id| row.get(col_id).map(ToString::to_string).unwrap_or_default())
        .collect()
}

fn display_name<'a>(course: &'a Course, col_id: &'a str) -> &'a str {
    if col_id == STAT_HDR {
        return "";
    }
    course.col(col_id).map_or(col_id, |col| col.name.as_str())
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

/// JSON document printed by `show --output json`.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a, T> {
    pub course: &'a str,
    pub table: T,
    pub errors: &'a ErrorSet,
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("serialize JSON output")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_grid_fills_missing_cells() {
        let col_ids = vec!["id".to_string(), "hw1".to_string()];
        let row = Row::new().with("id", "s1");
        let grid = Grid::from_raw(&col_ids, &[&row]);
        assert_eq!(grid.rows, vec![vec!["s1".to_string(), String::new()]]);
    }

    #[test]
    fn csv_quotes_embedded_commas() {
        let grid = Grid {
            headers: vec!["id".to_string(), "name".to_string()],
            rows: vec![vec!["s1".to_string(), "Lovelace, Ada".to_string()]],
        };
        assert_eq!(
            grid.to_csv().expect("csv"),
            "id,name\ns1,\"Lovelace, Ada\"\n"
        );
    }
}
