#![deny(unsafe_code)]

//! Course schema: column definitions and calculated-row definitions.
//!
//! A [`Course`] is consumed read-only by the table store. Formulas are opaque
//! capabilities supplied by whoever builds the course; the store only ever
//! invokes them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CourseError, GradeError};
use crate::row::Row;
use crate::value::CellValue;

/// Row-scoped formula for a calculated column.
pub type ColFn = Arc<dyn Fn(&Course, &Row) -> Result<CellValue, GradeError> + Send + Sync>;

/// Column-scoped aggregate for a calculated row.
pub type RowFn = Arc<dyn Fn(&Course, &[CellValue]) -> Result<CellValue, GradeError> + Send + Sync>;

/// Kind tag of a column, without kind-specific data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColKind {
    Id,
    Info,
    Score,
    Calc,
}

impl ColKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColKind::Id => "id",
            ColKind::Info => "info",
            ColKind::Score => "score",
            ColKind::Calc => "calc",
        }
    }
}

impl fmt::Display for ColKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a column together with its kind-specific data.
#[derive(Clone)]
pub enum ColumnKind {
    Id,
    Info,
    Score { min: f64, max: f64 },
    Calc(ColFn),
}

impl ColumnKind {
    pub fn kind(&self) -> ColKind {
        match self {
            ColumnKind::Id => ColKind::Id,
            ColumnKind::Info => ColKind::Info,
            ColumnKind::Score { .. } => ColKind::Score,
            ColumnKind::Calc(_) => ColKind::Calc,
        }
    }
}

impl fmt::Debug for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Score { min, max } => f
                .debug_struct("Score")
                .field("min", min)
                .field("max", max)
                .finish(),
            other => f.write_str(other.kind().as_str()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub col_id: String,
    pub name: String,
    pub col_index: usize,
    pub kind: ColumnKind,
}

impl ColumnDef {
    pub fn col_kind(&self) -> ColKind {
        self.kind.kind()
    }

    pub fn is_calc(&self) -> bool {
        matches!(self.kind, ColumnKind::Calc(_))
    }

    /// `(min, max)` for score columns.
    pub fn score_range(&self) -> Option<(f64, f64)> {
        match self.kind {
            ColumnKind::Score { min, max } => Some((min, max)),
            _ => None,
        }
    }

    /// Evaluates this column's formula; `None` for non-calc columns.
    pub fn evaluate(&self, course: &Course, row: &Row) -> Option<Result<CellValue, GradeError>> {
        match &self.kind {
            ColumnKind::Calc(f) => Some(f(course, row)),
            _ => None,
        }
    }
}

/// Definition of a synthetic aggregate row.
#[derive(Clone)]
pub struct CalcRow {
    pub row_id: String,
    pub aggregate: RowFn,
}

impl CalcRow {
    pub fn evaluate(&self, course: &Course, values: &[CellValue]) -> Result<CellValue, GradeError> {
        (self.aggregate)(course, values)
    }
}

impl fmt::Debug for CalcRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalcRow")
            .field("row_id", &self.row_id)
            .finish_non_exhaustive()
    }
}

/// Fixed schema of one course's grade table.
#[derive(Debug, Clone)]
pub struct Course {
    pub id: String,
    pub name: String,
    /// Column whose value identifies a row.
    pub row_id_col_id: String,
    /// Column that `patch` passes through without kind or range checks.
    pub passthrough_col_id: Option<String>,
    cols: Vec<ColumnDef>,
    by_id: HashMap<String, usize>,
    calc_rows: Vec<CalcRow>,
}

impl Course {
    pub fn builder(id: impl Into<String>, row_id_col_id: impl Into<String>) -> CourseBuilder {
        CourseBuilder::new(id, row_id_col_id)
    }

    pub fn col(&self, col_id: &str) -> Option<&ColumnDef> {
        self.by_id.get(col_id).map(|&idx| &self.cols[idx])
    }

    /// Column definitions in ascending column-index order.
    pub fn cols(&self) -> &[ColumnDef] {
        &self.cols
    }

    pub fn calc_cols(&self) -> impl Iterator<Item = &ColumnDef> + '_ {
        self.cols.iter().filter(|col| col.is_calc())
    }

    pub fn calc_rows(&self) -> &[CalcRow] {
        &self.calc_rows
    }

    pub fn col_index(&self, col_id: &str) -> Option<usize> {
        self.col(col_id).map(|col| col.col_index)
    }

    /// Sort key for canonical column order; unknown columns sort last.
    pub fn order_key(&self, col_id: &str) -> usize {
        self.col_index(col_id).unwrap_or(usize::MAX)
    }

    pub fn is_passthrough(&self, col_id: &str) -> bool {
        col_id == self.row_id_col_id || self.passthrough_col_id.as_deref() == Some(col_id)
    }
}

/// Assembles a [`Course`], checking the schema is self-consistent.
pub struct CourseBuilder {
    id: String,
    name: Option<String>,
    row_id_col_id: String,
    passthrough_col_id: Option<String>,
    cols: Vec<ColumnDef>,
    calc_rows: Vec<CalcRow>,
}

impl CourseBuilder {
    pub fn new(id: impl Into<String>, row_id_col_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            row_id_col_id: row_id_col_id.into(),
            passthrough_col_id: None,
            cols: Vec::new(),
            calc_rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn passthrough(mut self, col_id: impl Into<String>) -> Self {
        self.passthrough_col_id = Some(col_id.into());
        self
    }

    /// Adds a column; its column index is its position in declaration order.
    #[must_use]
    pub fn col(mut self, col_id: impl Into<String>, kind: ColumnKind) -> Self {
        let col_id = col_id.into();
        let col_index = self.cols.len();
        self.cols.push(ColumnDef {
            name: col_id.clone(),
            col_id,
            col_index,
            kind,
        });
        self
    }

    #[must_use]
    pub fn id_col(self, col_id: impl Into<String>) -> Self {
        self.col(col_id, ColumnKind::Id)
    }

    #[must_use]
    pub fn info_col(self, col_id: impl Into<String>) -> Self {
        self.col(col_id, ColumnKind::Info)
    }

    #[must_use]
    pub fn score_col(self, col_id: impl Into<String>, min: f64, max: f64) -> Self {
        self.col(col_id, ColumnKind::Score { min, max })
    }

    #[must_use]
    pub fn calc_col<F>(self, col_id: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Course, &Row) -> Result<CellValue, GradeError> + Send + Sync + 'static,
    {
        self.col(col_id, ColumnKind::Calc(Arc::new(f)))
    }

    #[must_use]
    pub fn calc_row<F>(mut self, row_id: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Course, &[CellValue]) -> Result<CellValue, GradeError> + Send + Sync + 'static,
    {
        self.calc_rows.push(CalcRow {
            row_id: row_id.into(),
            aggregate: Arc::new(f),
        });
        self
    }

    /// Overrides the display name of the most recently added column.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        if let Some(col) = self.cols.last_mut() {
            col.name = name.into();
        }
        self
    }

    pub fn build(self) -> Result<Course, CourseError> {
        let mut by_id = HashMap::with_capacity(self.cols.len());
        for (idx, col) in self.cols.iter().enumerate() {
            if by_id.insert(col.col_id.clone(), idx).is_some() {
                return Err(CourseError::DuplicateColumn {
                    col_id: col.col_id.clone(),
                });
            }
            if let ColumnKind::Score { min, max } = col.kind
                && min > max
            {
                return Err(CourseError::InvalidRange {
                    col_id: col.col_id.clone(),
                    min,
                    max,
                });
            }
        }

        match by_id.get(&self.row_id_col_id) {
            None => {
                return Err(CourseError::MissingIdColumn {
                    col_id: self.row_id_col_id,
                });
            }
            Some(&idx) if self.cols[idx].col_kind() != ColKind::Id => {
                return Err(CourseError::IdColumnKind {
                    col_id: self.row_id_col_id,
                });
            }
            Some(_) => {}
        }

        if let Some(col_id) = &self.passthrough_col_id
            && !by_id.contains_key(col_id)
        {
            return Err(CourseError::MissingPassthroughColumn {
                col_id: col_id.clone(),
            });
        }

        for (idx, calc_row) in self.calc_rows.iter().enumerate() {
            if self.calc_rows[..idx]
                .iter()
                .any(|other| other.row_id == calc_row.row_id)
            {
                return Err(CourseError::DuplicateCalcRow {
                    row_id: calc_row.row_id.clone(),
                });
            }
        }

        Ok(Course {
            name: self.name.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            row_id_col_id: self.row_id_col_id,
            passthrough_col_id: self.passthrough_col_id,
            cols: self.cols,
            by_id,
            calc_rows: self.calc_rows,
        })
    }
}
