#![deny(unsafe_code)]

use std::sync::{Arc, OnceLock};

use grades_model::{CellValue, Course, ErrorCode, ErrorSet, FullTable, GradeError, Row};
use tracing::debug;

use crate::Patches;
use crate::derive::{self, FullTableReport, Record};
use crate::rows::RawRows;
use crate::validate;

/// Immutable grade table for one course.
///
/// Every mutation validates its input against the course schema and returns
/// a new `Grades`; the receiver is never changed. Successors share the rows
/// they did not touch with their predecessor.
///
/// The full-table derivation for ordinary rows is computed at most once per
/// instance and cached on it.
#[derive(Debug, Clone)]
pub struct Grades {
    course: Arc<Course>,
    /// Active column ids in column-index order, `None` until established.
    col_ids: Option<Arc<[String]>>,
    rows: RawRows,
    canonical: OnceLock<Arc<FullTableReport>>,
}

impl Grades {
    /// An empty table with no established column set.
    pub fn new(course: Arc<Course>) -> Self {
        Self {
            course,
            col_ids: None,
            rows: RawRows::default(),
            canonical: OnceLock::new(),
        }
    }

    /// Builds a table by upserting `rows` in order.
    ///
    /// # Errors
    ///
    /// Returns the violations of the first rejected row, each prefixed with
    /// the row's position.
    pub fn from_rows<I>(course: Arc<Course>, rows: I) -> Result<Self, ErrorSet>
    where
        I: IntoIterator<Item = Row>,
    {
        let mut grades = Grades::new(course);
        for (idx, row) in rows.into_iter().enumerate() {
            grades = grades.upsert_row(row).map_err(|errors| {
                errors
                    .into_iter()
                    .map(|error| {
                        GradeError::new(error.code, format!("row {}: {}", idx + 1, error.message))
                    })
                    .collect::<ErrorSet>()
            })?;
        }
        Ok(grades)
    }

    fn derived(&self, col_ids: Option<Arc<[String]>>, rows: RawRows) -> Self {
        Self {
            course: Arc::clone(&self.course),
            col_ids,
            rows,
            canonical: OnceLock::new(),
        }
    }

    pub fn course(&self) -> &Arc<Course> {
        &self.course
    }

    /// Active column ids in column-index order, or `None` before the first
    /// upsert or column addition.
    pub fn col_ids(&self) -> Option<&[String]> {
        self.col_ids.as_deref()
    }

    /// Row ids in first-insertion order.
    pub fn row_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows.ids()
    }

    pub fn row(&self, row_id: &str) -> Option<&Row> {
        self.rows.get(row_id).map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.len() == 0
    }

    fn active(&self) -> &[String] {
        self.col_ids.as_deref().unwrap_or(&[])
    }

    fn canonical_order(&self, ids: impl IntoIterator<Item = String>) -> Arc<[String]> {
        let mut ids: Vec<String> = ids.into_iter().collect();
        ids.sort_by_key(|id| self.course.order_key(id));
        ids.into()
    }

    /// Adds an empty column: every existing row gains `col_id` holding the
    /// empty placeholder.
    ///
    /// # Errors
    ///
    /// `BAD_ARG` if `col_id` is unknown, a calc column, or already active.
    pub fn add_column(&self, col_id: &str) -> Result<Grades, ErrorSet> {
        validate::check_add_column(&self.course, self.active(), col_id).into_result(())?;

        let col_ids = self.canonical_order(
            self.active()
                .iter()
                .cloned()
                .chain(std::iter::once(col_id.to_string())),
        );
        let course = &self.course;
        let rows = self.rows.map_rows(|row| {
            let mut next = row.clone();
            next.insert(col_id, CellValue::empty());
            next.sort_by_key(|id| course.order_key(id));
            next
        });
        debug!(course = %self.course.id, col_id, rows = rows.len(), "added column");
        Ok(self.derived(Some(col_ids), rows))
    }

    /// Applies partial row updates.
    ///
    /// Validation covers every targeted cell before anything is applied; on
    /// success only the patched rows are copied.
    ///
    /// # Errors
    ///
    /// `BAD_ARG` for unknown rows or columns and for calc columns, `RANGE` for
    /// score values that are non-numeric or out of bounds. All violations are
    /// returned together and the table is left as it was.
    pub fn patch(&self, patches: &Patches) -> Result<Grades, ErrorSet> {
        validate::check_patches(&self.course, self.active(), &self.rows, patches)
            .into_result(())?;

        let updates = patches.iter().filter_map(|(row_id, patch)| {
            self.rows.get(row_id).map(|row| {
                let mut next = Row::clone(row);
                next.merge(patch);
                (row_id.clone(), next)
            })
        });
        let rows = self.rows.with_replaced(updates);
        debug!(course = %self.course.id, rows = patches.len(), "patched rows");
        Ok(self.derived(self.col_ids.clone(), rows))
    }

    /// Inserts or replaces a complete row, keyed by its identifying column.
    ///
    /// The first upsert into a table without an established column set makes
    /// the row's columns the active set.
    ///
    /// # Errors
    ///
    /// `BAD_ARG` for column-set mismatches, unknown or calc columns, null
    /// cells and a missing row id; `RANGE` for bad score values. All
    /// violations are returned together.
    pub fn upsert_row(&self, mut row: Row) -> Result<Grades, ErrorSet> {
        let col_ids = match &self.col_ids {
            Some(col_ids) => Arc::clone(col_ids),
            None => self.canonical_order(row.col_ids().map(str::to_string)),
        };

        let mut errors = ErrorSet::new();
        let row_id = validate::check_upsert(&self.course, &col_ids, &row, &mut errors);
        let Some(row_id) = errors.into_result(row_id)? else {
            return Err(GradeError::new(
                ErrorCode::BadArg,
                format!("no entry for ID column {}", self.course.row_id_col_id),
            )
            .into());
        };

        row.sort_by_key(|id| self.course.order_key(id));
        let rows = self.rows.with_row(row_id, row);
        debug!(course = %self.course.id, rows = rows.len(), "upserted row");
        Ok(self.derived(Some(col_ids), rows))
    }

    /// Stored raw rows. Row order is unspecified; columns within a row follow
    /// column-index order.
    pub fn raw_table(&self) -> Vec<&Row> {
        if self.col_ids.is_none() {
            return Vec::new();
        }
        self.rows.iter().map(|(_, row)| Arc::as_ref(row)).collect()
    }

    /// Ordinary rows with calculated columns evaluated; cached per instance.
    pub fn canonical_table(&self) -> &FullTable {
        &self.canonical_report().table
    }

    fn canonical_report(&self) -> &Arc<FullTableReport> {
        self.canonical.get_or_init(|| {
            let mut errors = ErrorSet::new();
            let wrapped = derive::wrap_rows(&self.rows);
            let table = derive::column_pass(&self.course, &wrapped, Record::AllRows, &mut errors);
            debug!(
                course = %self.course.id,
                rows = table.len(),
                errors = errors.len(),
                "derived canonical table"
            );
            Arc::new(FullTableReport { table, errors })
        })
    }

    /// The full presentation table: ordinary rows followed by one row per
    /// calculated-row definition, all with calculated columns evaluated.
    ///
    /// Cells whose formula failed are omitted; see [`Grades::full_table_report`]
    /// for the failures.
    pub fn full_table(&self) -> FullTable {
        self.full_table_report().table
    }

    /// [`Grades::full_table`] together with every formula failure.
    pub fn full_table_report(&self) -> FullTableReport {
        let canonical = self.canonical_report();
        let mut errors = canonical.errors.clone();
        let mut table = canonical.table.clone();
        let stats = derive::row_pass(&self.course, self.active(), &canonical.table, &mut errors);
        table.extend(stats);
        let table = derive::column_pass(&self.course, &table, Record::StatisticRows, &mut errors);
        FullTableReport { table, errors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course() -> Arc<Course> {
        Arc::new(
            Course::builder("cs101", "id")
                .id_col("id")
                .score_col("hw1", 0.0, 100.0)
                .score_col("hw2", 0.0, 100.0)
                .build()
                .expect("build course"),
        )
    }

    #[test]
    fn patch_copies_only_touched_rows() {
        let grades = Grades::from_rows(
            course(),
            [
                Row::new().with("id", "s1").with("hw1", 10),
                Row::new().with("id", "s2").with("hw1", 20),
            ],
        )
        .expect("load rows");
        let patches = Patches::from([("s1".to_string(), Row::new().with("hw1", 11))]);
        let next = grades.patch(&patches).expect("patch");

        let arc = |g: &Grades, id: &str| Arc::clone(g.rows.get(id).expect("row"));
        assert!(Arc::ptr_eq(&arc(&grades, "s2"), &arc(&next, "s2")));
        assert!(!Arc::ptr_eq(&arc(&grades, "s1"), &arc(&next, "s1")));
    }

    #[test]
    fn canonical_table_is_computed_once() {
        let grades = Grades::from_rows(course(), [Row::new().with("id", "s1").with("hw1", 10)])
            .expect("load rows");
        let first: *const FullTable = grades.canonical_table();
        let second: *const FullTable = grades.canonical_table();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn active_columns_follow_column_index() {
        let grades = Grades::new(course())
            .upsert_row(Row::new().with("hw2", 1).with("id", "s1"))
            .expect("first upsert");
        assert_eq!(
            grades.col_ids(),
            Some(&["id".to_string(), "hw2".to_string()][..])
        );
        let grades = grades.add_column("hw1").expect("add hw1");
        assert_eq!(
            grades.col_ids(),
            Some(&["id".to_string(), "hw1".to_string(), "hw2".to_string()][..])
        );
    }
}
