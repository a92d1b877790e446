//! Immutable, schema-validated grade tables.
//!
//! [`Grades`] holds raw per-student rows for one [`grades_model::Course`].
//! Mutations (`add_column`, `upsert_row`, `patch`) validate exhaustively and
//! return a new table; `full_table` derives the presentation view with every
//! calculated column and calculated row evaluated.

mod derive;
mod grades;
mod rows;
mod validate;

use std::collections::BTreeMap;

use grades_model::Row;

pub use crate::derive::FullTableReport;
pub use crate::grades::Grades;

/// Partial updates keyed by row id; each value holds only the changed cells.
pub type Patches = BTreeMap<String, Row>;
