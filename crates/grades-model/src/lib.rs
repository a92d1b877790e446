//! Data model for gradebook tables: course schema, rows and error taxonomy.

pub mod course;
pub mod error;
pub mod row;
pub mod value;

pub use course::{CalcRow, ColFn, ColKind, ColumnDef, ColumnKind, Course, CourseBuilder, RowFn};
pub use error::{CourseError, ErrorCode, ErrorSet, GradeError};
pub use row::{FullRow, Row, STAT_HDR};
pub use value::CellValue;

/// A fully evaluated table.
pub type FullTable = Vec<FullRow>;
