#![deny(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error taxonomy shared by table validation and formula evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Structural or schema violation: unknown column, calc column written
    /// directly, row/column-set mismatch, unknown row, missing id, null cell.
    BadArg,
    /// A score cell is non-numeric or outside its `[min, max]` bounds.
    Range,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadArg => "BAD_ARG",
            ErrorCode::Range => "RANGE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single violation or formula failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct GradeError {
    pub code: ErrorCode,
    pub message: String,
}

impl GradeError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn bad_arg(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadArg, message)
    }

    pub fn range(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Range, message)
    }
}

/// Accumulates every violation found by one operation.
///
/// Validation threads an `ErrorSet` through all checks instead of stopping at
/// the first failure; the operation only takes effect when the set is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(transparent)]
#[error("{}", join_lines(.errors))]
pub struct ErrorSet {
    errors: Vec<GradeError>,
}

impl ErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, code: ErrorCode, message: impl Into<String>) {
        self.errors.push(GradeError::new(code, message));
    }

    pub fn push_error(&mut self, error: GradeError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, other: ErrorSet) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GradeError> {
        self.errors.iter()
    }

    /// Returns true if any accumulated error carries `code`.
    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|error| error.code == code)
    }

    /// Returns true if some error of `code` mentions `needle` in its message.
    pub fn mentions(&self, code: ErrorCode, needle: &str) -> bool {
        self.errors
            .iter()
            .any(|error| error.code == code && error.message.contains(needle))
    }

    /// Terminal check: `Ok(value)` when nothing was recorded, otherwise the
    /// accumulated errors.
    pub fn into_result<T>(self, value: T) -> Result<T, ErrorSet> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    pub fn into_vec(self) -> Vec<GradeError> {
        self.errors
    }
}

impl From<GradeError> for ErrorSet {
    fn from(error: GradeError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl FromIterator<GradeError> for ErrorSet {
    fn from_iter<I: IntoIterator<Item = GradeError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ErrorSet {
    type Item = GradeError;
    type IntoIter = std::vec::IntoIter<GradeError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorSet {
    type Item = &'a GradeError;
    type IntoIter = std::slice::Iter<'a, GradeError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// One error per line.
fn join_lines(errors: &[GradeError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Errors raised while assembling a [`crate::Course`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CourseError {
    #[error("duplicate column id: {col_id}")]
    DuplicateColumn { col_id: String },

    #[error("identifying column {col_id} is not defined")]
    MissingIdColumn { col_id: String },

    #[error("identifying column {col_id} must be of kind id")]
    IdColumnKind { col_id: String },

    #[error("passthrough column {col_id} is not defined")]
    MissingPassthroughColumn { col_id: String },

    #[error("score column {col_id} has min {min} greater than max {max}")]
    InvalidRange { col_id: String, min: f64, max: f64 },

    #[error("duplicate calculated row: {row_id}")]
    DuplicateCalcRow { row_id: String },
}
