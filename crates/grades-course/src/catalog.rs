#![deny(unsafe_code)]

//! Built-in course catalog.
//!
//! Courses are defined in code and registered by id. The default catalog is
//! built once and shared.
//!
//! ```ignore
//! use grades_course::catalog::default_catalog;
//!
//! let course = default_catalog().get("cs101").expect("known course");
//! let grades = grades_core::Grades::new(course);
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use grades_model::{ColumnKind, Course, CourseError};
use tracing::debug;

use crate::formulas;

/// Registry of courses indexed by course id.
#[derive(Debug, Default)]
pub struct CourseCatalog {
    courses: BTreeMap<String, Arc<Course>>,
}

impl CourseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a course, replacing any course with the same id.
    pub fn register(&mut self, course: Course) {
        debug!(course = %course.id, cols = course.cols().len(), "registered course");
        self.courses.insert(course.id.clone(), Arc::new(course));
    }

    /// Looks up a course by id (case-insensitive).
    pub fn get(&self, id: &str) -> Option<Arc<Course>> {
        self.courses
            .get(id)
            .or_else(|| {
                self.courses
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(id))
                    .map(|(_, course)| course)
            })
            .map(Arc::clone)
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Courses in id order.
    pub fn courses(&self) -> impl Iterator<Item = &Arc<Course>> + '_ {
        self.courses.values()
    }
}

static DEFAULT_CATALOG: OnceLock<CourseCatalog> = OnceLock::new();

/// The catalog of built-in courses, built on first access.
pub fn default_catalog() -> &'static CourseCatalog {
    DEFAULT_CATALOG.get_or_init(build_default_catalog)
}

fn build_default_catalog() -> CourseCatalog {
    let mut catalog = CourseCatalog::new();
    for course in [cs101(), cs220()] {
        match course {
            Ok(course) => catalog.register(course),
            Err(error) => tracing::error!(%error, "built-in course is invalid"),
        }
    }
    catalog
}

fn weights(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
    pairs
        .iter()
        .map(|(col_id, weight)| ((*col_id).to_string(), *weight))
        .collect()
}

/// Intro course: homework, a midterm and a final, weighted into a percentage
/// and a letter grade.
pub fn cs101() -> Result<Course, CourseError> {
    let weights = weights(&[
        ("hw1", 10.0),
        ("hw2", 10.0),
        ("hw3", 10.0),
        ("midterm", 30.0),
        ("final", 40.0),
    ]);
    let cutoffs = vec![
        (90.0, "A".to_string()),
        (80.0, "B".to_string()),
        (70.0, "C".to_string()),
        (60.0, "D".to_string()),
    ];
    Course::builder("cs101", "id")
        .name("Introduction to Programming")
        .id_col("id")
        .named("Student Id")
        .info_col("firstName")
        .named("First Name")
        .info_col("lastName")
        .named("Last Name")
        .score_col("hw1", 0.0, 100.0)
        .score_col("hw2", 0.0, 100.0)
        .score_col("hw3", 0.0, 100.0)
        .score_col("midterm", 0.0, 100.0)
        .named("Midterm")
        .score_col("final", 0.0, 100.0)
        .named("Final")
        .col(
            "total",
            ColumnKind::Calc(formulas::weighted_percent(weights.clone())),
        )
        .named("Total %")
        .col(
            "grade",
            ColumnKind::Calc(formulas::letter_grade(weights, cutoffs, "F")),
        )
        .named("Grade")
        .calc_row("count", formulas::count)
        .calc_row("min", formulas::min)
        .calc_row("max", formulas::max)
        .calc_row("avg", formulas::mean)
        .calc_row("median", formulas::median)
        .calc_row("stddev", formulas::std_dev)
        .build()
}

/// Project course: two projects and a quiz summed into raw points. The
/// `notes` column is passed through patches unchecked.
pub fn cs220() -> Result<Course, CourseError> {
    Course::builder("cs220", "id")
        .name("Systems Programming")
        .id_col("id")
        .named("Student Id")
        .info_col("name")
        .named("Name")
        .score_col("prj1", 0.0, 50.0)
        .named("Project 1")
        .score_col("prj2", 0.0, 50.0)
        .named("Project 2")
        .score_col("quiz", 0.0, 10.0)
        .named("Quiz")
        .info_col("notes")
        .named("Notes")
        .calc_col("points", formulas::sum_scores)
        .named("Points")
        .passthrough("notes")
        .calc_row("avg", formulas::mean)
        .calc_row("max", formulas::max)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_builtin_courses() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("cs101").is_some());
        assert!(catalog.get("CS220").is_some());
        assert!(catalog.get("cs999").is_none());
    }

    #[test]
    fn builtin_courses_are_valid() {
        assert!(cs101().is_ok());
        assert!(cs220().is_ok());
    }
}
