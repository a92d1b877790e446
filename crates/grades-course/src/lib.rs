//! Formula library and built-in courses for gradebook tables.

pub mod catalog;
pub mod formulas;

pub use catalog::{CourseCatalog, default_catalog};
