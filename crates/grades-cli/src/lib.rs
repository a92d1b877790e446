//! Library components of the gradebook CLI.

pub mod ingest;
pub mod logging;
pub mod render;
