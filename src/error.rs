//! Crate-level error taxonomy
//!
//! Configuration faults (`InvalidColumnSpec`, `InvalidPaginationSpec`) surface
//! before traversal ever starts; `UnsupportedOutputFormat` surfaces at
//! serialization time. Per-field lookup failures during traversal are absorbed
//! by the row extractor and never reach this enum.

use thiserror::Error;

use crate::driver::DriverError;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Invalid column spec: {0}")]
    InvalidColumnSpec(String),

    #[error("Invalid pagination spec: {0}")]
    InvalidPaginationSpec(String),

    #[error("Unsupported output format: {0}. Provide a '.csv' or '.json' file path.")]
    UnsupportedOutputFormat(String),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
