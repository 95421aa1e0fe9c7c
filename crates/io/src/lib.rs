//! `plotdues-io`: tabular input for the dues ledger.
//!
//! Reads the first sheet of an Excel/ODS workbook or a CSV file into a
//! [`Grid`], then turns the grid into keyed [`DuesPatch`] candidates.
//!
//! [`DuesPatch`]: plotdues_core::DuesPatch

pub mod csv;
pub mod error;
pub mod grid;
pub mod normalize;
pub mod serial;
pub mod xlsx;

use std::path::Path;

pub use error::NormalizeError;
pub use grid::{Cell, Grid};
pub use normalize::normalize;

/// How to interpret an in-memory payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// xlsx, xlsm, xlsb, xls or ods (sniffed by calamine)
    Workbook,
    /// Delimited text; the delimiter is sniffed
    Csv,
}

impl SourceFormat {
    /// Pick a format from a file extension. Anything not obviously
    /// delimited text is handed to calamine.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") | Some("tsv") | Some("txt") => Self::Csv,
            _ => Self::Workbook,
        }
    }
}

/// Read the first sheet of a file into a grid.
pub fn read_grid(path: &Path) -> Result<Grid, NormalizeError> {
    match SourceFormat::from_path(path) {
        SourceFormat::Csv => csv::read_grid(path),
        SourceFormat::Workbook => xlsx::read_grid(path),
    }
}

/// Read the first sheet of an uploaded payload into a grid.
pub fn read_grid_from_bytes(bytes: &[u8], format: SourceFormat) -> Result<Grid, NormalizeError> {
    match format {
        SourceFormat::Csv => csv::read_grid_from_bytes(bytes),
        SourceFormat::Workbook => xlsx::read_grid_from_bytes(bytes),
    }
}
