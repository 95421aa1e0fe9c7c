use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    /// No row carries a "Plot No." style header cell.
    #[error("could not find \"Plot No.\" header row in sheet")]
    HeaderNotFound,
    /// Workbook opened but has no worksheet to read.
    #[error("workbook contains no sheets")]
    NoSheets,
    /// calamine could not open or read the workbook.
    #[error("failed to read workbook: {0}")]
    Workbook(String),
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
