use plotdues_io::NormalizeError;
use plotdues_ledger::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// Sheet could not be read or has no header row. Nothing was written.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// A lookup matched no record.
    #[error("no record found for plot '{0}'")]
    NotFound(String),
    #[error("plotNo is required")]
    MissingKey,
    /// A manually entered field that cannot be stored as given.
    #[error("invalid {field}: '{value}'")]
    InvalidField { field: &'static str, value: String },
}

impl ReconError {
    /// Missing plot number, whichever layer noticed it.
    pub fn is_missing_key(&self) -> bool {
        matches!(self, Self::MissingKey | Self::Ledger(LedgerError::MissingKey))
    }
}
