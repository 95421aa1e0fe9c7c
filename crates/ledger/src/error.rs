use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// A single-record write or delete without a plot number.
    #[error("plotNo is required")]
    MissingKey,
    /// Persisted ledger could not be parsed (only surfaced under `CorruptPolicy::Fail`).
    #[error("ledger file is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),
    #[error("failed to serialize ledger: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
