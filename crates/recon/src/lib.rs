//! `plotdues-recon`: reconciles dues sheets into the ledger and answers
//! NOC eligibility queries.
//!
//! Orchestration only: parsing lives in `plotdues-io`, merge rules in
//! `plotdues-core`, persistence in `plotdues-ledger`.

pub mod entry;
pub mod error;
pub mod ingest;
pub mod noc;

pub use entry::ManualEntry;
pub use error::ReconError;
pub use ingest::{Reconciler, SeedOutcome};
pub use noc::{NocEvaluator, NocResult};
