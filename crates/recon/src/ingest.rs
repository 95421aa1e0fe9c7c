use std::path::Path;
use std::sync::Arc;

use plotdues_io::{normalize, read_grid, read_grid_from_bytes, Grid, SourceFormat};
use plotdues_ledger::{LedgerStore, UpsertSummary};
use serde::Serialize;
use tracing::info;

use crate::entry::ManualEntry;
use crate::error::ReconError;

/// Result of a seed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SeedOutcome {
    /// Ledger already had records; the seed file was not read.
    AlreadySeeded { total: usize },
    Seeded(UpsertSummary),
}

/// Feeds normalized sheets and manual entries into the ledger.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<LedgerStore>,
}

impl Reconciler {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Normalize the whole grid, then upsert the candidates in one batch.
    ///
    /// A grid without a header row fails before the ledger is touched.
    pub fn ingest(&self, grid: &Grid) -> Result<UpsertSummary, ReconError> {
        let candidates = normalize(grid)?;
        let summary = self.store.upsert_many(candidates)?;
        info!(
            inserted = summary.inserted,
            updated = summary.updated,
            total = summary.total,
            "ingested dues sheet"
        );
        Ok(summary)
    }

    pub fn ingest_path(&self, path: &Path) -> Result<UpsertSummary, ReconError> {
        let grid = read_grid(path)?;
        self.ingest(&grid)
    }

    pub fn ingest_bytes(&self, bytes: &[u8], format: SourceFormat) -> Result<UpsertSummary, ReconError> {
        let grid = read_grid_from_bytes(bytes, format)?;
        self.ingest(&grid)
    }

    /// Populate an empty ledger from `path`. A non-empty ledger is left as is.
    ///
    /// The emptiness check and the ingest take the store lock separately;
    /// callers that seed concurrently can both see an empty ledger.
    pub fn seed(&self, path: &Path) -> Result<SeedOutcome, ReconError> {
        let total = self.store.len();
        if total > 0 {
            info!(total, "ledger already seeded");
            return Ok(SeedOutcome::AlreadySeeded { total });
        }
        let summary = self.ingest_path(path)?;
        Ok(SeedOutcome::Seeded(summary))
    }

    /// Upsert one manually entered record.
    pub fn upsert_entry(&self, entry: ManualEntry) -> Result<UpsertSummary, ReconError> {
        let patch = entry.into_patch()?;
        Ok(self.store.upsert_one(patch)?)
    }

    /// Delete by plot number. `Ok(false)` when nothing matched.
    pub fn delete(&self, plot_no: &str) -> Result<bool, ReconError> {
        Ok(self.store.delete_by_key(plot_no)?)
    }
}
