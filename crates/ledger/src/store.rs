use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{SubsecRound, Utc};
use plotdues_core::{plot_key, DuesPatch, DuesRecord};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::{LedgerBackend, WriteLock};
use crate::error::LedgerError;

/// How many records an empty search returns.
pub const DEFAULT_RECENT_LIMIT: usize = 200;

/// What to do when the persisted ledger cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptPolicy {
    /// Start from an empty ledger. The corrupt file is overwritten on the
    /// next write.
    #[default]
    Reset,
    /// Refuse to open.
    Fail,
}

#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    pub on_corrupt: CorruptPolicy,
    pub recent_limit: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            on_corrupt: CorruptPolicy::Reset,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

/// Counts reported by a batch upsert. `total` is the ledger size afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertSummary {
    pub inserted: usize,
    pub updated: usize,
    pub total: usize,
}

/// The dues ledger: one in-memory snapshot, flushed wholesale to a backend.
///
/// Every operation holds the snapshot lock for its whole duration. Mutations
/// also hold the backend's [`WriteLock`] and start from a fresh read of the
/// backend, so a writer in another process is merged with rather than
/// overwritten. Mutations are computed on a copy and only installed after the
/// flush succeeds.
pub struct LedgerStore {
    backend: Box<dyn LedgerBackend>,
    records: Mutex<Vec<DuesRecord>>,
    options: StoreOptions,
}

impl LedgerStore {
    /// Open the ledger persisted in `backend`.
    ///
    /// A backend with nothing in it is initialized to an empty ledger.
    pub fn open(backend: impl LedgerBackend + 'static, options: StoreOptions) -> Result<Self, LedgerError> {
        let backend: Box<dyn LedgerBackend> = Box::new(backend);

        let records = {
            let _held = backend.lock()?;
            match read_persisted(backend.as_ref(), options.on_corrupt)? {
                Some(records) => records,
                None => {
                    backend.write(&encode(&[])?)?;
                    Vec::new()
                }
            }
        };

        info!(location = %backend.describe(), records = records.len(), "opened ledger");
        Ok(Self {
            backend,
            records: Mutex::new(records),
            options,
        })
    }

    /// The full ledger, in insertion order.
    pub fn load_all(&self) -> Vec<DuesRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Replace the whole ledger.
    pub fn save_all(&self, mut records: Vec<DuesRecord>) -> Result<(), LedgerError> {
        for record in &mut records {
            record.recompute_remaining();
        }
        let mut guard = self.lock();
        let _held = self.backend.lock()?;
        self.flush(&records)?;
        *guard = records;
        Ok(())
    }

    /// Merge a batch of candidates by plot number.
    ///
    /// Candidates without a plot number are skipped. Repeated keys within a
    /// batch apply in order, so the last one wins and counts as an update.
    pub fn upsert_many(&self, candidates: impl IntoIterator<Item = DuesPatch>) -> Result<UpsertSummary, LedgerError> {
        let mut guard = self.lock();
        let (_held, mut next) = self.begin_write()?;

        let mut index: HashMap<String, usize> = next
            .iter()
            .enumerate()
            .map(|(i, record)| (record.key(), i))
            .filter(|(key, _)| !key.is_empty())
            .collect();

        // Millisecond precision, so the snapshot matches what a reload reads
        let now = Utc::now().trunc_subsecs(3);
        let mut summary = UpsertSummary::default();

        for candidate in candidates {
            let key = candidate.key();
            if key.is_empty() {
                continue;
            }

            match index.get(&key) {
                Some(&i) => {
                    next[i].apply(candidate, now);
                    summary.updated += 1;
                }
                None => {
                    next.push(DuesRecord::from_patch(candidate, now));
                    index.insert(key, next.len() - 1);
                    summary.inserted += 1;
                }
            }
        }

        summary.total = next.len();
        self.flush(&next)?;
        *guard = next;

        debug!(inserted = summary.inserted, updated = summary.updated, total = summary.total, "upserted");
        Ok(summary)
    }

    /// Merge one candidate. Unlike [`upsert_many`](Self::upsert_many), a
    /// missing plot number is an error.
    pub fn upsert_one(&self, candidate: DuesPatch) -> Result<UpsertSummary, LedgerError> {
        if !candidate.has_key() {
            return Err(LedgerError::MissingKey);
        }
        self.upsert_many([candidate])
    }

    /// Remove every record whose plot number matches `key`
    /// case-insensitively. Returns whether anything was removed.
    pub fn delete_by_key(&self, key: &str) -> Result<bool, LedgerError> {
        let key = plot_key(key);
        if key.is_empty() {
            return Err(LedgerError::MissingKey);
        }

        let mut guard = self.lock();
        let (_held, current) = self.begin_write()?;
        let next: Vec<DuesRecord> = current.iter().filter(|r| r.key() != key).cloned().collect();
        if next.len() == current.len() {
            *guard = current;
            return Ok(false);
        }

        self.flush(&next)?;
        *guard = next;
        debug!(key = %key, "deleted");
        Ok(true)
    }

    /// Listing query.
    ///
    /// A blank query returns the most recently added records, newest first,
    /// capped at `recent_limit`. Otherwise every record whose plot number
    /// contains the query, in ledger order.
    pub fn search(&self, query: &str) -> Vec<DuesRecord> {
        let query = plot_key(query);
        let guard = self.lock();

        if query.is_empty() {
            return guard.iter().rev().take(self.options.recent_limit).cloned().collect();
        }

        guard.iter().filter(|r| r.key().contains(&query)).cloned().collect()
    }

    /// Single-record lookup: exact plot number first, then the first record
    /// whose plot number contains the query.
    pub fn find(&self, query: &str) -> Option<DuesRecord> {
        let query = plot_key(query);
        if query.is_empty() {
            return None;
        }

        let guard = self.lock();
        guard
            .iter()
            .find(|r| r.key() == query)
            .or_else(|| guard.iter().find(|r| r.key().contains(&query)))
            .cloned()
    }

    /// Take the backend lock and read what is persisted now, which may
    /// include writes made through other handles since this one opened.
    fn begin_write(&self) -> Result<(WriteLock, Vec<DuesRecord>), LedgerError> {
        let held = self.backend.lock()?;
        let records = read_persisted(self.backend.as_ref(), self.options.on_corrupt)?.unwrap_or_default();
        Ok((held, records))
    }

    fn flush(&self, records: &[DuesRecord]) -> Result<(), LedgerError> {
        let bytes = encode(records)?;
        self.backend.write(&bytes)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DuesRecord>> {
        // The snapshot is only replaced after a successful flush, so it is
        // consistent even if a holder panicked.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Decode the persisted ledger. `None` when nothing was ever written.
fn read_persisted(
    backend: &dyn LedgerBackend,
    on_corrupt: CorruptPolicy,
) -> Result<Option<Vec<DuesRecord>>, LedgerError> {
    let Some(bytes) = backend.read()? else {
        return Ok(None);
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Some(Vec::new()));
    }

    match decode(&bytes) {
        Ok(records) => Ok(Some(records)),
        Err(e) => match on_corrupt {
            CorruptPolicy::Reset => {
                warn!(
                    location = %backend.describe(),
                    error = %e,
                    "ledger is unreadable; starting from an empty ledger"
                );
                Ok(Some(Vec::new()))
            }
            CorruptPolicy::Fail => Err(LedgerError::Corrupt(e)),
        },
    }
}

fn encode(records: &[DuesRecord]) -> Result<Vec<u8>, LedgerError> {
    serde_json::to_vec_pretty(records).map_err(LedgerError::Serialize)
}

fn decode(bytes: &[u8]) -> Result<Vec<DuesRecord>, serde_json::Error> {
    let mut records: Vec<DuesRecord> = serde_json::from_slice(bytes)?;
    for record in &mut records {
        record.recompute_remaining();
    }
    Ok(records)
}
