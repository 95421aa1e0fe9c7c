//! `plotdues-ledger`: the persistent, plot-keyed dues ledger.
//!
//! [`LedgerStore`] owns the in-memory snapshot and serializes every read and
//! write through one lock. Bytes reach durable storage through a
//! [`LedgerBackend`], whose [`WriteLock`] keeps writers in other processes
//! out of a read-modify-write cycle.

pub mod backend;
pub mod error;
pub mod store;

pub use backend::{FileBackend, LedgerBackend, MemoryBackend, WriteLock};
pub use error::LedgerError;
pub use store::{CorruptPolicy, LedgerStore, StoreOptions, UpsertSummary, DEFAULT_RECENT_LIMIT};
