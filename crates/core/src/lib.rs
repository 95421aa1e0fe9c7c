//! `plotdues-core`: shared record types for the plot dues ledger.
//!
//! No IO. Everything here is pure data plus the merge and balance rules
//! that every writer has to agree on.

pub mod amount;
pub mod record;
pub mod text;
pub mod timestamp;

pub use amount::{coerce_amount, remaining_balance};
pub use record::{plot_key, DuesPatch, DuesRecord};
