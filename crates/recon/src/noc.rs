use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use plotdues_core::{remaining_balance, timestamp, DuesRecord};
use plotdues_ledger::LedgerStore;
use serde::Serialize;
use tracing::info;

use crate::error::ReconError;

/// Eligibility for a No Objection Certificate, as of `issued_at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NocResult {
    pub plot_no: String,
    pub owner_name: String,
    pub address: String,
    pub contact: String,
    pub total_dues: f64,
    pub amount_paid: f64,
    pub remaining: f64,
    pub dues_status: String,
    pub po_no: String,
    #[serde(with = "timestamp::option")]
    pub po_date: Option<DateTime<Utc>>,
    pub can_issue: bool,
    #[serde(with = "timestamp")]
    pub issued_at: DateTime<Utc>,
}

impl NocResult {
    fn from_record(record: DuesRecord, issued_at: DateTime<Utc>) -> Self {
        let remaining = remaining_balance(record.total_dues, record.amount_paid);
        let can_issue = record.is_settled();
        Self {
            plot_no: record.plot_no,
            owner_name: record.owner_name.unwrap_or_default(),
            address: record.address.unwrap_or_default(),
            contact: record.contact.unwrap_or_default(),
            total_dues: record.total_dues,
            amount_paid: record.amount_paid,
            remaining,
            dues_status: record.dues_status.unwrap_or_default(),
            po_no: record.po_no.unwrap_or_default(),
            po_date: record.po_date,
            can_issue,
            issued_at,
        }
    }
}

/// Read-only NOC lookups against the ledger.
#[derive(Clone)]
pub struct NocEvaluator {
    store: Arc<LedgerStore>,
}

impl NocEvaluator {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    pub fn evaluate(&self, query: &str) -> Result<NocResult, ReconError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ReconError::MissingKey);
        }

        let record = self
            .store
            .find(query)
            .ok_or_else(|| ReconError::NotFound(query.to_string()))?;

        let result = NocResult::from_record(record, Utc::now().trunc_subsecs(3));
        info!(
            plot = %result.plot_no,
            remaining = result.remaining,
            can_issue = result.can_issue,
            "evaluated NOC"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotdues_core::DuesPatch;
    use plotdues_ledger::{MemoryBackend, StoreOptions};

    fn evaluator_with(patches: Vec<DuesPatch>) -> NocEvaluator {
        let store = LedgerStore::open(MemoryBackend::new(), StoreOptions::default()).unwrap();
        store.upsert_many(patches).unwrap();
        NocEvaluator::new(Arc::new(store))
    }

    fn dues(plot: &str, total: f64, paid: f64) -> DuesPatch {
        DuesPatch {
            total_dues: Some(total),
            amount_paid: Some(paid),
            ..DuesPatch::new(plot)
        }
    }

    #[test]
    fn test_fully_paid_can_issue() {
        let noc = evaluator_with(vec![dues("B-7", 1000.0, 1000.0)]);
        let result = noc.evaluate("b-7").unwrap();

        assert_eq!(result.plot_no, "B-7");
        assert_eq!(result.remaining, 0.0);
        assert!(result.can_issue);
    }

    #[test]
    fn test_outstanding_balance_blocks_issue() {
        let noc = evaluator_with(vec![dues("B-7", 1000.0, 999.0)]);
        let result = noc.evaluate("B-7").unwrap();

        assert_eq!(result.remaining, 1.0);
        assert!(!result.can_issue);
    }

    #[test]
    fn test_exact_match_beats_substring() {
        let noc = evaluator_with(vec![dues("A-10", 500.0, 0.0), dues("A-1", 500.0, 500.0)]);

        assert_eq!(noc.evaluate("a-1").unwrap().plot_no, "A-1");
        assert_eq!(noc.evaluate("10").unwrap().plot_no, "A-10");
    }

    #[test]
    fn test_missing_and_unknown_queries() {
        let noc = evaluator_with(vec![dues("C-3", 1.0, 1.0)]);

        assert!(noc.evaluate("  ").unwrap_err().is_missing_key());
        assert!(matches!(noc.evaluate("Z-9").unwrap_err(), ReconError::NotFound(q) if q == "Z-9"));
    }

    #[test]
    fn test_missing_strings_render_empty() {
        let noc = evaluator_with(vec![dues("D-4", 0.0, 0.0)]);
        let json = serde_json::to_value(noc.evaluate("D-4").unwrap()).unwrap();

        assert_eq!(json["ownerName"], "");
        assert_eq!(json["address"], "");
        assert_eq!(json["poNo"], "");
        assert!(json["poDate"].is_null());
        assert_eq!(json["canIssue"], true);
        assert!(json["issuedAt"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_evaluate_does_not_touch_ledger() {
        let noc = evaluator_with(vec![dues("E-5", 10.0, 0.0)]);
        let before = noc.store.load_all();

        noc.evaluate("E-5").unwrap();
        assert_eq!(noc.store.load_all(), before);
    }
}
