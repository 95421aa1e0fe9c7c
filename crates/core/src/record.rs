use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::{self, remaining_balance};
use crate::timestamp;

/// Normalize a plot number for matching: trimmed, lowercased.
///
/// Stored plot numbers keep whatever casing the last write used; only
/// comparisons go through this.
pub fn plot_key(plot_no: &str) -> String {
    plot_no.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Stored record
// ---------------------------------------------------------------------------

/// One plot's dues, as persisted in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuesRecord {
    pub plot_no: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dues_status: Option<String>,
    #[serde(default, deserialize_with = "amount::deserialize")]
    pub total_dues: f64,
    #[serde(default, deserialize_with = "amount::deserialize")]
    pub amount_paid: f64,
    /// Derived. Overwritten on every write and on load.
    #[serde(default, deserialize_with = "amount::deserialize")]
    pub remaining: f64,
    /// Source balance text, kept for reference only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub po_no: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub po_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DuesRecord {
    /// Build a fresh record from a first write of `patch`.
    pub fn from_patch(patch: DuesPatch, now: DateTime<Utc>) -> Self {
        let mut record = Self {
            plot_no: patch.plot_no,
            owner_name: patch.owner_name,
            dues_status: patch.dues_status,
            total_dues: patch.total_dues.unwrap_or(0.0),
            amount_paid: patch.amount_paid.unwrap_or(0.0),
            remaining: 0.0,
            balance_raw: patch.balance_raw,
            po_no: patch.po_no,
            po_date: patch.po_date.flatten(),
            address: patch.address,
            contact: patch.contact,
            created_at: Some(now),
            updated_at: None,
        };
        record.recompute_remaining();
        record
    }

    /// Merge a later write into this record.
    ///
    /// Every field the patch provides wins; every field it leaves out keeps
    /// its stored value. `created_at` is never touched.
    pub fn apply(&mut self, patch: DuesPatch, now: DateTime<Utc>) {
        self.plot_no = patch.plot_no;
        overwrite(&mut self.owner_name, patch.owner_name);
        overwrite(&mut self.dues_status, patch.dues_status);
        if let Some(total) = patch.total_dues {
            self.total_dues = total;
        }
        if let Some(paid) = patch.amount_paid {
            self.amount_paid = paid;
        }
        overwrite(&mut self.balance_raw, patch.balance_raw);
        overwrite(&mut self.po_no, patch.po_no);
        if let Some(po_date) = patch.po_date {
            self.po_date = po_date;
        }
        overwrite(&mut self.address, patch.address);
        overwrite(&mut self.contact, patch.contact);
        self.updated_at = Some(now);
        self.recompute_remaining();
    }

    pub fn recompute_remaining(&mut self) {
        self.remaining = remaining_balance(self.total_dues, self.amount_paid);
    }

    pub fn key(&self) -> String {
        plot_key(&self.plot_no)
    }

    pub fn is_settled(&self) -> bool {
        remaining_balance(self.total_dues, self.amount_paid) <= 0.0
    }
}

fn overwrite(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

// ---------------------------------------------------------------------------
// Write candidate
// ---------------------------------------------------------------------------

/// A keyed write. `None` means "not provided": the stored value survives.
///
/// `po_date` has two levels because a write can explicitly clear the date
/// (`Some(None)`), which is what a spreadsheet row with an empty or
/// unreadable PO date does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DuesPatch {
    pub plot_no: String,
    pub owner_name: Option<String>,
    pub dues_status: Option<String>,
    pub total_dues: Option<f64>,
    pub amount_paid: Option<f64>,
    pub balance_raw: Option<String>,
    pub po_no: Option<String>,
    pub po_date: Option<Option<DateTime<Utc>>>,
    pub address: Option<String>,
    pub contact: Option<String>,
}

impl DuesPatch {
    pub fn new(plot_no: impl Into<String>) -> Self {
        Self {
            plot_no: plot_no.into(),
            ..Default::default()
        }
    }

    pub fn key(&self) -> String {
        plot_key(&self.plot_no)
    }

    pub fn has_key(&self) -> bool {
        !self.plot_no.trim().is_empty()
    }
}
