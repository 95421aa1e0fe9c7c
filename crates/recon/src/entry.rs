// Manually entered records
//
// Accepts the field spellings older clients send (`house`, `owner`,
// `status`, `total`, `paid`) and amounts as numbers or comma-grouped text.

use plotdues_core::{amount, text};
use plotdues_core::timestamp::parse_date_text;
use plotdues_core::DuesPatch;
use serde::Deserialize;

use crate::error::ReconError;

/// A single record as typed in by an operator.
///
/// Absent fields leave the stored values alone. Text fields also accept
/// numbers (`"plotNo": 12`). When both a field and its older spelling are
/// sent, the current spelling wins unless it is blank.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntry {
    #[serde(default, deserialize_with = "text::deserialize_optional")]
    pub plot_no: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize_optional")]
    pub house: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize_optional")]
    pub owner_name: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize_optional")]
    pub owner: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize_optional")]
    pub dues_status: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize_optional")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "amount::deserialize_optional")]
    pub total_dues: Option<f64>,
    #[serde(default, deserialize_with = "amount::deserialize_optional")]
    pub total: Option<f64>,
    #[serde(default, deserialize_with = "amount::deserialize_optional")]
    pub amount_paid: Option<f64>,
    #[serde(default, deserialize_with = "amount::deserialize_optional")]
    pub paid: Option<f64>,
    #[serde(default, deserialize_with = "text::deserialize_optional")]
    pub po_no: Option<String>,
    /// Any supported date layout. An empty string clears the stored date.
    #[serde(default, deserialize_with = "text::deserialize_optional")]
    pub po_date: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize_optional")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize_optional")]
    pub contact: Option<String>,
}

impl ManualEntry {
    /// Convert to a write candidate. Fails on a blank plot number or a PO
    /// date that cannot be read.
    pub fn into_patch(self) -> Result<DuesPatch, ReconError> {
        let plot_no = preferred(self.plot_no, self.house)
            .filter(|p| !p.is_empty())
            .ok_or(ReconError::MissingKey)?;

        let po_date = match trimmed(self.po_date) {
            None => None,
            Some(raw) if raw.is_empty() => Some(None),
            Some(raw) => match parse_date_text(&raw) {
                Some(date) => Some(Some(date)),
                None => {
                    return Err(ReconError::InvalidField {
                        field: "poDate",
                        value: raw,
                    })
                }
            },
        };

        Ok(DuesPatch {
            plot_no,
            owner_name: preferred(self.owner_name, self.owner),
            dues_status: preferred(self.dues_status, self.status),
            total_dues: self.total_dues.or(self.total),
            amount_paid: self.amount_paid.or(self.paid),
            balance_raw: None,
            po_no: trimmed(self.po_no),
            po_date,
            address: trimmed(self.address),
            contact: trimmed(self.contact),
        })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string())
}

/// Trimmed `current`, falling back to `legacy` when `current` is absent or
/// blank.
fn preferred(current: Option<String>, legacy: Option<String>) -> Option<String> {
    match trimmed(current) {
        Some(value) if !value.is_empty() => Some(value),
        current => trimmed(legacy).filter(|v| !v.is_empty()).or(current),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(json: &str) -> ManualEntry {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_aliases_and_lenient_amounts() {
        let patch = entry(r#"{"house": " A-5 ", "owner": "Sara", "total": "12,000", "paid": 2000}"#)
            .into_patch()
            .unwrap();

        assert_eq!(patch.plot_no, "A-5");
        assert_eq!(patch.owner_name.as_deref(), Some("Sara"));
        assert_eq!(patch.total_dues, Some(12000.0));
        assert_eq!(patch.amount_paid, Some(2000.0));
        assert_eq!(patch.address, None);
    }

    #[test]
    fn test_absent_fields_stay_unprovided() {
        let patch = entry(r#"{"plotNo": "X", "ownerName": "New"}"#).into_patch().unwrap();

        assert_eq!(patch.total_dues, None);
        assert_eq!(patch.amount_paid, None);
        assert_eq!(patch.po_date, None);
    }

    #[test]
    fn test_missing_plot_is_rejected() {
        for json in [r#"{}"#, r#"{"plotNo": "   "}"#, r#"{"ownerName": "Nobody"}"#] {
            let err = entry(json).into_patch().unwrap_err();
            assert!(err.is_missing_key(), "input {json}");
        }
    }

    #[test]
    fn test_po_date_parsing() {
        let patch = entry(r#"{"plotNo": "Y", "poDate": "2024-02-10"}"#).into_patch().unwrap();
        assert_eq!(patch.po_date, Some(Some(Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap())));

        let cleared = entry(r#"{"plotNo": "Y", "poDate": ""}"#).into_patch().unwrap();
        assert_eq!(cleared.po_date, Some(None));

        let err = entry(r#"{"plotNo": "Y", "poDate": "someday"}"#).into_patch().unwrap_err();
        assert!(matches!(err, ReconError::InvalidField { field: "poDate", .. }));
    }

    #[test]
    fn test_numeric_text_fields() {
        let patch = entry(r#"{"plotNo": 12, "amountPaid": 500, "contact": 3001234567, "poNo": 7.0}"#)
            .into_patch()
            .unwrap();

        assert_eq!(patch.plot_no, "12");
        assert_eq!(patch.amount_paid, Some(500.0));
        assert_eq!(patch.contact.as_deref(), Some("3001234567"));
        assert_eq!(patch.po_no.as_deref(), Some("7"));
    }

    #[test]
    fn test_current_spelling_wins_over_legacy() {
        let patch = entry(
            r#"{"plotNo": "B-7", "house": "Z-1", "ownerName": "", "owner": "Sara", "totalDues": 100, "total": 900}"#,
        )
        .into_patch()
        .unwrap();

        assert_eq!(patch.plot_no, "B-7");
        assert_eq!(patch.owner_name.as_deref(), Some("Sara"));
        assert_eq!(patch.total_dues, Some(100.0));

        let fallback = entry(r#"{"plotNo": "  ", "house": "H-3", "paid": "1,500"}"#).into_patch().unwrap();
        assert_eq!(fallback.plot_no, "H-3");
        assert_eq!(fallback.amount_paid, Some(1500.0));
    }

    #[test]
    fn test_blank_owner_is_still_a_write() {
        let patch = entry(r#"{"plotNo": "Q", "ownerName": "  "}"#).into_patch().unwrap();
        assert_eq!(patch.owner_name.as_deref(), Some(""));
    }

    #[test]
    fn test_remaining_in_payload_is_ignored() {
        let patch = entry(r#"{"plotNo": "Z", "totalDues": 100, "remaining": -5}"#).into_patch().unwrap();
        assert_eq!(patch.total_dues, Some(100.0));
    }
}
