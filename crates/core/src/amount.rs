// Amount coercion
//
// Dues amounts arrive as spreadsheet numbers, comma-grouped text, or JSON
// numbers/strings from manual entry. None of these paths may fail: anything
// unreadable is zero.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};

/// Parse a free-text amount. Thousands separators are stripped, surrounding
/// whitespace ignored. Empty, non-numeric, non-finite and negative input all
/// coerce to `0.0`.
pub fn coerce_amount(raw: &str) -> f64 {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return 0.0;
    }
    cleaned.parse::<f64>().map(clamp_amount).unwrap_or(0.0)
}

/// Clamp a numeric amount into the ledger's domain (finite, non-negative).
pub fn clamp_amount(n: f64) -> f64 {
    // NaN fails the comparison too
    if n > 0.0 && n.is_finite() {
        n
    } else {
        0.0
    }
}

/// `max(total - paid, 0)`.
pub fn remaining_balance(total_dues: f64, amount_paid: f64) -> f64 {
    clamp_amount(total_dues - amount_paid)
}

/// Deserialize an amount from a JSON number, a numeric string, or null.
pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer
        .deserialize_any(AmountVisitor)
        .map(|amount| amount.unwrap_or(0.0))
}

/// Like [`deserialize`] but keeps `null` distinct from zero.
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(AmountVisitor)
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Option<f64>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, a numeric string, or null")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Some(clamp_amount(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(clamp_amount(v as f64)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(clamp_amount(v as f64)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Some(coerce_amount(v)))
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Self::Value, E> {
        Ok(Some(0.0))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}
