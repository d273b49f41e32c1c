//! Odds normalization.
//!
//! Pure functions that turn each bookmaker's raw race/horse JSON into the
//! common [`OddsRecord`] shape. Nothing here does I/O; every dropped entry
//! is counted by [`SkipReason`] so a batch can be diagnosed afterwards.

pub mod bet365;
pub mod william_hill;

use serde_json::Value;
use std::collections::BTreeMap;

use crate::types::{Bookmaker, OddsError, OddsRecord, SkipReason};

/// Race name used when a provider gives none.
pub const UNKNOWN_RACE: &str = "Unknown";

/// Output of one normalization pass over a provider payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    pub records: Vec<OddsRecord>,
    pub skipped: BTreeMap<SkipReason, usize>,
    /// Races dropped wholesale because their result is already final.
    pub settled_races: usize,
}

impl NormalizedBatch {
    pub(crate) fn skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }

    /// Number of raw entries that did not become records.
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }
}

/// Normalize a raw payload from the given bookmaker.
pub fn normalize(bookmaker: Bookmaker, payload: &Value) -> NormalizedBatch {
    match bookmaker {
        Bookmaker::Bet365 => bet365::normalize(payload),
        Bookmaker::WilliamHill => william_hill::normalize(payload),
    }
}

/// Convert fractional odds `num/den` to decimal odds (`num/den + 1`).
pub fn fractional_to_decimal(num: f64, den: f64) -> f64 {
    num / den + 1.0
}

/// Parse an odds literal into decimal odds.
///
/// Accepts plain decimals (`"4.5"`) and fractions (`"7/2"` → 4.5). A
/// fraction must split into exactly two numeric parts. The result must be
/// finite and above 1.0.
pub fn parse_odds(raw: &str) -> Result<f64, OddsError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(OddsError::Empty);
    }

    let value = if raw.contains('/') {
        let parts: Vec<&str> = raw.split('/').collect();
        if parts.len() != 2 {
            return Err(OddsError::FractionShape(raw.to_string()));
        }
        let num = parse_number(parts[0], raw)?;
        let den = parse_number(parts[1], raw)?;
        fractional_to_decimal(num, den)
    } else {
        parse_number(raw, raw)?
    };

    if !value.is_finite() || value <= 1.0 {
        return Err(OddsError::OutOfRange(value));
    }
    Ok(value)
}

/// Parse a plain decimal odds literal. Fractions are rejected as
/// non-numeric.
pub fn parse_decimal(raw: &str) -> Result<f64, OddsError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(OddsError::Empty);
    }
    let value = parse_number(raw, raw)?;
    if !value.is_finite() || value <= 1.0 {
        return Err(OddsError::OutOfRange(value));
    }
    Ok(value)
}

fn parse_number(part: &str, whole: &str) -> Result<f64, OddsError> {
    part.trim()
        .parse::<f64>()
        .map_err(|_| OddsError::NotNumeric(whole.to_string()))
}

/// Read a JSON scalar as an odds/label literal.
///
/// Strings are trimmed; numbers are rendered as-is. `null`, absent and
/// blank strings yield `Ok(None)`. Any other JSON type is malformed.
pub(crate) fn scalar_text(value: Option<&Value>) -> Result<Option<String>, SkipReason> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| s.to_string()))
        }
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(SkipReason::MalformedOdds),
    }
}

/// Whether a JSON value counts as "not given": null, false, numeric zero,
/// or a blank string.
pub(crate) fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Borrow the `races` array of a payload.
///
/// A missing key means zero races; a non-array value is counted as one
/// malformed entry.
pub(crate) fn races<'a>(payload: &'a Value, batch: &mut NormalizedBatch) -> &'a [Value] {
    match payload.get("races") {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items.as_slice(),
        Some(_) => {
            batch.skip(SkipReason::MalformedEntry);
            &[]
        }
    }
}

/// Pick a display name, falling back to [`UNKNOWN_RACE`] when blank.
pub(crate) fn name_or_unknown(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => UNKNOWN_RACE.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
