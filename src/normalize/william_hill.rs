//! William Hill race feed normalization.
//!
//! Payload shape:
//! `{"races": [{"name", "settled", "horses": [{"name", "active", "EW": {"decimal", "fractional"}}]}]}`.
//!
//! Odds are plain decimals only; a fractional string such as `"11/2"` in
//! the `fractional` slot is skipped as malformed.
//!
//! Settled races and inactive runners are dropped. The feed repeats runners,
//! so records are deduplicated on the `(race, horse)` pair: the first quote
//! that parses wins and later ones for the same pair are counted as
//! duplicates.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use super::{is_unset, name_or_unknown, parse_decimal, races, scalar_text, NormalizedBatch};
use crate::types::{Bookmaker, OddsRecord, SkipReason};

#[derive(Debug, Deserialize)]
struct RawRace {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    settled: Option<bool>,
    #[serde(default)]
    horses: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawHorse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    active: Option<bool>,
    #[serde(default, rename = "EW")]
    each_way: Option<Value>,
}

/// Composite dedup key: (race name, horse name).
type RunnerKey = (String, String);

/// Normalize a William Hill races payload.
pub fn normalize(payload: &Value) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    let mut seen: HashSet<RunnerKey> = HashSet::new();

    for raw_race in races(payload, &mut batch) {
        let race: RawRace = match RawRace::deserialize(raw_race) {
            Ok(r) => r,
            Err(e) => {
                debug!(error = %e, "William Hill race entry malformed, skipping");
                batch.skip(SkipReason::MalformedEntry);
                continue;
            }
        };
        if race.settled.unwrap_or(false) {
            batch.settled_races += 1;
            continue;
        }
        let race_name = name_or_unknown(race.name.as_deref());

        for raw_horse in race.horses.iter().flatten() {
            match horse_record(raw_horse, &race_name, &seen) {
                Ok(record) => {
                    seen.insert((record.race.clone(), record.horse.clone()));
                    batch.records.push(record);
                }
                Err(reason) => {
                    debug!(race = %race_name, reason = %reason, "William Hill runner skipped");
                    batch.skip(reason);
                }
            }
        }
    }

    batch
}

fn horse_record(
    raw: &Value,
    race_name: &str,
    seen: &HashSet<RunnerKey>,
) -> Result<OddsRecord, SkipReason> {
    let horse = RawHorse::deserialize(raw).map_err(|_| SkipReason::MalformedEntry)?;

    if !horse.active.unwrap_or(true) {
        return Err(SkipReason::Inactive);
    }

    let name = horse.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(SkipReason::EmptyName);
    }

    let key = (race_name.to_string(), name.to_string());
    if seen.contains(&key) {
        return Err(SkipReason::Duplicate);
    }

    let literal = each_way_literal(horse.each_way.as_ref())?.ok_or(SkipReason::MissingOdds)?;
    let odds = parse_decimal(&literal).map_err(|e| {
        debug!(horse = name, odds = %literal, error = %e, "William Hill odds rejected");
        e.skip_reason()
    })?;

    let (race, horse) = key;
    Ok(OddsRecord {
        horse,
        race,
        odds,
        bookmaker: Bookmaker::WilliamHill,
    })
}

/// The `decimal` quote of the EW block, falling back to `fractional` when
/// `decimal` is unset (absent, null, zero or blank).
fn each_way_literal(each_way: Option<&Value>) -> Result<Option<String>, SkipReason> {
    let Some(Value::Object(block)) = each_way else {
        return Ok(None);
    };
    match block.get("decimal").filter(|v| !is_unset(v)) {
        Some(decimal) => scalar_text(Some(decimal)),
        None => scalar_text(block.get("fractional")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
