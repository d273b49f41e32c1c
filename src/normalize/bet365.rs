//! Bet365 race feed normalization.
//!
//! Payload shape: `{"races": [{"league", "raceNum", "horses": [{"na", "OD"}]}]}`.
//! Odds arrive as fractional strings (`"7/2"`), plain decimals, or the
//! starting-price marker `"SP"`, which is never a firm quote and is dropped.
//! The feed carries one quote per runner per race, so no dedup pass runs.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{is_unset, name_or_unknown, parse_odds, races, scalar_text, NormalizedBatch};
use crate::types::{Bookmaker, OddsRecord, SkipReason};

const STARTING_PRICE: &str = "SP";

#[derive(Debug, Deserialize)]
struct RawRace {
    #[serde(default)]
    league: Option<String>,
    #[serde(default, rename = "raceNum")]
    race_num: Option<Value>,
    #[serde(default)]
    horses: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawHorse {
    #[serde(default)]
    na: Option<String>,
    #[serde(default, rename = "OD")]
    od: Option<Value>,
}

/// Normalize a Bet365 races payload.
pub fn normalize(payload: &Value) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for raw_race in races(payload, &mut batch) {
        let race: RawRace = match RawRace::deserialize(raw_race) {
            Ok(r) => r,
            Err(e) => {
                debug!(error = %e, "Bet365 race entry malformed, skipping");
                batch.skip(SkipReason::MalformedEntry);
                continue;
            }
        };
        let race_name = race_display_name(&race);

        for raw_horse in race.horses.iter().flatten() {
            match horse_record(raw_horse, &race_name) {
                Ok(record) => batch.records.push(record),
                Err(reason) => {
                    debug!(race = %race_name, reason = %reason, "Bet365 runner skipped");
                    batch.skip(reason);
                }
            }
        }
    }

    batch
}

/// `"Race {raceNum} - {league}"` when a race number is given, else the league.
/// A zero race number counts as not given.
fn race_display_name(race: &RawRace) -> String {
    let league = name_or_unknown(race.league.as_deref());
    match scalar_text(race.race_num.as_ref().filter(|v| !is_unset(v))) {
        Ok(Some(num)) => format!("Race {num} - {league}"),
        _ => league,
    }
}

fn horse_record(raw: &Value, race_name: &str) -> Result<OddsRecord, SkipReason> {
    let horse = RawHorse::deserialize(raw).map_err(|_| SkipReason::MalformedEntry)?;

    let name = horse.na.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(SkipReason::EmptyName);
    }

    let literal = scalar_text(horse.od.as_ref())?.ok_or(SkipReason::MissingOdds)?;
    if literal == STARTING_PRICE {
        return Err(SkipReason::StartingPrice);
    }

    let odds = parse_odds(&literal).map_err(|e| {
        debug!(horse = name, odds = %literal, error = %e, "Bet365 odds rejected");
        e.skip_reason()
    })?;

    Ok(OddsRecord {
        horse: name.to_string(),
        race: race_name.to_string(),
        odds,
        bookmaker: Bookmaker::Bet365,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
