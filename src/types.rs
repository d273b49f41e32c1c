//! Shared types for the odds aggregator.
//!
//! These types form the data model used across all modules: the
//! normalized odds record, the bookmaker identity, and the error and
//! skip taxonomies reported by providers and the normalizer.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Bookmaker
// ---------------------------------------------------------------------------

/// Upstream bookmaker feed a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bookmaker {
    /// Provider A: races keyed by league + race number, fractional odds.
    Bet365,
    /// Provider B: named races with settled flags, each-way odds block.
    WilliamHill,
}

impl Bookmaker {
    /// All bookmakers, in the order their records are concatenated.
    pub const ALL: [Bookmaker; 2] = [Bookmaker::Bet365, Bookmaker::WilliamHill];

    /// Stable identifier used in JSON and log fields.
    pub fn key(&self) -> &'static str {
        match self {
            Bookmaker::Bet365 => "bet365",
            Bookmaker::WilliamHill => "william_hill",
        }
    }

    /// URL path segment of the per-bookmaker endpoint.
    pub fn slug(&self) -> &'static str {
        match self {
            Bookmaker::Bet365 => "bet365",
            Bookmaker::WilliamHill => "william-hill",
        }
    }
}

impl fmt::Display for Bookmaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bookmaker::Bet365 => write!(f, "Bet365"),
            Bookmaker::WilliamHill => write!(f, "William Hill"),
        }
    }
}

// ---------------------------------------------------------------------------
// Odds record
// ---------------------------------------------------------------------------

/// One firm WIN quote for a horse in a race, in decimal odds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OddsRecord {
    pub horse: String,
    pub race: String,
    /// Decimal odds, always finite and > 1.0.
    pub odds: f64,
    pub bookmaker: Bookmaker,
}

impl fmt::Display for OddsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} @ {:.2} ({})",
            self.bookmaker.key(),
            self.horse,
            self.odds,
            self.race
        )
    }
}

// ---------------------------------------------------------------------------
// Skip and error types
// ---------------------------------------------------------------------------

/// Why the normalizer dropped a raw entry instead of emitting a record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    thiserror::Error,
)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    #[error("horse name is empty")]
    EmptyName,
    #[error("no odds quoted")]
    MissingOdds,
    #[error("starting price is not a firm quote")]
    StartingPrice,
    #[error("odds could not be parsed")]
    MalformedOdds,
    #[error("odds are not above 1.0")]
    OddsOutOfRange,
    #[error("runner is not active")]
    Inactive,
    #[error("duplicate race/horse quote")]
    Duplicate,
    #[error("entry has an unexpected shape")]
    MalformedEntry,
}

/// Failure converting an odds literal to decimal odds.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OddsError {
    #[error("empty odds literal")]
    Empty,
    #[error("fractional odds {0:?} must have exactly one '/'")]
    FractionShape(String),
    #[error("odds {0:?} are not numeric")]
    NotNumeric(String),
    #[error("odds {0} are not a finite value above 1.0")]
    OutOfRange(f64),
}

impl OddsError {
    /// Map a parse failure onto the skip taxonomy.
    pub fn skip_reason(&self) -> SkipReason {
        match self {
            OddsError::Empty => SkipReason::MissingOdds,
            OddsError::FractionShape(_) | OddsError::NotNumeric(_) => SkipReason::MalformedOdds,
            OddsError::OutOfRange(_) => SkipReason::OddsOutOfRange,
        }
    }
}

/// Why a provider fetch produced no payload.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("response body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
