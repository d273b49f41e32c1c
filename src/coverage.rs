//! Cross-bookmaker coverage comparison.
//!
//! Diagnostic view over the current snapshot: how many races and runners
//! each feed quotes, and which race and horse names both feeds share.
//! Names are compared case-insensitively; Bet365's `"Race N - "` prefix is
//! stripped so its league names line up with William Hill's race names.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::store::AggregateSnapshot;
use crate::types::Bookmaker;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedCoverage {
    pub bookmaker: Bookmaker,
    pub races: usize,
    pub horses: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageReport {
    pub feeds: Vec<FeedCoverage>,
    pub common_races: Vec<String>,
    pub common_horses: Vec<String>,
    /// William Hill races minus Bet365 races.
    pub race_difference: i64,
    /// William Hill runners minus Bet365 runners.
    pub horse_difference: i64,
}

/// Lowercased race name with any `"Race N - "` prefix removed.
pub fn race_key(race: &str) -> String {
    let lower = race.trim().to_lowercase();
    if let Some(rest) = lower.strip_prefix("race ") {
        if let Some((number, venue)) = rest.split_once(" - ") {
            if !number.is_empty() && !number.contains(' ') {
                return venue.trim().to_string();
            }
        }
    }
    lower
}

fn names(snapshot: &AggregateSnapshot, bookmaker: Bookmaker) -> (BTreeSet<String>, BTreeSet<String>) {
    let records = snapshot.records(bookmaker);
    let races = records.iter().map(|r| race_key(&r.race)).collect();
    let horses = records.iter().map(|r| r.horse.trim().to_lowercase()).collect();
    (races, horses)
}

/// Compare the two feeds in `snapshot`.
pub fn compare(snapshot: &AggregateSnapshot) -> CoverageReport {
    let (b365_races, b365_horses) = names(snapshot, Bookmaker::Bet365);
    let (wh_races, wh_horses) = names(snapshot, Bookmaker::WilliamHill);

    // Bet365 race count uses the full display name: each numbered race at a
    // venue is its own market.
    let b365_race_count = snapshot
        .records(Bookmaker::Bet365)
        .iter()
        .map(|r| r.race.as_str())
        .collect::<BTreeSet<_>>()
        .len();

    let feeds = vec![
        FeedCoverage {
            bookmaker: Bookmaker::Bet365,
            races: b365_race_count,
            horses: snapshot.count(Bookmaker::Bet365),
        },
        FeedCoverage {
            bookmaker: Bookmaker::WilliamHill,
            races: wh_races.len(),
            horses: snapshot.count(Bookmaker::WilliamHill),
        },
    ];

    CoverageReport {
        race_difference: feeds[1].races as i64 - feeds[0].races as i64,
        horse_difference: feeds[1].horses as i64 - feeds[0].horses as i64,
        feeds,
        common_races: b365_races.intersection(&wh_races).cloned().collect(),
        common_horses: b365_horses.intersection(&wh_horses).cloned().collect(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{self, FeedUpdate};
    use crate::types::OddsRecord;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn rec(bookmaker: Bookmaker, race: &str, horse: &str) -> OddsRecord {
        OddsRecord {
            horse: horse.to_string(),
            race: race.to_string(),
            odds: 3.0,
            bookmaker,
        }
    }

    #[test]
    fn test_race_key() {
        assert_eq!(race_key("Race 3 - Ascot"), "ascot");
        assert_eq!(race_key("  York "), "york");
        assert_eq!(race_key("Race day special"), "race day special");
        assert_eq!(race_key("Race of Champions - Newbury"), "race of champions - newbury");
    }

    #[tokio::test]
    async fn test_compare_intersections() {
        let (writer, reader) = store::channel();
        let mut feeds = BTreeMap::new();
        feeds.insert(
            Bookmaker::Bet365,
            FeedUpdate {
                records: vec![
                    rec(Bookmaker::Bet365, "Race 1 - Ascot", "Frankel"),
                    rec(Bookmaker::Bet365, "Race 2 - Ascot", "Enable"),
                    rec(Bookmaker::Bet365, "Race 1 - York", "Dancing Brave"),
                ],
                ..FeedUpdate::default()
            },
        );
        feeds.insert(
            Bookmaker::WilliamHill,
            FeedUpdate {
                records: vec![
                    rec(Bookmaker::WilliamHill, "ASCOT", "frankel"),
                    rec(Bookmaker::WilliamHill, "Kempton", "Kauto Star"),
                ],
                ..FeedUpdate::default()
            },
        );
        writer.publish(feeds, Utc::now()).await;

        let report = compare(&*reader.current().await);
        assert_eq!(report.feeds[0].races, 3);
        assert_eq!(report.feeds[0].horses, 3);
        assert_eq!(report.feeds[1].races, 2);
        assert_eq!(report.feeds[1].horses, 2);
        assert_eq!(report.common_races, vec!["ascot".to_string()]);
        assert_eq!(report.common_horses, vec!["frankel".to_string()]);
        assert_eq!(report.race_difference, -1);
        assert_eq!(report.horse_difference, -1);
    }

    #[test]
    fn test_compare_empty() {
        let report = compare(&AggregateSnapshot::default());
        assert!(report.common_races.is_empty());
        assert_eq!(report.feeds.len(), 2);
        assert_eq!(report.race_difference, 0);
    }
}
