//! Grouping and per-group statistics.
//!
//! Records are grouped by canonical server, own class, own school and
//! source type, plus opponent class and school when requested. Stores hand
//! back partial aggregates keyed by raw server; the functions here merge
//! them per canonical server. Groups come out in ascending key order;
//! [`sort_rows`] then applies the caller's sort keys as a stable sort, so
//! ties keep key order.

use crate::query::{SortColumn, SortKey};
use crate::server::canonical_server;
use pvp_store::{count_durations, tally_wins, DurationCounts, GroupFields, WinTally};
use pvp_types::MatchRecord;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Grouping key of one aggregate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    server: i64,
    own_class: i32,
    own_school: i32,
    source_type: i32,
    opponent: Option<(i32, i32)>,
}

impl From<GroupFields> for GroupKey {
    fn from(fields: GroupFields) -> Self {
        Self {
            server: canonical_server(fields.server),
            own_class: fields.own_class,
            own_school: fields.own_school,
            source_type: fields.source_type,
            opponent: fields.opponent,
        }
    }
}

/// Win-rate statistics of one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinRateRow {
    pub server: i64,
    #[serde(rename = "class")]
    pub own_class: i32,
    #[serde(rename = "schools")]
    pub own_school: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent_class: Option<i32>,
    #[serde(rename = "opponent_schools", skip_serializing_if = "Option::is_none")]
    pub opponent_school: Option<i32>,
    pub source_type: i32,
    pub win_count: u64,
    pub lose_count: u64,
    pub match_count: u64,
    /// `None` when the group has no matches.
    pub win_rate: Option<f64>,
}

/// Duration statistics of one group, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationRow {
    pub server: i64,
    #[serde(rename = "class")]
    pub own_class: i32,
    #[serde(rename = "schools")]
    pub own_school: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent_class: Option<i32>,
    #[serde(rename = "opponent_schools", skip_serializing_if = "Option::is_none")]
    pub opponent_school: Option<i32>,
    pub source_type: i32,
    pub avg_duration: f64,
    pub max_duration: i64,
    pub min_duration: i64,
    pub median_duration: i64,
}

/// Share of wins among `total` matches; `None` for an empty group.
pub fn win_rate(wins: u64, total: u64) -> Option<f64> {
    (total > 0).then(|| wins as f64 / total as f64)
}

/// Discrete median: the smallest value whose cumulative share reaches 0.5.
///
/// For an even count this is the lower of the two middle values; it is
/// never interpolated.
pub fn discrete_median(counts: &DurationCounts) -> Option<i64> {
    let total: u64 = counts.values().sum();
    if total == 0 {
        return None;
    }
    let rank = (total + 1) / 2;
    let mut seen = 0;
    counts.iter().find_map(|(&value, &count)| {
        seen += count;
        (seen >= rank).then_some(value)
    })
}

/// Group `records` and count wins and losses per group.
pub fn aggregate_win_rate(records: &[MatchRecord], group_by_opponent: bool) -> Vec<WinRateRow> {
    win_rate_rows(tally_wins(records, group_by_opponent))
}

/// Merge per-server win tallies into win-rate rows.
pub fn win_rate_rows(tallies: Vec<(GroupFields, WinTally)>) -> Vec<WinRateRow> {
    let mut groups: BTreeMap<GroupKey, WinTally> = BTreeMap::new();
    for (fields, tally) in tallies {
        groups.entry(fields.into()).or_default().merge(&tally);
    }

    groups
        .into_iter()
        .map(|(key, tally)| WinRateRow {
            server: key.server,
            own_class: key.own_class,
            own_school: key.own_school,
            opponent_class: key.opponent.map(|(class, _)| class),
            opponent_school: key.opponent.map(|(_, school)| school),
            source_type: key.source_type,
            win_count: tally.wins,
            lose_count: tally.losses,
            match_count: tally.matches,
            win_rate: win_rate(tally.wins, tally.matches),
        })
        .collect()
}

/// Group `records` and summarize match durations per group.
pub fn aggregate_duration(records: &[MatchRecord], group_by_opponent: bool) -> Vec<DurationRow> {
    duration_rows(count_durations(records, group_by_opponent))
}

/// Merge per-server duration histograms into duration rows.
pub fn duration_rows(counts: Vec<(GroupFields, DurationCounts)>) -> Vec<DurationRow> {
    let mut groups: BTreeMap<GroupKey, DurationCounts> = BTreeMap::new();
    for (fields, histogram) in counts {
        let merged = groups.entry(fields.into()).or_default();
        for (duration, count) in histogram {
            *merged.entry(duration).or_default() += count;
        }
    }

    groups
        .into_iter()
        .filter_map(|(key, histogram)| {
            let total: u64 = histogram.values().sum();
            let sum: i128 = histogram
                .iter()
                .map(|(&d, &n)| i128::from(d) * i128::from(n))
                .sum();
            Some(DurationRow {
                server: key.server,
                own_class: key.own_class,
                own_school: key.own_school,
                opponent_class: key.opponent.map(|(class, _)| class),
                opponent_school: key.opponent.map(|(_, school)| school),
                source_type: key.source_type,
                avg_duration: sum as f64 / total as f64,
                max_duration: *histogram.last_key_value()?.0,
                min_duration: *histogram.first_key_value()?.0,
                median_duration: discrete_median(&histogram)?,
            })
        })
        .collect()
}

/// Row types that can be ordered by a [`SortColumn`].
pub trait Sortable {
    /// Value of `column`, `None` when undefined.
    fn sort_value(&self, column: SortColumn) -> Option<f64>;
}

impl Sortable for WinRateRow {
    fn sort_value(&self, column: SortColumn) -> Option<f64> {
        match column {
            SortColumn::WinCount => Some(self.win_count as f64),
            SortColumn::LoseCount => Some(self.lose_count as f64),
            SortColumn::MatchCount => Some(self.match_count as f64),
            SortColumn::WinRate => self.win_rate,
            _ => group_value(
                column,
                self.server,
                self.own_class,
                self.own_school,
                self.opponent_class,
                self.opponent_school,
                self.source_type,
            ),
        }
    }
}

impl Sortable for DurationRow {
    fn sort_value(&self, column: SortColumn) -> Option<f64> {
        match column {
            SortColumn::AvgDuration => Some(self.avg_duration),
            SortColumn::MaxDuration => Some(self.max_duration as f64),
            SortColumn::MinDuration => Some(self.min_duration as f64),
            SortColumn::MedianDuration => Some(self.median_duration as f64),
            _ => group_value(
                column,
                self.server,
                self.own_class,
                self.own_school,
                self.opponent_class,
                self.opponent_school,
                self.source_type,
            ),
        }
    }
}

fn group_value(
    column: SortColumn,
    server: i64,
    own_class: i32,
    own_school: i32,
    opponent_class: Option<i32>,
    opponent_school: Option<i32>,
    source_type: i32,
) -> Option<f64> {
    match column {
        SortColumn::Server => Some(server as f64),
        SortColumn::Class => Some(f64::from(own_class)),
        SortColumn::Schools => Some(f64::from(own_school)),
        SortColumn::OpponentClass => opponent_class.map(f64::from),
        SortColumn::OpponentSchools => opponent_school.map(f64::from),
        SortColumn::SourceType => Some(f64::from(source_type)),
        _ => None,
    }
}

/// Stable multi-key sort.
///
/// Undefined values sort after every defined value when ascending and
/// before them when descending.
pub fn sort_rows<R: Sortable>(rows: &mut [R], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        keys.iter()
            .map(|key| {
                let ordering = compare_nullable(a.sort_value(key.column), b.sort_value(key.column));
                if key.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}

fn compare_nullable(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(server: i64, class: i32, is_win: i32, duration: i64) -> MatchRecord {
        let mut r = MatchRecord::new(server, 1000, 50, class, 1);
        r.source_type = 1;
        r.is_win = is_win;
        r.duration_seconds = duration;
        r
    }

    #[test]
    fn test_win_rate_helper() {
        assert_eq!(win_rate(0, 0), None);
        assert_eq!(win_rate(0, 4), Some(0.0));
        assert_eq!(win_rate(3, 4), Some(0.75));
    }

    #[test]
    fn test_discrete_median() {
        let median = |pairs: &[(i64, u64)]| discrete_median(&pairs.iter().copied().collect());
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[(7, 1)]), Some(7));
        assert_eq!(median(&[(10, 1), (20, 1), (30, 1)]), Some(20));
        // even count takes the lower middle value, no interpolation
        assert_eq!(median(&[(10, 1), (20, 1), (30, 1), (40, 1)]), Some(20));
        assert_eq!(median(&[(10, 2), (20, 2)]), Some(10));
        assert_eq!(median(&[(10, 1), (20, 3)]), Some(20));
        assert_eq!(median(&[(5, 0), (10, 0)]), None);
    }

    #[test]
    fn test_win_rate_merges_servers() {
        let records = vec![
            record(8001, 3, 1, 0),
            record(8002, 3, 0, 0),
            record(8004, 3, 1, 0),
            record(8027, 3, 1, 0),
        ];
        let rows = aggregate_win_rate(&records, false);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].server, 8001);
        assert_eq!(rows[0].win_count, 2);
        assert_eq!(rows[0].lose_count, 1);
        assert_eq!(rows[0].match_count, 3);
        assert!((rows[0].win_rate.unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(rows[0].opponent_class, None);

        assert_eq!(rows[1].server, 8024);
        assert_eq!(rows[1].win_rate, Some(1.0));
    }

    #[test]
    fn test_opponent_breakdown() {
        let mut a = record(8001, 3, 1, 0);
        a.opponent_class = 4;
        let mut b = record(8001, 3, 0, 0);
        b.opponent_class = 5;

        assert_eq!(aggregate_win_rate(&[a.clone(), b.clone()], false).len(), 1);
        let rows = aggregate_win_rate(&[a, b], true);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].opponent_class, Some(4));
        assert_eq!(rows[1].opponent_class, Some(5));
    }

    #[test]
    fn test_duration_stats() {
        let records = vec![
            record(8024, 2, 0, 40),
            record(8024, 2, 0, 10),
            record(8027, 2, 0, 30),
            record(8024, 2, 0, 20),
        ];
        let rows = aggregate_duration(&records, false);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.server, 8024);
        assert_eq!(row.avg_duration, 25.0);
        assert_eq!(row.max_duration, 40);
        assert_eq!(row.min_duration, 10);
        assert_eq!(row.median_duration, 20);
    }

    #[test]
    fn test_merges_partial_groups() {
        let fields = |server| GroupFields {
            server,
            own_class: 2,
            own_school: 1,
            source_type: 1,
            opponent: None,
        };
        let rows = duration_rows(vec![
            (fields(8024), DurationCounts::from([(10, 1), (40, 1)])),
            (fields(8027), DurationCounts::from([(10, 1), (90, 1)])),
            (fields(8001), DurationCounts::from([(5, 1)])),
        ]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].server, 8001);
        assert_eq!(rows[1].server, 8024);
        assert_eq!(rows[1].avg_duration, 37.5);
        assert_eq!(rows[1].min_duration, 10);
        assert_eq!(rows[1].max_duration, 90);
        assert_eq!(rows[1].median_duration, 10);

        let tally = |wins, losses| WinTally {
            wins,
            losses,
            matches: wins + losses,
        };
        let rows = win_rate_rows(vec![(fields(8002), tally(1, 1)), (fields(8004), tally(2, 0))]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].server, 8001);
        assert_eq!(rows[0].match_count, 4);
        assert_eq!(rows[0].win_rate, Some(0.75));
    }

    #[test]
    fn test_default_order_is_group_key() {
        let records = vec![record(8024, 1, 1, 0), record(8001, 2, 1, 0), record(8001, 1, 1, 0)];
        let rows = aggregate_win_rate(&records, false);
        let keys: Vec<_> = rows.iter().map(|r| (r.server, r.own_class)).collect();
        assert_eq!(keys, vec![(8001, 1), (8001, 2), (8024, 1)]);
    }

    #[test]
    fn test_sort_multi_key() {
        let records = vec![
            record(8001, 1, 1, 0),
            record(8001, 2, 0, 0),
            record(8024, 1, 1, 0),
            record(8024, 1, 1, 0),
        ];
        let mut rows = aggregate_win_rate(&records, false);
        sort_rows(
            &mut rows,
            &[
                SortKey {
                    column: SortColumn::WinRate,
                    descending: true,
                },
                SortKey {
                    column: SortColumn::MatchCount,
                    descending: true,
                },
            ],
        );
        let keys: Vec<_> = rows.iter().map(|r| (r.server, r.own_class)).collect();
        assert_eq!(keys, vec![(8024, 1), (8001, 1), (8001, 2)]);
    }

    #[test]
    fn test_sort_undefined_values() {
        let base = aggregate_win_rate(&[record(8001, 1, 1, 0), record(8001, 2, 0, 0)], false);
        let mut rows = base.clone();
        rows.push(WinRateRow {
            win_rate: None,
            match_count: 0,
            win_count: 0,
            lose_count: 0,
            own_class: 3,
            ..base[0].clone()
        });

        sort_rows(
            &mut rows,
            &[SortKey {
                column: SortColumn::WinRate,
                descending: false,
            }],
        );
        let rates: Vec<_> = rows.iter().map(|r| r.win_rate).collect();
        assert_eq!(rates, vec![Some(0.0), Some(1.0), None]);

        sort_rows(
            &mut rows,
            &[SortKey {
                column: SortColumn::WinRate,
                descending: true,
            }],
        );
        let rates: Vec<_> = rows.iter().map(|r| r.win_rate).collect();
        assert_eq!(rates, vec![None, Some(1.0), Some(0.0)]);
    }
}
