//! Partial group aggregates computed by a store.
//!
//! Groups here are keyed by the raw server id; merging servers into their
//! cluster happens in the aggregation layer, which adds these partials up.

use pvp_types::MatchRecord;
use std::collections::BTreeMap;

/// Grouping columns of one partial aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupFields {
    /// Raw server id, before cluster merging.
    pub server: i64,
    pub own_class: i32,
    pub own_school: i32,
    pub source_type: i32,
    /// `(opponent_class, opponent_school)` when grouping by opponent.
    pub opponent: Option<(i32, i32)>,
}

impl GroupFields {
    pub fn of(record: &MatchRecord, group_by_opponent: bool) -> Self {
        Self {
            server: record.server,
            own_class: record.own_class,
            own_school: record.own_school,
            source_type: record.source_type,
            opponent: group_by_opponent.then_some((record.opponent_class, record.opponent_school)),
        }
    }
}

/// Win and loss counts of one group.
///
/// `matches` counts every row; a win flag other than 0 or 1 counts toward
/// neither wins nor losses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WinTally {
    pub wins: u64,
    pub losses: u64,
    pub matches: u64,
}

impl WinTally {
    pub fn add(&mut self, is_win: i32) {
        self.matches += 1;
        match is_win {
            1 => self.wins += 1,
            0 => self.losses += 1,
            _ => {}
        }
    }

    pub fn merge(&mut self, other: &WinTally) {
        self.wins += other.wins;
        self.losses += other.losses;
        self.matches += other.matches;
    }
}

/// Duration histogram of one group: seconds to number of matches.
pub type DurationCounts = BTreeMap<i64, u64>;

/// Tally wins per group over already loaded records.
pub fn tally_wins(
    records: &[MatchRecord],
    group_by_opponent: bool,
) -> Vec<(GroupFields, WinTally)> {
    let mut groups: BTreeMap<GroupFields, WinTally> = BTreeMap::new();
    for record in records {
        groups
            .entry(GroupFields::of(record, group_by_opponent))
            .or_default()
            .add(record.is_win);
    }
    groups.into_iter().collect()
}

/// Count durations per group over already loaded records.
pub fn count_durations(
    records: &[MatchRecord],
    group_by_opponent: bool,
) -> Vec<(GroupFields, DurationCounts)> {
    let mut groups: BTreeMap<GroupFields, DurationCounts> = BTreeMap::new();
    for record in records {
        *groups
            .entry(GroupFields::of(record, group_by_opponent))
            .or_default()
            .entry(record.duration_seconds)
            .or_default() += 1;
    }
    groups.into_iter().collect()
}
