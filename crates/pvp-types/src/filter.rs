//! Record filter shared by the record store and the aggregation engine.

use crate::record::MatchRecord;

/// Filter applied to match records before grouping.
///
/// Every criterion is optional. List criteria match any member of the
/// list; an empty list places no restriction. Ranges are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    /// Raw (pre-merge) server ids.
    pub servers: Vec<i64>,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
    pub min_level: Option<i64>,
    pub max_level: Option<i64>,
    pub own_class: Option<i32>,
    pub own_school: Option<i32>,
    pub opponent_class: Option<i32>,
    pub opponent_school: Option<i32>,
    /// Companion ids; a record matches if it carries any of them.
    pub companions: Vec<i64>,
    /// Restricts the companion match to this talent. `None` or 0 means any
    /// talent; a stored talent of 0 applies to all talents and always matches.
    pub companion_talent: Option<i64>,
    /// Legendary item ids; a record matches if it carries any of them.
    pub legendary_items: Vec<i64>,
    pub special_gear: Option<i64>,
    pub source_types: Vec<i32>,
}

impl RecordFilter {
    /// Create an empty filter that matches every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to the given servers.
    pub fn with_servers(mut self, servers: Vec<i64>) -> Self {
        self.servers = servers;
        self
    }

    /// Restrict to an inclusive timestamp range.
    pub fn with_time_range(mut self, start_ts: Option<i64>, end_ts: Option<i64>) -> Self {
        self.start_ts = start_ts;
        self.end_ts = end_ts;
        self
    }

    /// Restrict to an inclusive level range.
    pub fn with_level_range(mut self, min_level: Option<i64>, max_level: Option<i64>) -> Self {
        self.min_level = min_level;
        self.max_level = max_level;
        self
    }

    /// Restrict to the given source types.
    pub fn with_source_types(mut self, source_types: Vec<i32>) -> Self {
        self.source_types = source_types;
        self
    }

    /// Restrict to records carrying one of `companions`, optionally with `talent`.
    pub fn with_companions(mut self, companions: Vec<i64>, talent: Option<i64>) -> Self {
        self.companions = companions;
        self.companion_talent = talent;
        self
    }

    /// Restrict to records carrying one of `items`.
    pub fn with_legendary_items(mut self, items: Vec<i64>) -> Self {
        self.legendary_items = items;
        self
    }

    /// Check whether a record satisfies every criterion.
    pub fn matches(&self, record: &MatchRecord) -> bool {
        in_list(&self.servers, &record.server)
            && self.start_ts.map_or(true, |ts| record.timestamp >= ts)
            && self.end_ts.map_or(true, |ts| record.timestamp <= ts)
            && self.min_level.map_or(true, |lv| record.level >= lv)
            && self.max_level.map_or(true, |lv| record.level <= lv)
            && self.own_class.map_or(true, |c| record.own_class == c)
            && self.own_school.map_or(true, |s| record.own_school == s)
            && self.opponent_class.map_or(true, |c| record.opponent_class == c)
            && self.opponent_school.map_or(true, |s| record.opponent_school == s)
            && self.matches_companions(record)
            && self.matches_legendary_items(record)
            && self.special_gear.map_or(true, |g| record.special_gear == Some(g))
            && in_list(&self.source_types, &record.source_type)
    }

    fn matches_companions(&self, record: &MatchRecord) -> bool {
        if self.companions.is_empty() {
            return true;
        }
        let talent = self.companion_talent.filter(|t| *t != 0);
        record.companion_pairs().any(|(companion, stored)| {
            self.companions.contains(&companion)
                && talent.map_or(true, |t| stored == t || stored == 0)
        })
    }

    fn matches_legendary_items(&self, record: &MatchRecord) -> bool {
        self.legendary_items.is_empty()
            || record
                .legendary_items
                .iter()
                .any(|item| self.legendary_items.contains(item))
    }
}

fn in_list<T: PartialEq>(list: &[T], value: &T) -> bool {
    list.is_empty() || list.contains(value)
}
