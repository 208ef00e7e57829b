//! Persisted match rows.
//!
//! A [`MatchRecord`] is the canonical shape written to the record store.
//! One raw event can produce more than one record when its source
//! classification fans out into a win-rate row and a duration row.

use serde::{Deserialize, Serialize};

/// Maximum number of companions carried per record.
pub const MAX_COMPANIONS: usize = 3;

/// Maximum number of legendary items carried per record.
pub const MAX_LEGENDARY_ITEMS: usize = 3;

/// One persisted match row.
///
/// `companions` and `companion_talents` always have the same length; use
/// [`MatchRecord::set_companions`] rather than assigning them directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Shard identifier.
    pub server: i64,

    /// Match time (seconds since Unix epoch).
    pub timestamp: i64,

    /// Character level.
    pub level: i64,

    /// Own class.
    pub own_class: i32,

    /// Own school.
    pub own_school: i32,

    /// Opponent class (0 when unknown).
    pub opponent_class: i32,

    /// Opponent school (0 when unknown).
    pub opponent_school: i32,

    /// 1 for a win, 0 otherwise.
    pub is_win: i32,

    /// Match duration in seconds.
    pub duration_seconds: i64,

    /// Companion ids (at most [`MAX_COMPANIONS`]).
    pub companions: Vec<i64>,

    /// Talent per companion, positionally matched. 0 means "applies to all".
    pub companion_talents: Vec<i64>,

    /// Legendary item ids (at most [`MAX_LEGENDARY_ITEMS`]).
    pub legendary_items: Vec<i64>,

    /// Special gear id, if equipped.
    pub special_gear: Option<i64>,

    /// Source type code (see [`crate::SourceFamily`]).
    pub source_type: i32,

    /// Score ratio in per-mille.
    pub score_ratio: i64,
}

impl MatchRecord {
    /// Create a record with the mandatory dimensions; everything else defaults.
    pub fn new(server: i64, timestamp: i64, level: i64, own_class: i32, own_school: i32) -> Self {
        Self {
            server,
            timestamp,
            level,
            own_class,
            own_school,
            opponent_class: 0,
            opponent_school: 0,
            is_win: 0,
            duration_seconds: 0,
            companions: Vec::new(),
            companion_talents: Vec::new(),
            legendary_items: Vec::new(),
            special_gear: None,
            source_type: 0,
            score_ratio: 0,
        }
    }

    /// Set companions and their talents, keeping both the same length.
    ///
    /// Companions are capped at [`MAX_COMPANIONS`]. Missing talents are
    /// filled with 0 and surplus talents are dropped.
    pub fn set_companions(&mut self, mut companions: Vec<i64>, mut talents: Vec<i64>) {
        companions.truncate(MAX_COMPANIONS);
        talents.resize(companions.len(), 0);
        self.companions = companions;
        self.companion_talents = talents;
    }

    /// Set legendary items, capped at [`MAX_LEGENDARY_ITEMS`].
    pub fn set_legendary_items(&mut self, mut items: Vec<i64>) {
        items.truncate(MAX_LEGENDARY_ITEMS);
        self.legendary_items = items;
    }

    /// Returns true if this row records a win.
    pub fn is_win(&self) -> bool {
        self.is_win == 1
    }

    /// Iterate `(companion, talent)` pairs.
    pub fn companion_pairs(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.companions
            .iter()
            .copied()
            .zip(self.companion_talents.iter().copied())
    }
}
