//! Source type codes and symbolic label families.
//!
//! Every persisted row carries a numeric source type (1-8) that names both
//! the competitive context and the metric the row contributes to. Log
//! producers sometimes emit a symbolic label instead; the label identifies a
//! [`SourceFamily`], and the family maps to a win-rate code and a duration
//! code.
//!
//! | code | context                          | metric   |
//! |------|----------------------------------|----------|
//! | 1    | champion league                  | win rate |
//! | 2    | tournament (wheel, first combat) | win rate |
//! | 3    | duel ladder                      | win rate |
//! | 4    | champion league                  | duration |
//! | 5    | tournament (wheel, first combat) | duration |
//! | 6    | duel ladder                      | duration |
//! | 7    | tournament (non-wheel)           | win rate |
//! | 8    | tournament (non-wheel)           | duration |
//!
//! # Example
//!
//! ```rust
//! use pvp_types::SourceFamily;
//!
//! let family = SourceFamily::from_label(" Gold-League ").unwrap();
//! assert_eq!(family, SourceFamily::GoldLeague);
//! assert_eq!(family.win_rate_code(), 1);
//! assert_eq!(family.duration_code(), 4);
//! ```

use std::fmt;

/// Sentinel code for classifications that could not be resolved.
pub const UNKNOWN_SOURCE_TYPE: i32 = 0;

/// Symbolic competitive context a log line can name instead of a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFamily {
    /// Champion league.
    GoldLeague,
    /// Duel ladder season play.
    Season,
    /// Tournament wheel, first combat.
    QualifyingWheel,
}

impl SourceFamily {
    /// All families, in code order of their win-rate codes.
    pub const ALL: [SourceFamily; 3] = [
        SourceFamily::GoldLeague,
        SourceFamily::QualifyingWheel,
        SourceFamily::Season,
    ];

    /// Identify a family from a symbolic label.
    ///
    /// Matching trims surrounding whitespace and ignores ASCII case.
    /// Returns `None` for labels outside the three known families.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "gold_league" | "gold-league" | "champion_league" | "goldleague" => {
                Some(Self::GoldLeague)
            }
            "season_play_pvp_mgr" | "season" | "ladder" | "pvp_ladder" => Some(Self::Season),
            "qualifying_wheel_first_combat" | "qualifying-wheel-first-combat" | "wheel_first" => {
                Some(Self::QualifyingWheel)
            }
            _ => None,
        }
    }

    /// Canonical label as emitted by the log producers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::GoldLeague => "gold_league",
            Self::Season => "season_play_pvp_mgr",
            Self::QualifyingWheel => "qualifying_wheel_first_combat",
        }
    }

    /// Code for rows that contribute to the win-rate aggregate.
    pub fn win_rate_code(&self) -> i32 {
        match self {
            Self::GoldLeague => 1,
            Self::QualifyingWheel => 2,
            Self::Season => 3,
        }
    }

    /// Code for rows that contribute to the duration aggregate.
    pub fn duration_code(&self) -> i32 {
        match self {
            Self::GoldLeague => 4,
            Self::QualifyingWheel => 5,
            Self::Season => 6,
        }
    }
}

impl fmt::Display for SourceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Human-readable name of a source type code, if the code is known.
pub fn source_type_name(code: i32) -> Option<&'static str> {
    match code {
        1 => Some("champion league win rate"),
        2 => Some("tournament wheel first combat win rate"),
        3 => Some("duel ladder win rate"),
        4 => Some("champion league duration"),
        5 => Some("tournament wheel first combat duration"),
        6 => Some("duel ladder duration"),
        7 => Some("tournament non-wheel win rate"),
        8 => Some("tournament non-wheel duration"),
        _ => None,
    }
}
