//! Query parameters: metric, grouping and sort specification.

use crate::error::StatsError;
use pvp_types::RecordFilter;
use std::str::FromStr;

/// Which aggregate to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Wins, losses and win rate per group.
    WinRate,
    /// Average, maximum, minimum and median duration per group.
    Duration,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WinRate => "winrate",
            Self::Duration => "duration",
        }
    }
}

impl FromStr for Metric {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "winrate" | "win_rate" => Ok(Self::WinRate),
            "duration" => Ok(Self::Duration),
            other => Err(StatsError::InvalidMetric(other.to_string())),
        }
    }
}

/// Columns a result can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Server,
    Class,
    Schools,
    OpponentClass,
    OpponentSchools,
    SourceType,
    WinCount,
    LoseCount,
    MatchCount,
    WinRate,
    AvgDuration,
    MaxDuration,
    MinDuration,
    MedianDuration,
}

impl SortColumn {
    /// Look up a column by its wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "server" => Some(Self::Server),
            "class" => Some(Self::Class),
            "schools" => Some(Self::Schools),
            "opponent_class" => Some(Self::OpponentClass),
            "opponent_schools" => Some(Self::OpponentSchools),
            "source_type" => Some(Self::SourceType),
            "win_count" => Some(Self::WinCount),
            "lose_count" => Some(Self::LoseCount),
            "match_count" => Some(Self::MatchCount),
            "win_rate" => Some(Self::WinRate),
            "avg_duration" => Some(Self::AvgDuration),
            "max_duration" => Some(Self::MaxDuration),
            "min_duration" => Some(Self::MinDuration),
            "median_duration" => Some(Self::MedianDuration),
            _ => None,
        }
    }

    fn is_opponent(&self) -> bool {
        matches!(self, Self::OpponentClass | Self::OpponentSchools)
    }

    fn applies_to(&self, metric: Metric) -> bool {
        match self {
            Self::WinCount | Self::LoseCount | Self::MatchCount | Self::WinRate => {
                metric == Metric::WinRate
            }
            Self::AvgDuration | Self::MaxDuration | Self::MinDuration | Self::MedianDuration => {
                metric == Metric::Duration
            }
            _ => true,
        }
    }
}

/// One `column:direction` entry of a sort specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: SortColumn,
    pub descending: bool,
}

/// Parse a comma-separated `column:direction` list.
///
/// Unknown columns, columns of the other metric, and opponent columns
/// without opponent grouping are ignored. The direction defaults to
/// ascending; `asc` is ascending and anything else descending.
pub fn parse_sort(spec: &str, metric: Metric, group_by_opponent: bool) -> Vec<SortKey> {
    spec.split(',')
        .filter(|part| !part.trim().is_empty())
        .filter_map(|part| {
            let (column, direction) = part.split_once(':').unwrap_or((part, ""));
            let column = SortColumn::from_name(column.trim())?;
            if !column.applies_to(metric) || (column.is_opponent() && !group_by_opponent) {
                return None;
            }
            let direction = direction.trim().to_ascii_lowercase();
            Some(SortKey {
                column,
                descending: !(direction.is_empty() || direction == "asc"),
            })
        })
        .collect()
}

/// A complete aggregate query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsQuery {
    /// Applied to raw records before grouping.
    pub filter: RecordFilter,
    /// Add opponent class and school to the grouping key.
    pub group_by_opponent: bool,
    /// Sort specification, see [`parse_sort`].
    pub sort: String,
}

impl StatsQuery {
    pub fn new(filter: RecordFilter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn group_by_opponent(mut self, enabled: bool) -> Self {
        self.group_by_opponent = enabled;
        self
    }

    pub fn sorted_by(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }

    /// Sort keys that apply to `metric` under this query's grouping.
    pub fn sort_keys(&self, metric: Metric) -> Vec<SortKey> {
        parse_sort(&self.sort, metric, self.group_by_opponent)
    }
}
