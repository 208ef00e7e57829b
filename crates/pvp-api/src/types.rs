//! API request and response types.

use crate::error::ApiError;
use pvp_ingestion::ImportReport;
use pvp_stats::{DurationRow, StatsQuery, WinRateRow};
use pvp_types::{source_type_name, RecordFilter};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Query parameters shared by the stats and export endpoints.
///
/// Plural parameters are comma-separated integer lists.
#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    pub servers: Option<String>,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
    pub min_level: Option<i64>,
    pub max_level: Option<i64>,
    pub clazz: Option<i32>,
    pub schools: Option<i32>,
    pub opponent_class: Option<i32>,
    pub opponent_schools: Option<i32>,
    pub spirit_animal: Option<String>,
    pub spirit_animal_talents: Option<i64>,
    pub legendary_runes: Option<String>,
    pub super_armor: Option<i64>,
    pub source_types: Option<String>,
    pub sort: Option<String>,
    #[serde(default)]
    pub group_by_opponent: bool,
}

impl StatsParams {
    /// Build the engine query, rejecting malformed integer lists.
    pub fn to_query(&self) -> Result<StatsQuery, ApiError> {
        let filter = RecordFilter {
            servers: parse_int_list("servers", self.servers.as_deref())?,
            start_ts: self.start_ts,
            end_ts: self.end_ts,
            min_level: self.min_level,
            max_level: self.max_level,
            own_class: self.clazz,
            own_school: self.schools,
            opponent_class: self.opponent_class,
            opponent_school: self.opponent_schools,
            companions: parse_int_list("spirit_animal", self.spirit_animal.as_deref())?,
            companion_talent: self.spirit_animal_talents,
            legendary_items: parse_int_list("legendary_runes", self.legendary_runes.as_deref())?,
            special_gear: self.super_armor,
            source_types: parse_int_list("source_types", self.source_types.as_deref())?,
        };

        Ok(StatsQuery::new(filter)
            .group_by_opponent(self.group_by_opponent)
            .sorted_by(self.sort.clone().unwrap_or_default()))
    }
}

/// Parse a comma-separated integer list; blank entries are skipped.
pub fn parse_int_list<T: FromStr>(name: &str, raw: Option<&str>) -> Result<Vec<T>, ApiError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse().map_err(|_| {
                ApiError::BadRequest(format!("{name}: {part:?} is not an integer"))
            })
        })
        .collect()
}

/// Query parameters specific to the CSV export.
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    /// `winrate` (default) or `duration`.
    #[serde(default = "default_metric")]
    pub metric: String,
}

fn default_metric() -> String {
    "winrate".to_string()
}

/// Envelope for aggregate rows.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: Vec<T>,
}

/// Win-rate row with its source type name.
#[derive(Debug, Serialize)]
pub struct WinRateEntry {
    #[serde(flatten)]
    pub row: WinRateRow,
    pub source_type_name: String,
}

impl From<WinRateRow> for WinRateEntry {
    fn from(row: WinRateRow) -> Self {
        Self {
            source_type_name: display_name(row.source_type),
            row,
        }
    }
}

/// Duration row with its source type name.
#[derive(Debug, Serialize)]
pub struct DurationEntry {
    #[serde(flatten)]
    pub row: DurationRow,
    pub source_type_name: String,
}

impl From<DurationRow> for DurationEntry {
    fn from(row: DurationRow) -> Self {
        Self {
            source_type_name: display_name(row.source_type),
            row,
        }
    }
}

fn display_name(code: i32) -> String {
    source_type_name(code)
        .map(str::to_string)
        .unwrap_or_else(|| format!("unknown source ({code})"))
}

/// Result of an on-demand import.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    /// Rows written by the run.
    pub imported: u64,
    #[serde(flatten)]
    pub report: ImportReport,
}

impl From<ImportReport> for ImportResponse {
    fn from(report: ImportReport) -> Self {
        Self {
            imported: report.rows_imported,
            report,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}
