//! CSV rendering of aggregate rows.

use crate::aggregate::{DurationRow, WinRateRow};
use crate::error::StatsError;
use csv::Writer;

const GROUP_COLUMNS: [&str; 4] = ["server", "class", "schools", "source_type"];
const OPPONENT_COLUMNS: [&str; 2] = ["opponent_class", "opponent_schools"];
const WIN_RATE_COLUMNS: [&str; 4] = ["win_count", "lose_count", "match_count", "win_rate"];
const DURATION_COLUMNS: [&str; 4] = [
    "avg_duration",
    "max_duration",
    "min_duration",
    "median_duration",
];

/// Render win-rate rows. An undefined win rate is an empty field.
pub fn win_rate_csv(rows: &[WinRateRow], group_by_opponent: bool) -> Result<String, StatsError> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(header(group_by_opponent, &WIN_RATE_COLUMNS))?;
    for row in rows {
        let mut record = group_fields(
            row.server,
            row.own_class,
            row.own_school,
            row.source_type,
            group_by_opponent.then_some((row.opponent_class, row.opponent_school)),
        );
        record.extend([
            row.win_count.to_string(),
            row.lose_count.to_string(),
            row.match_count.to_string(),
            row.win_rate.map(|rate| rate.to_string()).unwrap_or_default(),
        ]);
        writer.write_record(&record)?;
    }
    finish(writer)
}

/// Render duration rows.
pub fn duration_csv(rows: &[DurationRow], group_by_opponent: bool) -> Result<String, StatsError> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(header(group_by_opponent, &DURATION_COLUMNS))?;
    for row in rows {
        let mut record = group_fields(
            row.server,
            row.own_class,
            row.own_school,
            row.source_type,
            group_by_opponent.then_some((row.opponent_class, row.opponent_school)),
        );
        record.extend([
            row.avg_duration.to_string(),
            row.max_duration.to_string(),
            row.min_duration.to_string(),
            row.median_duration.to_string(),
        ]);
        writer.write_record(&record)?;
    }
    finish(writer)
}

fn header(group_by_opponent: bool, aggregate_columns: &[&'static str]) -> Vec<&'static str> {
    let mut columns = GROUP_COLUMNS.to_vec();
    if group_by_opponent {
        columns.extend(OPPONENT_COLUMNS);
    }
    columns.extend_from_slice(aggregate_columns);
    columns
}

fn group_fields(
    server: i64,
    own_class: i32,
    own_school: i32,
    source_type: i32,
    opponent: Option<(Option<i32>, Option<i32>)>,
) -> Vec<String> {
    let mut fields = vec![
        server.to_string(),
        own_class.to_string(),
        own_school.to_string(),
        source_type.to_string(),
    ];
    if let Some((class, school)) = opponent {
        fields.push(class.map(|c| c.to_string()).unwrap_or_default());
        fields.push(school.map(|s| s.to_string()).unwrap_or_default());
    }
    fields
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String, StatsError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| StatsError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| StatsError::Export(e.to_string()))
}
