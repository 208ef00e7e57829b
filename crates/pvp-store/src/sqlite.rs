//! SQLite-backed record store.
//!
//! Rows live in a single `match_records` table created on open. List
//! columns (companions, talents, legendary items) are stored as JSON text
//! and matched with `json_each`, so every filter criterion runs in the
//! `WHERE` clause. Grouped reads use `GROUP BY` and return partial
//! aggregates instead of rows.

use crate::group::{DurationCounts, GroupFields, WinTally};
use crate::{error::StoreError, RecordStore};
use pvp_types::{MatchRecord, RecordFilter};
use std::collections::BTreeMap;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS match_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    server INTEGER NOT NULL,
    timestamp INTEGER NOT NULL,
    level INTEGER NOT NULL,
    class INTEGER NOT NULL,
    schools INTEGER NOT NULL,
    opponent_class INTEGER NOT NULL,
    opponent_schools INTEGER NOT NULL,
    is_win INTEGER NOT NULL,
    duration INTEGER NOT NULL,
    spirit_animal TEXT,
    spirit_animal_talents TEXT,
    legendary_runes TEXT,
    super_armor INTEGER,
    source_type INTEGER NOT NULL,
    score_ratio INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS ix_records_time ON match_records (timestamp);
CREATE INDEX IF NOT EXISTS ix_records_server ON match_records (server);
CREATE INDEX IF NOT EXISTS ix_records_level ON match_records (level);
CREATE INDEX IF NOT EXISTS ix_records_class_school ON match_records (class, schools);
CREATE INDEX IF NOT EXISTS ix_records_opp_class_school ON match_records (opponent_class, opponent_schools);
CREATE INDEX IF NOT EXISTS ix_records_source_type ON match_records (source_type);
CREATE INDEX IF NOT EXISTS ix_records_score_ratio ON match_records (score_ratio);
"#;

const INSERT: &str = r#"
INSERT INTO match_records (
    server, timestamp, level, class, schools,
    opponent_class, opponent_schools, is_win, duration,
    spirit_animal, spirit_animal_talents, legendary_runes, super_armor,
    source_type, score_ratio
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const SELECT: &str = r#"
SELECT server, timestamp, level, class, schools,
       opponent_class, opponent_schools, is_win, duration,
       spirit_animal, spirit_animal_talents, legendary_runes, super_armor,
       source_type, score_ratio
FROM match_records
"#;

/// SQLite implementation of [`RecordStore`].
///
/// The connection sits behind a mutex, so reads and writes are serialized.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        tracing::debug!("match_records schema ready");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
    }
}

impl RecordStore for SqliteStore {
    fn insert_batch(&self, rows: &[MatchRecord]) -> Result<usize, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(INSERT)?;
            for row in rows {
                stmt.execute(params![
                    row.server,
                    row.timestamp,
                    row.level,
                    row.own_class,
                    row.own_school,
                    row.opponent_class,
                    row.opponent_school,
                    row.is_win,
                    row.duration_seconds,
                    serde_json::to_string(&row.companions)?,
                    serde_json::to_string(&row.companion_talents)?,
                    serde_json::to_string(&row.legendary_items)?,
                    row.special_gear,
                    row.source_type,
                    row.score_ratio,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    fn scan(&self, filter: &RecordFilter) -> Result<Vec<MatchRecord>, StoreError> {
        let (where_clause, values) = build_where(filter);
        let sql = format!("{SELECT}{where_clause} ORDER BY id");

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), read_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn win_tallies(
        &self,
        filter: &RecordFilter,
        group_by_opponent: bool,
    ) -> Result<Vec<(GroupFields, WinTally)>, StoreError> {
        let (where_clause, values) = build_where(filter);
        let (select, group) = group_columns(group_by_opponent);
        let sql = format!(
            "SELECT {select}, SUM(is_win = 1), SUM(is_win = 0), COUNT(*) \
             FROM match_records{where_clause} GROUP BY {group} ORDER BY {group}"
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok((
                read_group(row)?,
                WinTally {
                    wins: read_count(row, 6)?,
                    losses: read_count(row, 7)?,
                    matches: read_count(row, 8)?,
                },
            ))
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn duration_counts(
        &self,
        filter: &RecordFilter,
        group_by_opponent: bool,
    ) -> Result<Vec<(GroupFields, DurationCounts)>, StoreError> {
        let (where_clause, values) = build_where(filter);
        let (select, group) = group_columns(group_by_opponent);
        let sql = format!(
            "SELECT {select}, duration, COUNT(*) \
             FROM match_records{where_clause} GROUP BY {group}, duration"
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok((read_group(row)?, row.get::<_, i64>(6)?, read_count(row, 7)?))
        })?;

        let mut groups: BTreeMap<GroupFields, DurationCounts> = BTreeMap::new();
        for row in rows {
            let (fields, duration, count) = row?;
            *groups.entry(fields).or_default().entry(duration).or_default() += count;
        }
        Ok(groups.into_iter().collect())
    }

    fn count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM match_records", [], |r| r.get(0))?;
        Ok(count as usize)
    }
}

/// Translate `filter` into a `WHERE` clause and its bound values.
fn build_where(filter: &RecordFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    let mut push_in = |column: &str, ids: Vec<i64>, clauses: &mut Vec<String>| {
        if ids.is_empty() {
            return;
        }
        let marks = vec!["?"; ids.len()].join(", ");
        clauses.push(format!("{column} IN ({marks})"));
        values.extend(ids.into_iter().map(Value::Integer));
    };
    push_in("server", filter.servers.clone(), &mut clauses);
    push_in(
        "source_type",
        filter.source_types.iter().map(|&s| i64::from(s)).collect(),
        &mut clauses,
    );

    if !filter.companions.is_empty() {
        let marks = vec!["?"; filter.companions.len()].join(", ");
        values.extend(filter.companions.iter().copied().map(Value::Integer));
        // talents are stored index-aligned with companions
        let talent = match filter.companion_talent.filter(|t| *t != 0) {
            Some(t) => {
                values.push(Value::Integer(t));
                " AND COALESCE(json_extract(spirit_animal_talents, '$[' || c.key || ']'), 0) \
                 IN (?, 0)"
            }
            None => "",
        };
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM json_each(spirit_animal) AS c \
             WHERE c.value IN ({marks}){talent})"
        ));
    }
    if !filter.legendary_items.is_empty() {
        let marks = vec!["?"; filter.legendary_items.len()].join(", ");
        values.extend(filter.legendary_items.iter().copied().map(Value::Integer));
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM json_each(legendary_runes) WHERE value IN ({marks}))"
        ));
    }

    let comparisons = [
        ("timestamp >= ?", filter.start_ts),
        ("timestamp <= ?", filter.end_ts),
        ("level >= ?", filter.min_level),
        ("level <= ?", filter.max_level),
        ("class = ?", filter.own_class.map(i64::from)),
        ("schools = ?", filter.own_school.map(i64::from)),
        ("opponent_class = ?", filter.opponent_class.map(i64::from)),
        ("opponent_schools = ?", filter.opponent_school.map(i64::from)),
        ("super_armor = ?", filter.special_gear),
    ];
    for (clause, value) in comparisons {
        if let Some(v) = value {
            clauses.push(clause.to_string());
            values.push(Value::Integer(v));
        }
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), values)
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<MatchRecord> {
    let mut record = MatchRecord::new(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    );
    record.opponent_class = row.get(5)?;
    record.opponent_school = row.get(6)?;
    record.is_win = row.get(7)?;
    record.duration_seconds = row.get(8)?;
    record.set_companions(json_list(row, 9)?, json_list(row, 10)?);
    record.set_legendary_items(json_list(row, 11)?);
    record.special_gear = row.get(12)?;
    record.source_type = row.get(13)?;
    record.score_ratio = row.get(14)?;
    Ok(record)
}

/// Select list and `GROUP BY` list of a grouped read.
///
/// Without the opponent breakdown the opponent columns are selected as
/// `NULL` so every grouped row has the same shape.
fn group_columns(group_by_opponent: bool) -> (&'static str, &'static str) {
    if group_by_opponent {
        (
            "server, class, schools, source_type, opponent_class, opponent_schools",
            "server, class, schools, source_type, opponent_class, opponent_schools",
        )
    } else {
        (
            "server, class, schools, source_type, NULL, NULL",
            "server, class, schools, source_type",
        )
    }
}

fn read_group(row: &Row<'_>) -> rusqlite::Result<GroupFields> {
    let opponent_class: Option<i32> = row.get(4)?;
    let opponent_school: Option<i32> = row.get(5)?;
    Ok(GroupFields {
        server: row.get(0)?,
        own_class: row.get(1)?,
        own_school: row.get(2)?,
        source_type: row.get(3)?,
        opponent: opponent_class.zip(opponent_school),
    })
}

fn read_count(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    // SUM over an empty group is NULL
    let count: Option<i64> = row.get(idx)?;
    Ok(count.map_or(0, |c| c.max(0) as u64))
}

fn json_list(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<i64>> {
    let text: Option<String> = row.get(idx)?;
    match text {
        None => Ok(Vec::new()),
        Some(text) => serde_json::from_str(&text)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
    }
}
