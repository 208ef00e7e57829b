//! Aggregates computed through the engine against real stores.

use pvp_stats::{Metric, StatsEngine, StatsQuery};
use pvp_store::{MemoryStore, RecordStore, SqliteStore};
use pvp_types::{MatchRecord, RecordFilter};
use std::sync::Arc;

fn record(server: i64, source_type: i32, is_win: i32, duration: i64) -> MatchRecord {
    let mut r = MatchRecord::new(server, 1000, 50, 3, 1);
    r.opponent_class = 4;
    r.opponent_school = 2;
    r.source_type = source_type;
    r.is_win = is_win;
    r.duration_seconds = duration;
    r
}

/// The two rows produced by a fanned-out champion league event on 8002.
fn fan_out_rows() -> Vec<MatchRecord> {
    vec![record(8002, 1, 1, 120), record(8002, 4, 1, 120)]
}

fn engines() -> Vec<StatsEngine> {
    let memory = Arc::new(MemoryStore::new());
    memory.insert_batch(&fan_out_rows()).unwrap();

    let sqlite = Arc::new(SqliteStore::open_in_memory().unwrap());
    sqlite.insert_batch(&fan_out_rows()).unwrap();

    vec![StatsEngine::new(memory), StatsEngine::new(sqlite)]
}

#[test]
fn test_fan_out_reported_under_cluster() {
    for engine in engines() {
        let query = StatsQuery::new(RecordFilter::new().with_source_types(vec![1]));
        let rows = engine.win_rate(&query).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].server, 8001);
        assert_eq!(rows[0].source_type, 1);
        assert_eq!(rows[0].win_count, 1);
        assert_eq!(rows[0].win_rate, Some(1.0));

        let query = StatsQuery::new(RecordFilter::new().with_source_types(vec![4]));
        let rows = engine.duration(&query).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].median_duration, 120);
    }
}

#[test]
fn test_server_filter_uses_raw_ids() {
    for engine in engines() {
        let by_representative = StatsQuery::new(RecordFilter::new().with_servers(vec![8001]));
        assert!(engine.win_rate(&by_representative).unwrap().is_empty());

        let by_raw = StatsQuery::new(RecordFilter::new().with_servers(vec![8002]));
        assert_eq!(engine.win_rate(&by_raw).unwrap().len(), 2);
    }
}

#[test]
fn test_empty_store() {
    let engine = StatsEngine::new(Arc::new(MemoryStore::new()));
    let query = StatsQuery::default();
    assert!(engine.win_rate(&query).unwrap().is_empty());
    assert!(engine.duration(&query).unwrap().is_empty());
}

#[test]
fn test_sorted_and_grouped_by_opponent() {
    let store = Arc::new(MemoryStore::new());
    let mut other = record(8024, 3, 0, 30);
    other.opponent_class = 7;
    store
        .insert_batch(&[record(8001, 3, 1, 60), record(8027, 3, 1, 90), other])
        .unwrap();
    let engine = StatsEngine::new(store);

    let query = StatsQuery::default()
        .group_by_opponent(true)
        .sorted_by("opponent_class:desc");
    let rows = engine.win_rate(&query).unwrap();
    let keys: Vec<_> = rows.iter().map(|r| (r.server, r.opponent_class)).collect();
    assert_eq!(keys, vec![(8024, Some(7)), (8001, Some(4)), (8024, Some(4))]);

    // opponent sort is ignored without the breakdown
    let query = StatsQuery::default().sorted_by("opponent_class:desc,win_rate:asc");
    let rows = engine.win_rate(&query).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].server, 8024);
    assert_eq!(rows[0].win_rate, Some(0.5));
}

#[test]
fn test_export_matches_query() {
    let engine = engines().remove(0);
    let csv = engine
        .export_csv(Metric::WinRate, &StatsQuery::default().group_by_opponent(true))
        .unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "8001,3,1,1,4,2,1,0,1,1");
    assert_eq!(lines[2], "8001,3,1,4,4,2,1,0,1,1");
}

#[test]
fn test_row_json_shape() {
    let engine = engines().remove(0);
    let rows = engine.win_rate(&StatsQuery::default()).unwrap();
    let json = serde_json::to_value(&rows[0]).unwrap();
    assert_eq!(json["class"], 3);
    assert_eq!(json["schools"], 1);
    assert!(json.get("opponent_class").is_none());
}

#[test]
fn test_grouped_store_matches_memory_across_clusters() {
    let mut rows = Vec::new();
    for (server, is_win, duration) in [
        (8001, 1, 40),
        (8002, 0, 10),
        (8004, 1, 30),
        (8004, 0, 30),
        (8024, 1, 50),
        (8027, 0, 20),
        (8030, 1, 70),
    ] {
        rows.push(record(server, 1, is_win, duration));
    }
    let memory = Arc::new(MemoryStore::new());
    memory.insert_batch(&rows).unwrap();
    let sqlite = Arc::new(SqliteStore::open_in_memory().unwrap());
    sqlite.insert_batch(&rows).unwrap();
    let memory = StatsEngine::new(memory);
    let sqlite = StatsEngine::new(sqlite);

    for by_opponent in [false, true] {
        let query = StatsQuery::default()
            .group_by_opponent(by_opponent)
            .sorted_by("match_count:desc");
        assert_eq!(
            sqlite.win_rate(&query).unwrap(),
            memory.win_rate(&query).unwrap()
        );
        assert_eq!(
            sqlite.duration(&query).unwrap(),
            memory.duration(&query).unwrap()
        );
    }

    let rows = sqlite.duration(&StatsQuery::default()).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].server, 8001);
    assert_eq!(rows[0].avg_duration, 27.5);
    assert_eq!(rows[0].median_duration, 30);
    assert_eq!(rows[1].server, 8024);
    assert_eq!(rows[1].median_duration, 20);
}
