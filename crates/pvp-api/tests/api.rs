//! Router-level tests driven through `tower::ServiceExt::oneshot`.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use pvp_api::{create_router, AppState};
use pvp_ingestion::{ImportConfig, ImportCoordinator, Importer};
use pvp_stats::StatsEngine;
use pvp_store::{MemoryStore, RecordStore, StoreError};
use pvp_types::{MatchRecord, RecordFilter};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::{mpsc, Arc, Mutex};
use tower::ServiceExt;

const LINE: &str = r#"{"server":8003,"timestamp":5,"level":40,"class":2,"schools":1,"is_win":0,"duration":75,"source_type":"season_play_pvp_mgr"}"#;

fn record(server: i64, is_win: i32, duration: i64) -> MatchRecord {
    let mut r = MatchRecord::new(server, 1000, 50, 3, 1);
    r.source_type = 1;
    r.is_win = is_win;
    r.duration_seconds = duration;
    r
}

fn app_with(store: Arc<dyn RecordStore>, import_dir: &Path) -> Router {
    let importer = Importer::new(
        store.clone(),
        ImportConfig::default().with_import_dir(import_dir),
    );
    let state = AppState::new(StatsEngine::new(store), ImportCoordinator::new(importer));
    create_router(Arc::new(state))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(MemoryStore::new()), dir.path());

    let (status, json) = get_json(app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_win_rate_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new().with_rows(vec![
        record(8002, 1, 60),
        record(8002, 0, 90),
        record(8010, 1, 30),
    ]);
    let app = app_with(Arc::new(store), dir.path());

    let (status, json) = get_json(app, "/api/stats/winrate?servers=8002&sort=win_rate:desc").await;
    assert_eq!(status, StatusCode::OK);

    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["server"], 8001);
    assert_eq!(data[0]["match_count"], 2);
    assert_eq!(data[0]["win_rate"], 0.5);
    assert_eq!(data[0]["source_type_name"], "champion league win rate");
}

#[tokio::test]
async fn test_duration_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new().with_rows(vec![record(8010, 1, 30), record(8010, 0, 90)]);
    let app = app_with(Arc::new(store), dir.path());

    let (status, json) = get_json(app, "/api/stats/duration").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"][0]["avg_duration"], 60.0);
    assert_eq!(json["data"][0]["median_duration"], 30);
}

#[tokio::test]
async fn test_malformed_list_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(MemoryStore::new()), dir.path());

    let (status, json) = get_json(app, "/api/stats/winrate?servers=a").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "bad_request");
}

#[tokio::test]
async fn test_export_csv() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new().with_rows(vec![record(8002, 1, 60)]);
    let app = app_with(Arc::new(store), dir.path());

    let request = Request::get("/api/export/csv?metric=duration")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"duration.csv\""
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(!text.contains("source_type_name"));

    let (status, _) = get_json(app, "/api/export/csv?metric=elo").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_once() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("matches.jsonl"), format!("{LINE}\n")).unwrap();
    let store = Arc::new(MemoryStore::new());
    let app = app_with(store.clone(), dir.path());

    let request = Request::post("/api/admin/import_once")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    let json: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    // one win-rate row and one duration row
    assert_eq!(json["imported"], 2);
    assert_eq!(json["mode"], "incremental");
    assert_eq!(store.count().unwrap(), 2);
}

/// Store whose writes wait until the test releases them.
struct GatedStore {
    inner: MemoryStore,
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl RecordStore for GatedStore {
    fn insert_batch(&self, rows: &[MatchRecord]) -> Result<usize, StoreError> {
        let _ = self.entered.lock().unwrap().send(());
        let _ = self.release.lock().unwrap().recv();
        self.inner.insert_batch(rows)
    }

    fn scan(&self, filter: &RecordFilter) -> Result<Vec<MatchRecord>, StoreError> {
        self.inner.scan(filter)
    }

    fn count(&self) -> Result<usize, StoreError> {
        self.inner.count()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_import_once_conflict() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("matches.jsonl"), format!("{LINE}\n")).unwrap();

    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let store = Arc::new(GatedStore {
        inner: MemoryStore::new(),
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    });
    let app = app_with(store, dir.path());

    let first = {
        let app = app.clone();
        tokio::spawn(async move {
            let request = Request::post("/api/admin/import_once")
                .body(Body::empty())
                .unwrap();
            send(app, request).await
        })
    };

    tokio::task::spawn_blocking(move || entered_rx.recv().unwrap())
        .await
        .unwrap();

    let request = Request::post("/api/admin/import_once")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "import_in_progress");

    release_tx.send(()).unwrap();
    let (status, _) = first.await.unwrap();
    assert_eq!(status, StatusCode::OK);
}
