//! Integration tests against an in-process stub of the conversion service.
//!
//! The stub serves the same five endpoints as the real backend and records
//! enough about incoming requests (call counts, upload arrival order) to
//! assert the engine's ordering and reconciliation guarantees.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use docflow::models::{ContentView, ConversionFile, FileStatus};
use docflow::validate::UploadPolicy;
use docflow::{ApiClient, Config, ContentViewer, FileRegistry, UploadOrchestrator};

#[derive(Default)]
struct StubState {
    files: Vec<ConversionFile>,
    list_calls: usize,
    content_calls: usize,
    /// Upload filenames in arrival order, including rejected ones.
    uploads: Vec<String>,
    fail_list: bool,
    fail_upload_for: Option<String>,
    markdown_delay_ms: u64,
    malformed_content: bool,
    next_id: usize,
}

type Shared = Arc<Mutex<StubState>>;

fn sample_file(id: &str, filename: &str, status: FileStatus) -> ConversionFile {
    ConversionFile {
        id: id.to_string(),
        filename: filename.to_string(),
        original_type: "pdf".to_string(),
        file_size: 2048,
        status,
        error_message: None,
        metadata: None,
        markdown_path: None,
        json_path: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        page_count: None,
        word_count: None,
        chunk_count: None,
    }
}

async fn spawn_stub(state: Shared) -> String {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let app = Router::new()
        .route("/api/v1/files/upload", post(upload))
        .route("/api/v1/files/list", get(list))
        .route("/api/v1/files/:id", get(get_one).delete(delete_one))
        .route("/api/v1/files/:id/content", get(content))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn list(State(state): State<Shared>) -> Response {
    let mut s = state.lock().unwrap();
    s.list_calls += 1;
    if s.fail_list {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "database unavailable"})),
        )
            .into_response();
    }
    Json(s.files.clone()).into_response()
}

async fn upload(State(state): State<Shared>, mut multipart: Multipart) -> Response {
    let mut filename = String::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        if field.name() == Some("file") {
            filename = field.file_name().unwrap_or("unknown").to_string();
            let _ = field.bytes().await.unwrap();
        }
    }

    let mut s = state.lock().unwrap();
    s.uploads.push(filename.clone());
    if s.fail_upload_for.as_deref() == Some(filename.as_str()) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": "unsupported encoding"})),
        )
            .into_response();
    }

    s.next_id += 1;
    let file = sample_file(&format!("file-{}", s.next_id), &filename, FileStatus::Pending);
    s.files.push(file.clone());
    Json(file).into_response()
}

async fn get_one(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let s = state.lock().unwrap();
    match s.files.iter().find(|f| f.id == id) {
        Some(file) => Json(file.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "file not found"}))).into_response(),
    }
}

async fn delete_one(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut s = state.lock().unwrap();
    let before = s.files.len();
    s.files.retain(|f| f.id != id);
    if s.files.len() == before {
        // No detail field on purpose: exercises the status-text fallback.
        return (StatusCode::NOT_FOUND, Json(json!({}))).into_response();
    }
    Json(json!({"message": "file deleted"})).into_response()
}

#[derive(Deserialize)]
struct ContentQuery {
    #[serde(rename = "type")]
    view: String,
}

async fn content(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Query(query): Query<ContentQuery>,
) -> Response {
    let (delay_ms, malformed) = {
        let mut s = state.lock().unwrap();
        s.content_calls += 1;
        let delay = if query.view == "markdown" {
            s.markdown_delay_ms
        } else {
            0
        };
        (delay, s.malformed_content)
    };

    if delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
    if malformed {
        return Json(json!({"unexpected": true})).into_response();
    }

    let body = match query.view.as_str() {
        "json" => json!({"content": "{\"a\":1}", "metadata": {"page_count": 3}}),
        _ => json!({"content": format!("# {}", id), "metadata": {"page_count": 3}}),
    };
    Json(body).into_response()
}

fn client_for(base_url: &str) -> Arc<ApiClient> {
    let config = Config {
        api_url: base_url.to_string(),
        ..Config::default()
    };
    Arc::new(ApiClient::new(&config).unwrap())
}

#[tokio::test]
async fn test_refresh_replaces_entire_list() {
    let stub = Arc::new(Mutex::new(StubState {
        files: vec![
            sample_file("a", "a.pdf", FileStatus::Pending),
            sample_file("b", "b.pdf", FileStatus::Completed),
        ],
        ..StubState::default()
    }));
    let base = spawn_stub(Arc::clone(&stub)).await;
    let registry = FileRegistry::new(client_for(&base));

    assert!(registry.is_loading());
    registry.refresh_files().await;
    let snapshot = registry.snapshot();
    assert!(!snapshot.loading);
    assert!(snapshot.error.is_none());
    assert_eq!(
        snapshot.files.iter().map(|f| f.id.as_str()).collect::<Vec<_>>(),
        vec!["a", "b"]
    );

    // The next successful poll fully supersedes the previous list; nothing
    // from the old state survives.
    stub.lock().unwrap().files = vec![sample_file("c", "c.pdf", FileStatus::Processing)];
    registry.refresh_files().await;
    let files = registry.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].id, "c");
    assert!(registry.file("c").is_some());
    assert!(registry.file("a").is_none());
}

#[tokio::test]
async fn test_failed_refresh_keeps_last_good_list() {
    let stub = Arc::new(Mutex::new(StubState {
        files: vec![sample_file("a", "a.pdf", FileStatus::Completed)],
        ..StubState::default()
    }));
    let base = spawn_stub(Arc::clone(&stub)).await;
    let registry = FileRegistry::new(client_for(&base));

    registry.refresh_files().await;
    assert_eq!(registry.files().len(), 1);

    stub.lock().unwrap().fail_list = true;
    registry.refresh_files().await;

    let snapshot = registry.snapshot();
    assert!(!snapshot.loading);
    assert_eq!(snapshot.files.len(), 1);
    assert_eq!(snapshot.files[0].id, "a");
    assert_eq!(snapshot.error.as_deref(), Some("database unavailable"));

    // Recovery clears the error again.
    stub.lock().unwrap().fail_list = false;
    registry.refresh_files().await;
    assert!(registry.last_error().is_none());
}

#[tokio::test]
async fn test_delete_clears_matching_selection_only() {
    let stub = Arc::new(Mutex::new(StubState {
        files: vec![
            sample_file("a", "a.pdf", FileStatus::Completed),
            sample_file("b", "b.pdf", FileStatus::Completed),
        ],
        ..StubState::default()
    }));
    let base = spawn_stub(Arc::clone(&stub)).await;
    let registry = FileRegistry::new(client_for(&base));
    registry.refresh_files().await;

    registry.set_selected_file_id(Some("a".to_string()));
    let response = registry.delete_file("a").await.unwrap();
    assert_eq!(response.message, "file deleted");
    assert_eq!(registry.selected_file_id(), None);
    // The forced refresh already reflects the deletion.
    assert_eq!(registry.files().len(), 1);
    assert_eq!(registry.files()[0].id, "b");

    // Deleting a file that is not selected leaves the selection alone.
    registry.set_selected_file_id(Some("missing-selection".to_string()));
    registry.delete_file("b").await.unwrap();
    assert_eq!(
        registry.selected_file_id().as_deref(),
        Some("missing-selection")
    );
}

#[tokio::test]
async fn test_delete_error_falls_back_to_status_text() {
    let stub = Arc::new(Mutex::new(StubState::default()));
    let base = spawn_stub(Arc::clone(&stub)).await;
    let client = client_for(&base);

    let err = client.delete_file("nope").await.unwrap_err();
    assert_eq!(err.to_string(), "Not Found");
}

#[tokio::test]
async fn test_sequential_upload_aborts_at_first_failure() {
    let stub = Arc::new(Mutex::new(StubState {
        fail_upload_for: Some("bad.pdf".to_string()),
        ..StubState::default()
    }));
    let base = spawn_stub(Arc::clone(&stub)).await;
    let client = client_for(&base);
    let registry = FileRegistry::new(Arc::clone(&client));
    let orchestrator = UploadOrchestrator::new(client, Arc::clone(&registry), UploadPolicy::default())
        .with_display_hold(Duration::from_millis(10));

    let candidates = vec![
        docflow::upload::UploadCandidate::new("ok1.pdf", &b"pdf bytes"[..]),
        docflow::upload::UploadCandidate::new("bad.pdf", &b"pdf bytes"[..]),
        docflow::upload::UploadCandidate::new("ok2.pdf", &b"pdf bytes"[..]),
        docflow::upload::UploadCandidate::new("ok3.pdf", &b"pdf bytes"[..]),
    ];
    let report = orchestrator.upload_batch(candidates).await;

    assert_eq!(report.uploaded.len(), 1);
    assert_eq!(report.uploaded[0].filename, "ok1.pdf");
    let (failed_name, failed_err) = report.failed.as_ref().unwrap();
    assert_eq!(failed_name, "bad.pdf");
    assert_eq!(failed_err.to_string(), "unsupported encoding");
    assert_eq!(report.skipped, vec!["ok2.pdf", "ok3.pdf"]);
    assert!(!report.is_success());

    // Server-visible arrival order stops at the failing file; nothing queued
    // behind it was ever submitted.
    let uploads = stub.lock().unwrap().uploads.clone();
    assert_eq!(uploads, vec!["ok1.pdf", "bad.pdf"]);
}

#[tokio::test]
async fn test_upload_sets_selection_and_refreshes() {
    let stub = Arc::new(Mutex::new(StubState::default()));
    let base = spawn_stub(Arc::clone(&stub)).await;
    let client = client_for(&base);
    let registry = FileRegistry::new(Arc::clone(&client));
    let orchestrator = UploadOrchestrator::new(client, Arc::clone(&registry), UploadPolicy::default())
        .with_display_hold(Duration::from_millis(200));
    let progress = orchestrator.progress();

    let report = orchestrator
        .upload_batch(vec![docflow::upload::UploadCandidate::new(
            "report.pdf",
            vec![0u8; 2048],
        )])
        .await;

    assert!(report.is_success());
    assert_eq!(report.uploaded.len(), 1);
    let uploaded_id = report.uploaded[0].id.clone();

    // Selection follows the newly created file.
    assert_eq!(registry.selected_file_id().as_deref(), Some(uploaded_id.as_str()));

    // The post-batch refresh already ran: the list includes the new entry.
    let files = registry.files();
    assert!(files.iter().any(|f| f.id == uploaded_id && f.status == FileStatus::Pending));

    // Progress holds at 100 briefly, then resets to 0.
    assert_eq!(*progress.borrow(), 100);
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(*progress.borrow(), 0);
}

#[tokio::test]
async fn test_validation_rejects_before_any_request() {
    let stub = Arc::new(Mutex::new(StubState::default()));
    let base = spawn_stub(Arc::clone(&stub)).await;
    let client = client_for(&base);
    let registry = FileRegistry::new(Arc::clone(&client));
    let orchestrator =
        UploadOrchestrator::new(client, Arc::clone(&registry), UploadPolicy::default());

    let report = orchestrator
        .upload_batch(vec![docflow::upload::UploadCandidate::new(
            "setup.exe",
            &b"mz"[..],
        )])
        .await;

    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].0, "setup.exe");
    assert!(report.uploaded.is_empty());
    assert!(stub.lock().unwrap().uploads.is_empty());
}

#[tokio::test]
async fn test_view_switch_always_refetches() {
    let stub = Arc::new(Mutex::new(StubState::default()));
    let base = spawn_stub(Arc::clone(&stub)).await;
    let viewer = ContentViewer::new(client_for(&base));

    viewer.show("f-1", ContentView::Markdown).await;
    assert_eq!(stub.lock().unwrap().content_calls, 1);
    let state = viewer.state();
    assert!(!state.loading);
    assert_eq!(state.markdown.as_deref(), Some("# f-1"));
    assert_eq!(state.metadata.unwrap()["page_count"], 3);

    viewer.set_view(ContentView::Json).await;
    assert_eq!(stub.lock().unwrap().content_calls, 2);
    assert_eq!(
        viewer.display_content().as_deref(),
        Some("{\n  \"a\": 1\n}")
    );

    // Toggling back re-queries even though markdown is still cached.
    viewer.set_view(ContentView::Markdown).await;
    assert_eq!(stub.lock().unwrap().content_calls, 3);
    assert_eq!(viewer.display_content().as_deref(), Some("# f-1"));
}

#[tokio::test]
async fn test_fetch_reenters_loading_state() {
    let stub = Arc::new(Mutex::new(StubState {
        markdown_delay_ms: 300,
        ..StubState::default()
    }));
    let base = spawn_stub(Arc::clone(&stub)).await;
    let viewer = Arc::new(ContentViewer::new(client_for(&base)));

    let background = Arc::clone(&viewer);
    let task = tokio::spawn(async move {
        background.show("f-1", ContentView::Markdown).await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(viewer.state().loading);

    task.await.unwrap();
    assert!(!viewer.state().loading);
}

#[tokio::test]
async fn test_stale_response_does_not_overwrite_newer_state() {
    let stub = Arc::new(Mutex::new(StubState {
        markdown_delay_ms: 300,
        ..StubState::default()
    }));
    let base = spawn_stub(Arc::clone(&stub)).await;
    let viewer = Arc::new(ContentViewer::new(client_for(&base)));

    // Slow markdown fetch still in flight...
    let background = Arc::clone(&viewer);
    let stale = tokio::spawn(async move {
        background.show("f-1", ContentView::Markdown).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    // ...superseded by a fast switch to the JSON view.
    viewer.show("f-1", ContentView::Json).await;
    stale.await.unwrap();

    let state = viewer.state();
    assert_eq!(state.view, ContentView::Json);
    assert!(state.json.is_some());
    // The late markdown response was discarded, not stored.
    assert!(state.markdown.is_none());
    assert!(!state.loading);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_malformed_content_is_an_error() {
    let stub = Arc::new(Mutex::new(StubState {
        malformed_content: true,
        ..StubState::default()
    }));
    let base = spawn_stub(Arc::clone(&stub)).await;
    let viewer = ContentViewer::new(client_for(&base));

    viewer.show("f-1", ContentView::Markdown).await;
    let state = viewer.state();
    assert!(!state.loading);
    assert_eq!(
        state.error.as_deref(),
        Some("Invalid response format from server")
    );
    assert!(state.markdown.is_none());
    assert!(viewer.display_content().is_none());
}

#[tokio::test]
async fn test_polling_lifecycle() {
    let stub = Arc::new(Mutex::new(StubState::default()));
    let base = spawn_stub(Arc::clone(&stub)).await;
    let registry = FileRegistry::new(client_for(&base));

    registry.start_polling(Duration::from_millis(100));
    tokio::time::sleep(Duration::from_millis(350)).await;
    let calls = stub.lock().unwrap().list_calls;
    // Immediate refresh plus at least one timer tick.
    assert!(calls >= 2, "expected at least 2 polls, got {}", calls);

    registry.stop_polling();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let after_stop = stub.lock().unwrap().list_calls;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(stub.lock().unwrap().list_calls, after_stop);
}

#[tokio::test]
async fn test_get_one_round_trip() {
    let stub = Arc::new(Mutex::new(StubState {
        files: vec![sample_file("a", "a.pdf", FileStatus::Processing)],
        ..StubState::default()
    }));
    let base = spawn_stub(Arc::clone(&stub)).await;
    let client = client_for(&base);

    let file = client.get_file("a").await.unwrap();
    assert_eq!(file.filename, "a.pdf");
    assert_eq!(file.status, FileStatus::Processing);

    let err = client.get_file("ghost").await.unwrap_err();
    assert_eq!(err.to_string(), "file not found");
}
