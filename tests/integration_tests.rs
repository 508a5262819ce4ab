//! Integration tests for the portfolio content service
//!
//! These tests run the full router on a local port against the in-memory
//! store and drive it over HTTP, the way the public site and the admin panel
//! do. PostgreSQL-backed tests live next to the store in src/db/postgres.rs.

use portfolio_cms::config::{Config, StoreBackend};
use portfolio_cms::db::{DocumentStore, MemoryStore};
use portfolio_cms::web::{self, AppState};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const ADMIN_KEY: &str = "test-admin-key";

// ==================== Test Helpers ====================

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    _temp_dir: TempDir,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.expect("request")
    }

    fn admin(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .bearer_auth(ADMIN_KEY)
    }

    async fn add(&self, collection: &str, body: Value) -> Value {
        let response = self
            .admin(reqwest::Method::POST, &format!("/admin/{}", collection))
            .json(&body)
            .send()
            .await
            .expect("request");
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json().await.expect("json")
    }

    async fn titles(&self, path: &str) -> Vec<String> {
        let entries: Vec<Value> = self.get(path).await.json().await.expect("json");
        entries
            .iter()
            .map(|e| e["title"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

/// Create a test config for the in-memory store with uploads under `temp_dir`
fn create_test_config(temp_dir: &TempDir) -> Config {
    Config {
        store_backend: StoreBackend::Memory,
        database_url: None,
        admin_api_key: ADMIN_KEY.to_string(),
        port: 0,
        upload_dir: temp_dir.path().to_str().unwrap().to_string(),
        upload_url_prefix: "/uploads".to_string(),
        max_upload_bytes: 1024 * 1024,
        image_max_width: 800,
        image_quality: 70,
    }
}

async fn spawn_server() -> TestServer {
    spawn_server_with(|_| {}).await
}

async fn spawn_server_with(configure: impl FnOnce(&mut Config)) -> TestServer {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = create_test_config(&temp_dir);
    configure(&mut config);
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let app = web::router(AppState::new(store, &config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server");
    });

    TestServer {
        base_url: format!("http://{}", addr),
        client: reqwest::Client::new(),
        _temp_dir: temp_dir,
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let buffer = image::ImageBuffer::from_pixel(width, height, image::Rgb([10u8, 120, 200]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(buffer)
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

// ==================== Public API Tests ====================

#[tokio::test]
async fn test_health() {
    let server = spawn_server().await;
    let response = server.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_languages_and_strings() {
    let server = spawn_server().await;

    let languages: Vec<Value> = server.get("/api/languages").await.json().await.unwrap();
    let codes: Vec<&str> = languages.iter().filter_map(|l| l["code"].as_str()).collect();
    assert_eq!(codes, vec!["en", "tr"]);

    let strings: Value = server.get("/api/strings?lang=tr").await.json().await.unwrap();
    assert!(strings["projects_title"].is_string());

    let response = server.get("/api/strings?lang=de").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_collection_is_404() {
    let server = spawn_server().await;

    let response = server.get("/api/pets").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "unknown_collection");
}

#[tokio::test]
async fn test_public_list_is_localized() {
    let server = spawn_server().await;
    server
        .add(
            "blogs",
            json!({"title": "Hello", "title_tr": "Merhaba", "excerpt": "Intro", "excerpt_tr": ""}),
        )
        .await;

    let english: Vec<Value> = server.get("/api/blogs").await.json().await.unwrap();
    assert_eq!(english[0]["title"], "Hello");
    assert!(english[0].get("title_tr").is_none());

    let turkish: Vec<Value> = server.get("/api/blogs?lang=tr").await.json().await.unwrap();
    assert_eq!(turkish[0]["title"], "Merhaba");
    // Empty variant falls back to the canonical text
    assert_eq!(turkish[0]["excerpt"], "Intro");

    let response = server.get("/api/blogs?lang=de").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_project_category_is_localized_and_filterable() {
    let server = spawn_server().await;
    server
        .add("projects", json!({"title": "Phone", "category": "Mobile App"}))
        .await;
    server
        .add("projects", json!({"title": "Cli", "category": "Tools"}))
        .await;

    let turkish: Vec<Value> = server.get("/api/projects?lang=tr").await.json().await.unwrap();
    let labels: Vec<&str> = turkish.iter().filter_map(|e| e["category"].as_str()).collect();
    assert_eq!(labels, vec!["Araçlar", "Mobil Uygulama"]);

    let english: Vec<Value> = server.get("/api/projects").await.json().await.unwrap();
    assert_eq!(english[0]["category"], "Tools");

    assert_eq!(
        server.titles("/api/projects?category=Tools").await,
        vec!["Cli"]
    );
    assert_eq!(
        server.titles("/api/projects?lang=tr&category=Mobile%20App").await,
        vec!["Phone"]
    );
    assert_eq!(server.titles("/api/projects?category=All").await.len(), 2);
    assert!(server
        .titles("/api/projects?category=Web%20Development")
        .await
        .is_empty());
}

// ==================== Admin Gate Tests ====================

#[tokio::test]
async fn test_admin_requires_key() {
    let server = spawn_server().await;

    let response = server.get("/admin/session").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "unauthorized");

    let response = server
        .client
        .get(server.url("/admin/projects"))
        .bearer_auth("wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = server
        .admin(reqwest::Method::GET, "/admin/session")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ==================== Collection Editing Tests ====================

#[tokio::test]
async fn test_add_requires_title() {
    let server = spawn_server().await;

    let response = server
        .admin(reqwest::Method::POST, "/admin/projects")
        .json(&json!({"title_tr": "Sadece Türkçe"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Title (EN) is required");
    assert!(server.titles("/api/projects").await.is_empty());
}

#[tokio::test]
async fn test_new_entries_appear_at_top() {
    let server = spawn_server().await;
    server.add("projects", json!({"title": "First", "order": 2})).await;
    server.add("projects", json!({"title": "Second", "order": 5})).await;
    server.add("projects", json!({"title": "New"})).await;

    assert_eq!(
        server.titles("/api/projects").await,
        vec!["New", "First", "Second"]
    );
}

#[tokio::test]
async fn test_update_replaces_fields() {
    let server = spawn_server().await;
    let created = server
        .add("certificates", json!({"title": "Old", "description": "gone"}))
        .await;
    let id = created["id"].as_str().unwrap();

    let response = server
        .admin(reqwest::Method::PUT, &format!("/admin/certificates/{}", id))
        .json(&json!({"title": "Renamed"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let entries: Vec<Value> = server.get("/api/certificates").await.json().await.unwrap();
    assert_eq!(entries[0]["title"], "Renamed");
    assert!(entries[0].get("description").is_none());

    let response = server
        .admin(reqwest::Method::PUT, "/admin/certificates/missing")
        .json(&json!({"title": "X"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_move_swaps_neighbours() {
    let server = spawn_server().await;
    server.add("projects", json!({"title": "A", "order": 0})).await;
    let b = server.add("projects", json!({"title": "B", "order": 1})).await;
    let b_id = b["id"].as_str().unwrap();
    let move_path = format!("/admin/projects/{}/move", b_id);

    let response = server
        .admin(reqwest::Method::POST, &move_path)
        .json(&json!({"direction": "up"}))
        .send()
        .await
        .unwrap();
    let outcome: Value = response.json().await.unwrap();
    assert_eq!(outcome, json!({"status": "moved", "from": 1, "to": 0}));
    assert_eq!(server.titles("/api/projects").await, vec!["B", "A"]);

    let outcome: Value = server
        .admin(reqwest::Method::POST, &move_path)
        .json(&json!({"direction": "up"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(outcome, json!({"status": "unchanged"}));
}

#[tokio::test]
async fn test_delete_needs_confirmation() {
    let server = spawn_server().await;
    let created = server.add("blogs", json!({"title": "Doomed"})).await;
    let path = format!("/admin/blogs/{}", created["id"].as_str().unwrap());

    let body: Value = server
        .admin(reqwest::Method::DELETE, &path)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "cancelled");
    assert_eq!(server.titles("/api/blogs").await, vec!["Doomed"]);

    let body: Value = server
        .admin(reqwest::Method::DELETE, &format!("{}?confirm=true", path))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "deleted");
    assert!(server.titles("/api/blogs").await.is_empty());

    let response = server
        .admin(reqwest::Method::DELETE, &format!("{}?confirm=true", path))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ==================== Export / Import Tests ====================

#[tokio::test]
async fn test_export_download() {
    let server = spawn_server().await;
    server.add("projects", json!({"title": "Late", "order": 1})).await;
    server.add("projects", json!({"title": "Early", "order": 0})).await;

    let response = server
        .admin(reqwest::Method::GET, "/admin/export/projects")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert_eq!(disposition, "attachment; filename=\"projects.json\"");

    let exported: Vec<Value> = response.json().await.unwrap();
    let titles: Vec<&str> = exported.iter().filter_map(|e| e["title"].as_str()).collect();
    assert_eq!(titles, vec!["Early", "Late"]);
}

#[tokio::test]
async fn test_import_bundle() {
    let server = spawn_server().await;

    let response = server
        .admin(reqwest::Method::POST, "/admin/import")
        .json(&json!({
            "projects": [
                {"id": "p1", "order": 1, "title": "One"},
                {"id": "p2", "order": 0, "title": "Two"}
            ],
            "blogs": [{"id": "b1", "title": "Post"}]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["imported"], 3);

    assert_eq!(server.titles("/api/projects").await, vec!["Two", "One"]);
    assert_eq!(server.titles("/api/blogs").await, vec!["Post"]);
}

#[tokio::test]
async fn test_entry_named_export_is_editable() {
    let server = spawn_server().await;
    let response = server
        .admin(reqwest::Method::POST, "/admin/import")
        .json(&json!({"projects": [{"id": "export", "title": "Exporter"}]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = server
        .admin(reqwest::Method::PUT, "/admin/projects/export")
        .json(&json!({"title": "Renamed"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(server.titles("/api/projects").await, vec!["Renamed"]);

    let body: Value = server
        .admin(reqwest::Method::DELETE, "/admin/projects/export?confirm=true")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "deleted");
    assert!(server.titles("/api/projects").await.is_empty());
}

// ==================== Settings Tests ====================

#[tokio::test]
async fn test_settings_merge() {
    let server = spawn_server().await;

    for (key, value) in [("cv_en", "/uploads/en.pdf"), ("cv_tr", "/uploads/tr.pdf")] {
        let response = server
            .admin(reqwest::Method::PUT, "/admin/settings")
            .json(&json!({"key": key, "value": value}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let settings: Value = server.get("/api/settings").await.json().await.unwrap();
    assert_eq!(
        settings,
        json!({"cv_en": "/uploads/en.pdf", "cv_tr": "/uploads/tr.pdf"})
    );
}

// ==================== Media Tests ====================

#[tokio::test]
async fn test_media_upload_is_served() {
    let server = spawn_server().await;

    let response = server
        .admin(reqwest::Method::POST, "/admin/media")
        .header(reqwest::header::CONTENT_TYPE, "image/png")
        .body(png(1000, 500))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let media: Value = response.json().await.unwrap();
    assert_eq!(media["width"], 800);
    assert_eq!(media["height"], 400);

    let url = media["url"].as_str().unwrap();
    let response = server.get(url).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(reqwest::header::CONTENT_TYPE).unwrap(),
        "image/jpeg"
    );
}

#[tokio::test]
async fn test_media_rejects_non_images() {
    let server = spawn_server().await;

    let response = server
        .admin(reqwest::Method::POST, "/admin/media")
        .header(reqwest::header::CONTENT_TYPE, "application/pdf")
        .body(b"%PDF-1.4".to_vec())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_media_over_body_limit_is_json_413() {
    let server = spawn_server_with(|config| config.max_upload_bytes = 1024).await;

    let response = server
        .admin(reqwest::Method::POST, "/admin/media")
        .header(reqwest::header::CONTENT_TYPE, "image/png")
        .body(vec![0u8; 4096])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "payload_too_large");
    assert!(body["error"].as_str().unwrap().contains("1024"));
}

// ==================== Live Stream Tests ====================

/// Read SSE chunks until the buffer contains `needle`.
async fn read_until(response: &mut reqwest::Response, buffer: &mut String, needle: &str) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !buffer.contains(needle) {
            let chunk = response
                .chunk()
                .await
                .expect("stream chunk")
                .expect("stream ended");
            buffer.push_str(&String::from_utf8_lossy(&chunk));
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {:?}, got {:?}", needle, buffer));
}

#[tokio::test]
async fn test_stream_pushes_snapshots() {
    let server = spawn_server().await;

    let mut response = server.get("/api/projects/stream?lang=tr").await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut buffer = String::new();
    read_until(&mut response, &mut buffer, "event: snapshot").await;
    buffer.clear();

    server
        .add("projects", json!({"title": "Live", "title_tr": "Canlı"}))
        .await;

    read_until(&mut response, &mut buffer, "Canlı").await;
    assert!(buffer.contains("event: snapshot"));
    assert!(!buffer.contains("title_tr"));
}

#[tokio::test]
async fn test_stream_filters_by_category() {
    let server = spawn_server().await;

    let mut response = server
        .get("/api/projects/stream?lang=tr&category=Tools")
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut buffer = String::new();
    read_until(&mut response, &mut buffer, "event: snapshot").await;
    buffer.clear();

    server
        .add("projects", json!({"title": "Phone", "category": "Mobile App"}))
        .await;
    server
        .add("projects", json!({"title": "Cli", "category": "Tools"}))
        .await;

    read_until(&mut response, &mut buffer, "Cli").await;
    assert!(buffer.contains("Araçlar"));
    assert!(!buffer.contains("Phone"));
}
