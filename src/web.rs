//! HTTP surface: public read API with live updates and the key-gated admin API.

use crate::collection::{Direction, Entry, OrderedCollection, RemoveOutcome, ReorderOutcome};
use crate::config::Config;
use crate::db::DocumentStore;
use crate::error::{CmsError, Result};
use crate::export::{import_bundle, ImportBundle};
use crate::i18n::{localize, Language, LanguageRegistry, LanguageStrings};
use crate::media::{MediaRef, MediaStore};
use crate::models::{CollectionKind, ProjectCategory};
use crate::security;
use crate::settings::Settings;
use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post, put},
    Json, Router,
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

// ==================== Error Responses ====================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl CmsError {
    pub fn status(&self) -> StatusCode {
        match self {
            CmsError::Validation(_) | CmsError::Image(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CmsError::NotFound { .. } | CmsError::UnknownCollection(_) => StatusCode::NOT_FOUND,
            CmsError::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
            CmsError::Unauthorized => StatusCode::UNAUTHORIZED,
            CmsError::UnsupportedMedia(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            CmsError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            CmsError::Store(_) | CmsError::PartialReorder { .. } | CmsError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CmsError::Validation(_) => "validation_error",
            CmsError::NotFound { .. } => "not_found",
            CmsError::UnknownCollection(_) => "unknown_collection",
            CmsError::UnsupportedLanguage(_) => "unsupported_language",
            CmsError::Unauthorized => "unauthorized",
            CmsError::Store(_) => "store_error",
            CmsError::PartialReorder { .. } => "partial_reorder",
            CmsError::UnsupportedMedia(_) => "unsupported_media",
            CmsError::PayloadTooLarge { .. } => "payload_too_large",
            CmsError::Image(_) => "invalid_image",
            CmsError::Io(_) => "io_error",
        }
    }
}

impl IntoResponse for CmsError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
        });

        (status, body).into_response()
    }
}

// ==================== State ====================

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub settings: Settings,
    pub media: MediaStore,
    admin_api_key: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: &Config) -> Self {
        Self {
            settings: Settings::new(store.clone()),
            media: MediaStore::from_config(config),
            admin_api_key: Arc::from(config.admin_api_key.as_str()),
            store,
        }
    }

    pub fn collection(&self, name: &str) -> Result<OrderedCollection> {
        let kind = CollectionKind::from_name(name)?;
        Ok(OrderedCollection::new(self.store.clone(), kind))
    }
}

// ==================== Router ====================

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api/languages", get(languages))
        .route("/api/strings", get(strings))
        .route("/api/settings", get(get_settings))
        .route("/api/:collection", get(list_public))
        .route("/api/:collection/stream", get(stream_public));

    let upload_limit = DefaultBodyLimit::max(state.media.max_bytes().saturating_add(1));
    let admin = Router::new()
        .route("/admin/session", get(session))
        .route("/admin/import", post(import))
        .route("/admin/settings", put(put_setting))
        .route("/admin/media", post(upload_media).layer(upload_limit))
        .route("/admin/export/:collection", get(export_collection))
        .route("/admin/:collection", get(list_admin).post(add_entry))
        .route(
            "/admin/:collection/:id",
            put(update_entry).delete(remove_entry),
        )
        .route("/admin/:collection/:id/move", post(move_entry))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let mut app = public.merge(admin);

    let prefix = state.media.url_prefix();
    if prefix.starts_with('/') && prefix.len() > 1 {
        app = app.nest_service(prefix, ServeDir::new(state.media.upload_dir()));
    } else {
        warn!("Upload prefix {:?} is not a local path; uploads are not served", prefix);
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Bind `0.0.0.0:port` and serve until Ctrl-C.
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on {}", addr);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match security::verify_admin(authorization, &state.admin_api_key) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            warn!("Rejected admin request to {}", request.uri().path());
            e.into_response()
        }
    }
}

// ==================== Public Handlers ====================

#[derive(Debug, Deserialize)]
pub struct LangQuery {
    pub lang: Option<String>,
}

impl LangQuery {
    fn language(&self) -> Result<Language> {
        Language::from_query(self.lang.as_deref())
    }
}

#[derive(Debug, Serialize)]
struct LanguageInfo {
    code: &'static str,
    name: &'static str,
    native_name: &'static str,
    canonical: bool,
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn languages() -> Json<Vec<LanguageInfo>> {
    let languages = LanguageRegistry::get()
        .list_enabled()
        .into_iter()
        .map(|lang| LanguageInfo {
            code: lang.code,
            name: lang.name,
            native_name: lang.native_name,
            canonical: lang.is_canonical,
        })
        .collect();
    Json(languages)
}

async fn strings(Query(query): Query<LangQuery>) -> Result<Json<&'static LanguageStrings>> {
    Ok(Json(LanguageStrings::for_language(query.language()?)))
}

async fn get_settings(State(state): State<AppState>) -> Result<Json<BTreeMap<String, String>>> {
    Ok(Json(state.settings.get().await?))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub lang: Option<String>,
    pub category: Option<String>,
}

/// How a public list is filtered and localized.
#[derive(Debug, Clone)]
struct PublicView {
    kind: CollectionKind,
    language: Language,
    category: Option<String>,
}

impl PublicView {
    fn new(kind: CollectionKind, query: ListQuery) -> Result<Self> {
        let language = Language::from_query(query.lang.as_deref())?;
        // "All" is the unfiltered tab
        let category = query
            .category
            .map(|category| category.trim().to_string())
            .filter(|category| !category.is_empty() && !category.eq_ignore_ascii_case("all"));

        Ok(Self {
            kind,
            language,
            category,
        })
    }

    /// Keep entries of the requested category, then resolve every field for
    /// the language and drop the variant keys.
    fn render(&self, entries: Vec<Entry>) -> Vec<Entry> {
        entries
            .into_iter()
            .filter(|entry| match &self.category {
                Some(category) => {
                    entry.fields.get("category").and_then(Value::as_str) == Some(category.as_str())
                }
                None => true,
            })
            .map(|entry| Entry {
                fields: self.localize(&entry.fields),
                ..entry
            })
            .collect()
    }

    fn localize(&self, fields: &Map<String, Value>) -> Map<String, Value> {
        let mut localized = localize(fields, self.language);
        if self.kind == CollectionKind::Projects {
            let label = localized
                .get("category")
                .and_then(Value::as_str)
                .and_then(ProjectCategory::from_name)
                .map(|category| category.label(self.language));
            if let Some(label) = label {
                localized.insert("category".to_string(), Value::from(label));
            }
        }
        localized
    }
}

async fn list_public(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Entry>>> {
    let collection = state.collection(&collection)?;
    let view = PublicView::new(collection.kind(), query)?;
    let entries = collection.list().await?;
    Ok(Json(view.render(entries)))
}

async fn stream_public(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>>> {
    let collection = state.collection(&collection)?;
    let view = PublicView::new(collection.kind(), query)?;

    let events = collection
        .subscribe()
        .into_stream()
        .map(move |snapshot| match snapshot {
            Ok(entries) => Event::default()
                .event("snapshot")
                .json_data(view.render(entries)),
            Err(e) => {
                error!("Live view refresh failed: {}", e);
                Ok(Event::default().event("error").data(e.to_string()))
            }
        });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

// ==================== Admin Handlers ====================

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub direction: Direction,
}

#[derive(Debug, Deserialize)]
pub struct SettingUpdate {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
struct RemoveResponse {
    status: RemoveOutcome,
}

async fn session() -> Json<Value> {
    Json(json!({ "authenticated": true }))
}

async fn list_admin(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Json<Vec<Entry>>> {
    Ok(Json(state.collection(&collection)?.list().await?))
}

async fn add_entry(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(fields): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<Entry>)> {
    let entry = state.collection(&collection)?.add(fields).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_entry(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(fields): Json<Map<String, Value>>,
) -> Result<Json<Entry>> {
    Ok(Json(state.collection(&collection)?.update(&id, fields).await?))
}

async fn remove_entry(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<RemoveResponse>> {
    let status = state
        .collection(&collection)?
        .remove(&id, query.confirm.into())
        .await?;
    Ok(Json(RemoveResponse { status }))
}

async fn move_entry(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<ReorderOutcome>> {
    let outcome = state
        .collection(&collection)?
        .reorder(&id, request.direction)
        .await?;
    Ok(Json(outcome))
}

async fn export_collection(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Response> {
    let file = state.collection(&collection)?.export().await?;
    let headers = [
        (header::CONTENT_TYPE, "application/json".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.filename),
        ),
    ];
    Ok((headers, file.body).into_response())
}

async fn import(
    State(state): State<AppState>,
    Json(bundle): Json<ImportBundle>,
) -> Result<Json<Value>> {
    let imported = import_bundle(state.store.as_ref(), bundle).await?;
    Ok(Json(json!({ "imported": imported })))
}

async fn put_setting(
    State(state): State<AppState>,
    Json(update): Json<SettingUpdate>,
) -> Result<Json<BTreeMap<String, String>>> {
    state.settings.merge(&update.key, &update.value).await?;
    Ok(Json(state.settings.get().await?))
}

async fn upload_media(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<MediaRef>)> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            let limit = state.media.max_bytes();
            let size = headers
                .get(header::CONTENT_LENGTH)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok())
                .unwrap_or(limit + 1);
            CmsError::PayloadTooLarge { size, limit }
        } else {
            CmsError::Validation(rejection.body_text())
        }
    })?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let media_ref = state.media.store(body.to_vec(), content_type).await?;
    Ok((StatusCode::CREATED, Json(media_ref)))
}
