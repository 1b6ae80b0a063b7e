use crate::{
    config::Config,
    errors::{AppError, AppResult},
    store::{self, archive, list, ops},
};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path as UrlPath, Query, State},
    http::{header, HeaderName, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    /// Canonical root directory; every request path resolves against it.
    pub root: Arc<PathBuf>,
}

pub async fn serve(cfg: Config, root: PathBuf) -> anyhow::Result<()> {
    let addr: std::net::SocketAddr =
        format!("{}:{}", cfg.server.bind_addr, cfg.server.port).parse()?;
    let state = AppState {
        cfg: Arc::new(cfg),
        root: Arc::new(root),
    };
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let json_limit = RequestBodyLimitLayer::new(state.cfg.limits.max_request_kb * 1024);
    // generous slack for multipart framing around the payload itself
    let upload_limit = DefaultBodyLimit::max(state.cfg.max_upload_bytes() + 64 * 1024);
    Router::new()
        .route("/healthz", get(health))
        .route("/api/list", get(list_dir))
        .route("/api/upload", post(upload).layer(upload_limit))
        .route("/api/download/*path", get(download))
        .route("/api/delete/*path", post(delete).layer(json_limit.clone()))
        .route("/api/rename/*path", post(rename).layer(json_limit.clone()))
        .route("/api/create_folder", post(create_folder).layer(json_limit.clone()))
        .route("/api/bulk_delete", post(bulk_delete).layer(json_limit.clone()))
        .route("/api/bulk_download", post(bulk_download).layer(json_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct PathQuery {
    #[serde(default)]
    path: String,
}

#[derive(Debug, Deserialize)]
struct RenameBody {
    new_name: String,
}

#[derive(Debug, Deserialize)]
struct CreateFolderBody {
    #[serde(default)]
    path: String,
    folder_name: String,
}

#[derive(Debug, Deserialize)]
struct PathsBody {
    paths: Vec<String>,
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

async fn list_dir(
    State(state): State<AppState>,
    Query(q): Query<PathQuery>,
) -> AppResult<Json<list::Listing>> {
    let listing = list::list(&state.root, &q.path)?;
    Ok(Json(listing))
}

async fn upload(
    State(state): State<AppState>,
    Query(q): Query<PathQuery>,
    mut multipart: Multipart,
) -> AppResult<Json<serde_json::Value>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_err)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err(AppError::MissingFile);
        }
        let stored = store::sanitize_file_name(&file_name);
        if stored.is_empty() {
            return Err(AppError::InvalidName(file_name));
        }
        if !store::has_allowed_extension(&stored, &state.cfg.upload.allowed_extensions) {
            return Err(AppError::ExtensionDenied(stored));
        }
        let bytes = field.bytes().await.map_err(multipart_err)?;
        if bytes.len() > state.cfg.max_upload_bytes() {
            return Err(AppError::TooLarge);
        }
        let name = ops::save_upload(&state.root, &q.path, &stored, &bytes)?;
        return Ok(Json(json!({"success": true, "name": name})));
    }
    Err(AppError::MissingFile)
}

async fn download(
    State(state): State<AppState>,
    UrlPath(path): UrlPath<String>,
) -> AppResult<impl IntoResponse> {
    let full = store::resolve(&state.root, &path)?;
    if !full.is_file() {
        return Err(AppError::NotFound);
    }
    let bytes = std::fs::read(&full).map_err(AppError::from_io)?;
    let name = full
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{name}\""),
            ),
        ],
        bytes,
    ))
}

async fn delete(
    State(state): State<AppState>,
    UrlPath(path): UrlPath<String>,
) -> AppResult<Json<serde_json::Value>> {
    ops::delete(&state.root, &path)?;
    info!(path = %path, "deleted");
    Ok(Json(json!({"success": true})))
}

async fn rename(
    State(state): State<AppState>,
    UrlPath(path): UrlPath<String>,
    Json(body): Json<RenameBody>,
) -> AppResult<Json<serde_json::Value>> {
    ops::rename(&state.root, &path, &body.new_name)?;
    info!(path = %path, new_name = %body.new_name, "renamed");
    Ok(Json(json!({"success": true})))
}

async fn create_folder(
    State(state): State<AppState>,
    Json(body): Json<CreateFolderBody>,
) -> AppResult<Json<serde_json::Value>> {
    ops::create_folder(&state.root, &body.path, &body.folder_name)?;
    info!(parent = %body.path, name = %body.folder_name, "created folder");
    Ok(Json(json!({"success": true})))
}

async fn bulk_delete(
    State(state): State<AppState>,
    Json(body): Json<PathsBody>,
) -> AppResult<Json<serde_json::Value>> {
    let outcome = ops::bulk_delete(&state.root, &body.paths);
    info!(deleted = outcome.deleted, skipped = outcome.skipped, "bulk delete");
    Ok(Json(json!({
        "success": true,
        "deleted": outcome.deleted,
        "skipped": outcome.skipped,
    })))
}

async fn bulk_download(
    State(state): State<AppState>,
    Json(body): Json<PathsBody>,
) -> AppResult<impl IntoResponse> {
    let archive = archive::build_zip(&state.root, &body.paths)?;
    info!(
        files = archive.file_count,
        skipped = archive.skipped,
        bytes = archive.bytes.len(),
        "bulk download"
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"files.zip\"".to_string(),
            ),
            (
                HeaderName::from_static("x-skipped-entries"),
                archive.skipped.to_string(),
            ),
        ],
        archive.bytes,
    ))
}

fn multipart_err(err: axum::extract::multipart::MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::TooLarge
    } else {
        AppError::BadRequest(err.to_string())
    }
}
