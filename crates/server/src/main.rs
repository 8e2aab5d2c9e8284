use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use server_api::{notebook_page, resolve_notebook, ApiContext, NotebookResolution};
use shared::{
    error::{ApiError, ErrorCode},
    escape::url_escape,
};
use storage::Storage;
use tracing::{error, info};

mod auth;
mod config;
mod templates;

use config::{load_settings, prepare_database_url, Settings};

#[derive(Clone)]
struct AppState {
    api: ApiContext,
    settings: Settings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let api = ApiContext { storage };

    let addr: SocketAddr = settings.server_bind.parse()?;
    let app = build_router(Arc::new(AppState { api, settings }));
    info!(%addr, "notebook server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let guarded = Router::new()
        .route("/notebooks/*path", get(notebook))
        .route("/files/*path", get(files))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ));

    Router::new()
        .route("/healthz", get(healthz))
        .merge(guarded)
        .with_state(state)
}

async fn healthz(
    State(state): State<Arc<AppState>>,
) -> Result<&'static str, (StatusCode, Json<ApiError>)> {
    state
        .api
        .storage
        .health_check()
        .await
        .map_err(|e| reject(ApiError::new(ErrorCode::Internal, e.to_string())))?;
    Ok("ok")
}

/// Renders the notebook page when the path names a notebook, or hands the
/// request to the file-serving route otherwise.
async fn notebook(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, (StatusCode, Json<ApiError>)> {
    match resolve_notebook(&state.api, &path).await.map_err(reject)? {
        NotebookResolution::Render { path, name } => {
            let page = notebook_page(&path, &name, &state.settings.mathjax_url);
            Ok(Html(templates::render_notebook_page(&page)).into_response())
        }
        NotebookResolution::RedirectToFiles { path } => {
            Ok(redirect_to_files(&path).into_response())
        }
    }
}

fn redirect_to_files(path: &str) -> Redirect {
    Redirect::to(&format!("/files/{}", url_escape(path)))
}

/// Serves a stored resource verbatim; the redirect target for non-notebook
/// paths.
async fn files(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, (StatusCode, Json<ApiError>)> {
    let record = state
        .api
        .storage
        .get(&path, true)
        .await
        .map_err(|e| reject(ApiError::new(ErrorCode::Internal, e.to_string())))?
        .ok_or_else(|| {
            reject(ApiError::new(
                ErrorCode::NotFound,
                format!("File does not exist: {path}"),
            ))
        })?;

    let mut headers = HeaderMap::new();
    let content_type = record
        .mime_type
        .as_deref()
        .unwrap_or_else(|| content_type_for(&record.path));
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    Ok((StatusCode::OK, headers, record.body.unwrap_or_default()).into_response())
}

/// Content type from the file extension, for rows stored without a mime type.
fn content_type_for(path: &str) -> &'static str {
    match path {
        p if p.ends_with(".ipynb") => "application/json",
        p if p.ends_with(".html") => "text/html",
        p if p.ends_with(".js") => "application/javascript",
        p if p.ends_with(".css") => "text/css",
        p if p.ends_with(".json") => "application/json",
        p if p.ends_with(".md") => "text/markdown",
        p if p.ends_with(".txt") => "text/plain",
        p if p.ends_with(".csv") => "text/csv",
        p if p.ends_with(".svg") => "image/svg+xml",
        p if p.ends_with(".png") => "image/png",
        p if p.ends_with(".jpg") || p.ends_with(".jpeg") => "image/jpeg",
        p if p.ends_with(".gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    (status_for(err.code), Json(err))
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Unauthorized => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
