pub mod runtime_config;
pub mod static_files;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use lucid_core::config::ServerConfig;
use tower_http::trace::{self, TraceLayer};
use tracing::{debug, info, warn, Level};

pub use runtime_config::RuntimeConfig;
pub use static_files::{PathError, Resolved, StaticFiles};

const CONFIG_PATH: &str = "/config.js";
const JS_CONTENT_TYPE: &str = "application/javascript; charset=utf-8";
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

pub type SharedState = Arc<ServerState>;

/// Immutable per-process state shared by every request.
pub struct ServerState {
    files: StaticFiles,
    config_script: String,
}

impl ServerState {
    pub fn new(files: StaticFiles, runtime: &RuntimeConfig) -> Self {
        Self {
            files,
            config_script: runtime.script(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            StaticFiles::new(config.root.clone()),
            &RuntimeConfig::from_config(config),
        )
    }

    pub fn files(&self) -> &StaticFiles {
        &self.files
    }
}

async fn config_js(State(state): State<SharedState>) -> Response {
    config_response(&state)
}

fn config_response(state: &ServerState) -> Response {
    (
        [
            (header::CONTENT_TYPE, JS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        state.config_script.clone(),
    )
        .into_response()
}

async fn serve_asset(State(state): State<SharedState>, uri: Uri) -> Response {
    let resolved = match state.files.resolve(uri.path()) {
        Ok(r) => r,
        Err(e) => {
            warn!("Rejected request path {}: {}", uri.path(), e);
            return (StatusCode::BAD_REQUEST, "Bad Request").into_response();
        }
    };

    // Encoded spellings such as `/config%2ejs` still reach the runtime config.
    if resolved.request_path == CONFIG_PATH {
        return config_response(&state);
    }

    let is_file = tokio::fs::metadata(&resolved.file)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);

    if is_file {
        match tokio::fs::read(&resolved.file).await {
            Ok(bytes) => {
                return file_response(
                    static_files::mime_for(&resolved.file),
                    static_files::cache_policy(&resolved.request_path),
                    bytes,
                );
            }
            Err(e) => warn!("Failed to read {}: {}", resolved.file.display(), e),
        }
    }

    serve_index(&state).await
}

/// Client-side routes fall back to the app shell.
async fn serve_index(state: &ServerState) -> Response {
    let index = state.files.index();
    match tokio::fs::read(&index).await {
        Ok(bytes) => file_response(HTML_CONTENT_TYPE, static_files::CACHE_REVALIDATE, bytes),
        Err(e) => {
            debug!("No app shell at {}: {}", index.display(), e);
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
    }
}

fn file_response(content_type: &'static str, cache: &'static str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, cache),
        ],
        Body::from(bytes),
    )
        .into_response()
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route(CONFIG_PATH, get(config_js))
        .fallback(get(serve_asset))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Binds `0.0.0.0:<port>` and serves until Ctrl-C.
pub async fn serve(config: &ServerConfig) -> std::io::Result<()> {
    let state = Arc::new(ServerState::from_config(config));
    if !state.files.index().is_file() {
        warn!(
            "{} has no {}; unknown paths will return 404",
            state.files.root().display(),
            static_files::INDEX_FILE
        );
    }

    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(
        "Serving {} on http://{}",
        config.root.display(),
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
