//! HTTP server for `sheaf dev`.
//!
//! Serves the last build from memory, falls back to the output root on disk,
//! and pushes live reload events over Server-Sent Events.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{StatusCode, Uri, header},
    response::{
        IntoResponse, Response, Sse,
        sse::{Event, KeepAlive},
    },
    routing::get,
};
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};
use tower_http::cors::{Any, CorsLayer};

use crate::dev::{CLIENT_PATH, DevConfig, EVENTS_PATH, SharedState, error_page};
use crate::error::{CliError, Result};
use crate::ui;

const RELOAD_CLIENT: &str = include_str!("../../assets/dev/reload-client.js");

pub struct DevServer {
    config: DevConfig,
    state: SharedState,
}

impl DevServer {
    pub fn new(config: DevConfig, state: SharedState) -> Self {
        Self { config, state }
    }

    /// Bind and serve until the task is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn start(self) -> Result<()> {
        let addr = self.config.addr;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| CliError::Server(format!("Failed to bind to {}: {}", addr, e)))?;

        ui::success(&format!(
            "Development server running at {}",
            self.config.server_url()
        ));

        axum::serve(listener, router(self.state))
            .await
            .map_err(|e| CliError::Server(format!("Server error: {}", e)))
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route(EVENTS_PATH, get(handle_events))
        .route(CLIENT_PATH, get(handle_client))
        .fallback(handle_request)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn handle_events(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (id, rx) = state.register_client();
    tracing::debug!(client = id, "live reload client connected");

    let stream = ReceiverStream::new(rx).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        Ok(Event::default().event(event.name()).data(data))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

async fn handle_client() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/javascript"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        RELOAD_CLIENT,
    )
}

async fn handle_request(State(state): State<SharedState>, uri: Uri) -> Response {
    let Some(path) = request_path(uri.path()) else {
        return not_found(uri.path());
    };
    let is_page = path.ends_with(".html");

    if is_page {
        if let Some(error) = state.status().error() {
            return respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                "text/html; charset=utf-8",
                error_page::render(error).into_bytes(),
            );
        }
    }

    let (content, content_type) = match state.cached_file(&path) {
        Some(file) => file,
        None => {
            let file_path = state.out_dir().join(path.trim_start_matches('/'));
            match tokio::fs::read(&file_path).await {
                Ok(content) => (content, sheaf_bundler::mime::content_type(&file_path)),
                Err(_) => return not_found(&path),
            }
        }
    };

    if is_page && !state.is_hot() {
        let html = inject_reload_script(&content);
        return respond(StatusCode::OK, "text/html; charset=utf-8", html);
    }
    respond(StatusCode::OK, content_type, content)
}

/// Map a request path onto an output file path.
///
/// Directory paths get `index.html`; paths that climb out of the output root
/// are rejected.
fn request_path(path: &str) -> Option<String> {
    if path.split('/').any(|segment| segment == ".." || segment.contains('\\')) {
        return None;
    }
    if path.ends_with('/') {
        Some(format!("{path}index.html"))
    } else {
        Some(path.to_string())
    }
}

/// Insert the live reload client before `</body>`, or append it.
fn inject_reload_script(content: &[u8]) -> Vec<u8> {
    let html = String::from_utf8_lossy(content);
    let script_tag = format!(r#"<script src="{CLIENT_PATH}"></script>"#);

    match html.rfind("</body>") {
        Some(pos) => {
            let mut result = String::with_capacity(html.len() + script_tag.len() + 1);
            result.push_str(&html[..pos]);
            result.push_str(&script_tag);
            result.push('\n');
            result.push_str(&html[pos..]);
            result.into_bytes()
        }
        None => format!("{html}\n{script_tag}").into_bytes(),
    }
}

fn respond(status: StatusCode, content_type: &'static str, body: Vec<u8>) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from(body),
    )
        .into_response()
}

fn not_found(path: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain")],
        format!("File not found: {path}"),
    )
        .into_response()
}
