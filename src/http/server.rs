//! HTTP server setup and the conversion handler.
//!
//! # Responsibilities
//! - Build the Axum router (wildcard route: the whole path is payload)
//! - Wire up middleware (request tracing, request timeout)
//! - Extract the target URL from path + query
//! - Map pipeline error kinds to HTTP status codes

use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::subscription::{Converter, ErrorKind};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub converter: Arc<Converter>,
}

/// HTTP server for the subscription converter.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around the given converter.
    pub fn new(converter: Arc<Converter>, request_timeout: Duration) -> Self {
        let state = AppState { converter };
        let router = Router::new()
            .route("/{*path}", any(convert_handler))
            .route("/", any(convert_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(TraceLayer::new_for_http());
        Self { router }
    }

    /// Run the server until the shutdown signal fires, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await
    }
}

/// Dispatches one request through the conversion pipeline.
async fn convert_handler(State(state): State<AppState>, uri: Uri) -> Response {
    let target = extract_target(&uri);

    match state.converter.process(&target).await {
        Ok(payload) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            payload.to_string(),
        )
            .into_response(),
        Err(err) => {
            let status = status_for(err.kind());
            tracing::error!(
                target = %target,
                status = status.as_u16(),
                error = %err,
                "request failed"
            );
            (status, status_text(status)).into_response()
        }
    }
}

/// Trimming the leading slash off the (still percent-encoded) path yields
/// the embedded target URL; the inbound query string belongs to it.
fn extract_target(uri: &Uri) -> String {
    let mut target = uri.path().trim_start_matches('/').to_owned();
    if let Some(query) = uri.query() {
        target.push('?');
        target.push_str(query);
    }
    target
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("unexpected error")
        .to_owned()
}
