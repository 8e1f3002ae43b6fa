//! Purpose: Serve merged DST files over HTTP as browser downloads.
//! Exports: `ServeConfig`, `serve`, `router`.
//! Role: Axum-based delivery surface; one request composes one word.
//! Invariants: Success bodies are raw DST bytes with an attachment disposition.
//! Invariants: Failures return a JSON error envelope and never a partial file.
//! Invariants: Loopback-only unless explicitly allowed.

use axum::body::Body;
use axum::extract::{Path as AxumPath, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use std::error::Error as StdError;
use std::future::IntoFuture;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;

use dstmerge::api::{ComposedWord, Error, ErrorKind, LetterSource, compose_word};

#[derive(Clone)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub source: Arc<dyn LetterSource>,
    pub allow_non_loopback: bool,
}

#[derive(Clone)]
struct AppState {
    source: Arc<dyn LetterSource>,
}

pub async fn serve(config: ServeConfig) -> Result<(), Error> {
    validate_config(&config)?;

    let app = router(Arc::clone(&config.source));
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to bind server")
                .with_source(err)
        })?;
    info!(bind = %config.bind, source = %config.source.describe(), "serving merged letters");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("server failed")
                    .with_source(err)
            })?;
        }
        _ = shutdown_signal() => {
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(Duration::from_secs(10), &mut server).await {
                Ok(result) => result.map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("server failed")
                        .with_source(err)
                })?,
                Err(_) => {
                    return Err(Error::new(ErrorKind::Io).with_message("server shutdown timed out"));
                }
            }
        }
    };
    Ok(())
}

pub fn router(source: Arc<dyn LetterSource>) -> Router {
    let state = Arc::new(AppState { source });
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v0/merge/:word", get(merge_word))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn is_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(addr) => addr.is_loopback(),
        IpAddr::V6(addr) => addr.is_loopback(),
    }
}

fn validate_config(config: &ServeConfig) -> Result<(), Error> {
    if !is_loopback(config.bind.ip()) && !config.allow_non_loopback {
        return Err(Error::new(ErrorKind::InvalidInput)
            .with_message("non-loopback bind requires explicit opt-in")
            .with_hint("Re-run with --allow-non-loopback or use a loopback address."));
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
}

async fn healthz() -> Response {
    Json(json!({ "ok": true })).into_response()
}

async fn merge_word(
    State(state): State<Arc<AppState>>,
    AxumPath(word): AxumPath<String>,
) -> Response {
    match compose_word(&word, Arc::clone(&state.source)).await {
        Ok(composed) => download_response(composed),
        Err(err) => error_response(err),
    }
}

fn download_response(composed: ComposedWord) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", composed.file_name);
    let Ok(disposition) = HeaderValue::from_str(&disposition) else {
        return error_response(
            Error::new(ErrorKind::Internal).with_message("invalid download file name"),
        );
    };
    let mut response = Response::new(Body::from(composed.bytes));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    response
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    letter: Option<char>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<usize>,
}

fn error_status(err: &Error) -> StatusCode {
    match err.kind() {
        ErrorKind::InvalidInput | ErrorKind::EmptyMergeSet => StatusCode::BAD_REQUEST,
        ErrorKind::ResourceUnavailable if is_upstream_failure(err) => StatusCode::BAD_GATEWAY,
        ErrorKind::ResourceUnavailable => StatusCode::NOT_FOUND,
        ErrorKind::TruncatedHeader => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::AlreadyExists => StatusCode::CONFLICT,
        ErrorKind::Io | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// Letter host unreachable, as opposed to a letter the host does not have.
fn is_upstream_failure(err: &Error) -> bool {
    StdError::source(err).is_some_and(|source| source.is::<ureq::Transport>())
}

fn error_response(err: Error) -> Response {
    let status = error_status(&err);
    let body = ErrorEnvelope {
        error: ErrorBody {
            kind: format!("{:?}", err.kind()),
            message: err.message().unwrap_or("error").to_string(),
            hint: err.hint().map(str::to_string),
            letter: err.letter(),
            index: err.index(),
        },
    };
    (status, Json(body)).into_response()
}
