//! HTTP surface: `POST /` submits one comment.
//!
//! Responses:
//! - `200 {"data": Comment}` once the comment is on the remote
//! - `400 {"error": {"status": 400, "message": "Incorrect ..."}}` for bad input
//! - `500 {"error": {"status": 500, "message": "System error"}}` for anything else

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::validate::read_comment;
use crate::worker::WorkerHandle;

const SYSTEM_ERROR: &str = "System error";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server exited unexpectedly: {0}")]
    Serve(#[source] std::io::Error),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

#[derive(Clone)]
pub struct AppState {
    worker: WorkerHandle,
    schema_version: Arc<str>,
    halt: Arc<watch::Sender<bool>>,
}

impl AppState {
    pub fn new(worker: WorkerHandle, schema_version: &str) -> (Self, watch::Receiver<bool>) {
        let (halt, halted) = watch::channel(false);
        let state = Self {
            worker,
            schema_version: Arc::from(schema_version),
            halt: Arc::new(halt),
        };
        (state, halted)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(handle_add_comment))
        .with_state(state)
}

async fn handle_add_comment(State(state): State<AppState>, body: Bytes) -> Response {
    let new = match read_comment(&body, &state.schema_version) {
        Ok(new) => new,
        Err(err) => {
            tracing::debug!(error = %err, "rejected comment request");
            return error_response(StatusCode::BAD_REQUEST, &err.to_string());
        }
    };

    let worker = state.worker.clone();
    match tokio::task::spawn_blocking(move || worker.add_comment(new)).await {
        Ok(Ok(comment)) => (StatusCode::OK, Json(json!({ "data": comment }))).into_response(),
        Ok(Err(err)) => {
            tracing::error!(
                error = %err,
                transience = ?err.transience(),
                effect = err.effect().as_str(),
                "failed to add comment"
            );
            if err.is_fatal() {
                state.halt.send_replace(true);
            }
            error_response(StatusCode::INTERNAL_SERVER_ERROR, SYSTEM_ERROR)
        }
        Err(err) => {
            tracing::error!(error = %err, "comment task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, SYSTEM_ERROR)
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({
            "error": {
                "status": status.as_u16(),
                "message": message,
            }
        })),
    )
        .into_response()
}

/// A bound listener ready to serve comment requests.
pub struct Server {
    listener: TcpListener,
    state: AppState,
    halted: watch::Receiver<bool>,
}

impl Server {
    pub async fn bind(
        addr: &str,
        worker: WorkerHandle,
        schema_version: &str,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let (state, halted) = AppState::new(worker, schema_version);
        Ok(Self {
            listener,
            state,
            halted,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr().map_err(ServerError::Serve)
    }

    /// Serve until Ctrl-C or until the store halts.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }

    /// Serve until `signal` resolves or the store halts.
    pub async fn run_until<F>(self, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Server {
            listener,
            state,
            halted,
        } = self;
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(%addr, "listening for comments");
        }

        axum::serve(listener, router(state))
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = signal => tracing::info!("shutdown requested"),
                    _ = wait_for_halt(halted) => {
                        tracing::error!("comment store halted, no longer accepting comments");
                    }
                }
            })
            .await
            .map_err(ServerError::Serve)
    }
}

async fn wait_for_halt(mut halted: watch::Receiver<bool>) {
    if halted.wait_for(|halted| *halted).await.is_err() {
        std::future::pending::<()>().await;
    }
}
