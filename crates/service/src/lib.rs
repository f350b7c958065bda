// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ms-service: the debugger's HTTP surface.
//!
//! Instrumented processes talk to these endpoints: `/Submit` reports a
//! freshly reached breakpoint, `/Refresh` re-reads state at the current
//! one, `/Next` polls for step permission. The `/infrastructures` routes
//! expose the collected state for inspection. Handlers never propagate
//! errors above HTTP.

mod handlers;
mod validate;

pub use validate::{parse_report, ValidateError};

use axum::routing::{get, post};
use axum::Router;
use ms_storage::InstanceStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("service I/O failed")]
    Io(#[from] std::io::Error),
}

#[derive(Clone)]
pub struct ServiceState {
    pub store: Arc<InstanceStore>,
}

pub fn router(state: ServiceState) -> Router {
    Router::new()
        .route("/Submit/:instance/:process/", post(handlers::submit))
        .route("/Refresh/:instance/:process/", post(handlers::refresh))
        .route("/Next/:instance/:process/", get(handlers::next))
        .route("/infrastructures/", get(handlers::list_instances))
        .route("/infrastructures/:instance", get(handlers::list_processes))
        .route("/infrastructures/:instance/:process", get(handlers::breakpoint_log))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until the cancellation token fires.
pub async fn serve(
    addr: SocketAddr,
    store: Arc<InstanceStore>,
    cancel: CancellationToken,
) -> Result<(), ServiceError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "macrostep debugger service listening");
    axum::serve(listener, router(ServiceState { store }))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    Ok(())
}
