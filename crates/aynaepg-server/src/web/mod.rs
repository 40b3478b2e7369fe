//! HTTP layer.
//!
//! Serves the XMLTV guide at [`EPG_PATH`], rebuilding it from upstream on a
//! cache miss.

mod handlers;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::body::Bytes;
use axum::routing::get;
use aynaepg_api::ayna::AynaClient;
use aynaepg_cache::ResultCache;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

/// Path of the XMLTV endpoint.
pub const EPG_PATH: &str = "/api/aynaepg.xml";

/// Shared state handed to every request.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Upstream API client.
    pub client: Arc<AynaClient>,
    /// Cached XMLTV document, shared with every response that serves it.
    pub cache: Arc<ResultCache<Bytes>>,
    /// EPG feed URL template containing `{date}`.
    pub feed_url_template: Arc<str>,
}

impl AppState {
    /// Creates the state with an empty cache.
    #[must_use]
    pub fn new(client: AynaClient, cache: ResultCache<Bytes>, feed_url_template: &str) -> Self {
        Self {
            client: Arc::new(client),
            cache: Arc::new(cache),
            feed_url_template: Arc::from(feed_url_template),
        }
    }
}

/// Builds the application router.
#[must_use]
pub fn router(state: AppState) -> Router {
    with_middleware(
        Router::new()
            .route(EPG_PATH, get(handlers::serve_epg))
            .with_state(state),
    )
}

/// Wraps `router` with compression, panic recovery and request tracing.
///
/// A panicking handler yields a `500` response. This relies on the release
/// profile unwinding instead of aborting.
fn with_middleware(router: Router) -> Router {
    router
        .layer(CompressionLayer::new())
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Serves `state` on `listener` until SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns an error if the server fails while running.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")
}

/// Resolves when the process receives Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("Shutdown signal received, draining connections");
}
