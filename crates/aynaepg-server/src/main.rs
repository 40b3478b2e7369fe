//! aynaepg - aggregates Ayna EPG feeds and serves them as XMLTV.

/// Application configuration (TOML).
mod config;
/// HTTP router, handlers and server loop.
mod web;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use aynaepg_cache::ResultCache;
use clap::Parser;
#[cfg(feature = "otel")]
use opentelemetry::trace::TracerProvider as _;
use tokio::net::TcpListener;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, resolve_config_path, resolve_port};
use crate::web::{AppState, EPG_PATH};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Listen port. Overrides the config file.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Listen address.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    bind: IpAddr,

    /// Config file path (default: ~/.config/aynaepg/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Keeps span export alive for the life of the process.
///
/// Dropping it flushes spans still buffered by the batch exporter.
#[derive(Default)]
struct TracingGuard {
    /// Provider behind the OTLP layer, when one is installed.
    #[cfg(feature = "otel")]
    tracer_provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>,
}

#[cfg(feature = "otel")]
impl Drop for TracingGuard {
    fn drop(&mut self) {
        let Some(provider) = self.tracer_provider.take() else {
            return;
        };
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "Failed to flush OpenTelemetry spans");
        }
    }
}

/// Installs the global tracing subscriber.
#[cfg(not(feature = "otel"))]
fn init_tracing() -> TracingGuard {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
    TracingGuard::default()
}

/// Installs the global tracing subscriber.
///
/// Spans are also exported over OTLP when `OTEL_EXPORTER_OTLP_ENDPOINT` is
/// set.
#[cfg(feature = "otel")]
fn init_tracing() -> TracingGuard {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

    let tracer_provider = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .ok()
        .and_then(|_| {
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_http()
                .build()
                .ok()?;

            Some(
                opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_batch_exporter(exporter)
                    .build(),
            )
        });

    let otel_layer = tracer_provider.as_ref().map(|provider| {
        let tracer = provider.tracer(env!("CARGO_PKG_NAME"));
        opentelemetry::global::set_tracer_provider(provider.clone());
        tracing_opentelemetry::layer().with_tracer(tracer)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .init();

    TracingGuard { tracer_provider }
}

/// Loads the config file, falling back to defaults when no path can be
/// resolved.
fn load_config(explicit: Option<&PathBuf>) -> Result<AppConfig> {
    let config = match resolve_config_path(explicit) {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "Loading config");
            AppConfig::load(&path)?
        }
        Err(e) => {
            tracing::warn!(error = %e, "Config path unavailable, using defaults");
            AppConfig::default()
        }
    };
    config.validate()?;
    Ok(config)
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if the config is invalid, the listener cannot be
/// bound, or the server fails.
#[tokio::main]
async fn main() -> Result<()> {
    let _tracing = init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    let client = config.upstream.build_client()?;
    let cache = ResultCache::new(config.cache.ttl());
    let state = AppState::new(client, cache, &config.upstream.feed_url_template);

    let addr = SocketAddr::new(cli.bind, resolve_port(cli.port, config.server.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        %addr,
        path = EPG_PATH,
        ttl_secs = config.cache.ttl_secs,
        "aynaepg listening"
    );
    web::serve(listener, state).await
}
