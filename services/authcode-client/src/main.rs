//! OAuth2 authorization code client
//!
//! Single-binary service acting as a confidential OAuth2 client:
//! 1. `/login` redirects the user agent to the authorization server
//! 2. `/callback` receives the authorization code
//! 3. The code is exchanged at the token endpoint with HTTP Basic client
//!    credentials and the raw response is relayed back

mod config;
mod error;
mod handlers;
mod metrics;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use authcode::{ClientCredentials, TokenExchanger};
use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ClientConfig, Config};
use crate::metrics::ServiceStats;

/// Shared application state accessible from all handlers.
///
/// Everything here is read-only after startup apart from the counters.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<ClientConfig>,
    pub port: u16,
    pub exchanger: TokenExchanger,
    pub stats: ServiceStats,
    pub prometheus: PrometheusHandle,
}

/// Build the axum router with all routes and shared state.
fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/", get(handlers::landing))
        .route(authcode::LOGIN_PATH, get(handlers::login))
        .route(authcode::CALLBACK_PATH, get(handlers::callback))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting authcode-client");

    let prometheus_handle =
        metrics::install_recorder().context("failed to install Prometheus recorder")?;

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let env = |key: &str| std::env::var(key).ok();
    let config_path = Config::resolve_path(cli_config_path, env);
    info!(path = %config_path.path.display(), required = config_path.required, "loading configuration");

    let config = Config::load(&config_path, env).context("failed to load configuration")?;

    info!(
        port = config.server.port,
        client_id = %config.client.client_id,
        auth_url = %config.client.auth_url,
        token_url = %config.client.token_url,
        callback_uri = %config.client.callback_uri,
        "configuration loaded"
    );

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.server.timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    let Config { client, server } = config;
    let exchanger = TokenExchanger::new(
        http_client,
        client.token_url.clone(),
        client.callback_uri.clone(),
        ClientCredentials {
            client_id: client.client_id.clone(),
            client_secret: client.client_secret.clone(),
        },
    );

    let app_state = AppState {
        client: Arc::new(client),
        port: server.port,
        exchanger,
        stats: ServiceStats::new(),
        prometheus: prometheus_handle,
    };

    let app = build_router(app_state, server.max_connections);

    let listen_addr = SocketAddr::from(([0, 0, 0, 0], server.port));
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;

    info!(addr = %listen_addr, "accepting requests");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

/// Health endpoint: JSON with uptime and request counters.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "healthy",
        "uptime_seconds": state.stats.started_at.elapsed().as_secs(),
        "callbacks_served": state.stats.callbacks_total.load(Ordering::Relaxed),
        "errors_total": state.stats.errors_total.load(Ordering::Relaxed),
    });

    (
        axum::http::StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

/// Prometheus metrics endpoint, text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        axum::http::StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
