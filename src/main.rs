//! ucdn-gateway — CORS gateway in front of a media CDN origin.
//! Redirects browsers to a public relay, or proxies the origin through a forwarding proxy.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ucdn_gateway::config::{AnchorConfig, Config};
use ucdn_gateway::{api, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::parse();
    let port = config.port;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port,
        origin = %format!("{}://{}", config.target_scheme, config.target_host),
        relay = %config.relay_base(),
        forward_proxy = %config.forward_proxy,
        "ucdn-gateway starting"
    );

    let state = AppState::new(config, &AnchorConfig::default());
    let app = api::router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
    info!("shutting down");
}
