use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::{routes, state::ServerState};
use service::runtime;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &configs::ServerConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.host, cfg.port).parse()?)
}

/// Build the router for an already loaded configuration.
pub async fn build_app(cfg: &configs::AppConfig) -> anyhow::Result<Router> {
    runtime::ensure_env(cfg).await?;
    let market = runtime::build_adapter(cfg).await?;
    let state = ServerState::new(market, cfg.ui.clone());
    Ok(routes::build_router(state, build_cors()))
}

/// Public entry: load configuration, build the app and run the HTTP server
/// until `shutdown` resolves.
pub async fn run_with_shutdown<F>(cfg: configs::AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = build_app(&cfg).await?;
    let addr = bind_addr(&cfg.server)?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, backend = ?cfg.store.backend, "market server listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    Ok(())
}

pub async fn run() -> anyhow::Result<()> {
    let cfg = configs::AppConfig::load_and_validate()?;
    run_with_shutdown(cfg, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}
