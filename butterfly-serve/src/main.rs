//! HTTP server entry point. Initializes the process-wide `tracing`
//! subscriber (per spec.md §9: "the logger is the only process-wide
//! state") then serves the facade's Axum routes.

use butterfly_io::{ReqwestNominatimClient, ReqwestOverpassClient};
use butterfly_serve::{http, RoutingEngine};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let engine = Arc::new(RoutingEngine::new(
        Arc::new(ReqwestOverpassClient::new()),
        Arc::new(ReqwestNominatimClient::new()),
    ));

    let port: u16 = std::env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(8080);
    let addr = format!("0.0.0.0:{port}");
    tracing::info!(%addr, "butterfly-serve starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, http::router(engine)).await?;

    Ok(())
}
