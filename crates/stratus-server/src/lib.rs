//! HTTP surface for Stratus.
//!
//! `GET /weather?location=<name>` and `GET /health`.

pub mod error;
pub mod handlers;

use anyhow::Result;
use axum::routing::{any, get};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use stratus_weather::WeatherResolver;
use tokio::net::TcpListener;

pub use error::ApiError;

/// Dependencies shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<WeatherResolver>,
}

impl AppState {
    pub fn new(resolver: Arc<WeatherResolver>) -> Self {
        Self { resolver }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // All methods reach the handler so it can answer 405 itself.
        .route("/weather", any(handlers::weather))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    run(listener, state, async {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Received shutdown signal");
    })
    .await
}

/// Serve until `shutdown` completes. In-flight requests are allowed to finish.
pub async fn run<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!("Weather API server listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Weather API server stopped");
    Ok(())
}
