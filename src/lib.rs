//! Push-notification relay for StockHub.
//!
//! Browsers register Web Push subscriptions under a subscriber id; trade
//! events are broadcast to every registered subscription, with Apple
//! endpoints receiving their nested `aps` payload shape.

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod ports;
pub mod push;
pub mod registry;
pub mod state;
pub mod types;

#[cfg(test)]
mod testing;

pub use push::{VapidCredentials, generate_vapid_credentials};

use tracing::{error, info};

pub async fn serve(config: config::AppConfig) -> Result<(), error::ServeError> {
    let addr = config.bind;
    let router = app::app(config)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
