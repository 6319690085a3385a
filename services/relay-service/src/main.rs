mod app;
mod client;
mod config;
mod error;
mod handlers;
mod logic;
mod models;
mod state;

use relay_common::{bind_listener, init_tracing, shutdown_signal};

use crate::client::CmsClient;
use crate::config::RelayConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _guards = init_tracing("relay-service");

    let config = RelayConfig::from_env();
    let cms = CmsClient::new(&config)?;
    let app = app::build_router(AppState::new(cms));
    let listener = bind_listener(config.port).await?;

    tracing::info!(
        port = config.port,
        cms_api_base_url = %config.cms_api_base_url,
        "relay listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
