//! courier-gateway server entry point.
//!
//! Starts the Axum HTTP server with the REST endpoints and the `/async`
//! WebSocket push channel.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use courier_gateway::api;
use courier_gateway::app_state::AppState;
use courier_gateway::config::GatewayConfig;
use courier_gateway::service::StatusBoard;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(
        addr = %config.listen_addr,
        accounts = config.accounts.len(),
        ingest = config.ingest_token.is_some(),
        "starting courier-gateway"
    );

    // Build API layer and application state
    let board = Arc::new(StatusBoard::new(&config.accounts));
    let state = AppState::new(&config, board);

    // Build router
    let app = api::build_app(state);
    #[cfg(feature = "swagger-ui")]
    let app = {
        use utoipa::OpenApi;
        app.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api::ApiDoc::openapi()),
        )
    };

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
