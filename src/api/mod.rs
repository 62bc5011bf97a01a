//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; the push channel
//! lives at `/async`.

pub mod dto;
pub mod handlers;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// OpenAPI document for the REST endpoints.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "courier-gateway", description = "Real-time notification channel for the job server"),
    paths(
        handlers::system::health_handler,
        handlers::system::stats_handler,
        handlers::events::publish_event,
    ),
    components(schemas(
        dto::HealthResponse,
        dto::StatsResponse,
        dto::PublishEventRequest,
        dto::PublishEventResponse,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "System", description = "Health and statistics"),
        (name = "Events", description = "Event ingestion"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router(ingest_enabled: bool) -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes(ingest_enabled))
        .merge(handlers::system::routes())
}

/// Builds the full application: REST routes, the `/async` push channel
/// and the HTTP middleware stack.
pub fn build_app(state: AppState) -> Router {
    let ingest_enabled = state.ingest_token.is_some();
    Router::new()
        .merge(build_router(ingest_enabled))
        .route("/async", get(ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
