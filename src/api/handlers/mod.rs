//! REST endpoint handlers organized by resource.

pub mod events;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes(ingest_enabled: bool) -> Router<AppState> {
    let router = Router::new().merge(system::api_routes());
    if ingest_enabled {
        router.merge(events::routes())
    } else {
        router
    }
}
