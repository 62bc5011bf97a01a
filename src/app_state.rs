//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::domain::{ConnectionRegistry, EventBroadcaster};
use crate::service::CoreApi;
use crate::ws::context::ConnectionDefaults;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// All live push connections.
    pub registry: Arc<ConnectionRegistry>,
    /// Event fan-out over [`Self::registry`].
    pub broadcaster: EventBroadcaster,
    /// API-layer collaborator for logins and snapshots.
    pub api: Arc<dyn CoreApi>,
    /// Settings each new connection starts with.
    pub defaults: ConnectionDefaults,
    /// Bearer token guarding event ingestion.
    pub ingest_token: Option<Arc<str>>,
}

impl AppState {
    /// Builds the state for `config` on top of `api`.
    #[must_use]
    pub fn new(config: &GatewayConfig, api: Arc<dyn CoreApi>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = EventBroadcaster::new(Arc::clone(&registry), config.acl_mismatch);
        Self {
            registry,
            broadcaster,
            api,
            defaults: ConnectionDefaults::from(config),
            ingest_token: config.ingest_token.as_deref().map(Arc::from),
        }
    }
}
