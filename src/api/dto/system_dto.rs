//! System endpoint DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::RegistryStats;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"healthy"`.
    pub status: String,
    /// RFC 3339 server time.
    pub timestamp: String,
    /// Crate version.
    pub version: String,
}

/// Push channel connection counters.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    /// Open connections.
    pub connections: usize,
    /// Connections with a session.
    pub authenticated: usize,
    /// Connections in push-only mode.
    pub streaming: usize,
}

impl From<RegistryStats> for StatsResponse {
    fn from(stats: RegistryStats) -> Self {
        Self {
            connections: stats.connections,
            authenticated: stats.authenticated,
            streaming: stats.streaming,
        }
    }
}
