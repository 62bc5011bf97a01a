//! Event ingestion DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /api/v1/events`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PublishEventRequest {
    /// Event name, e.g. `"file_finished"`.
    pub event: String,
    /// Positional arguments, pushed to clients as given.
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub args: Vec<serde_json::Value>,
    /// Restrict non-admin delivery to this uid.
    #[serde(default)]
    pub user: Option<u32>,
    /// Mark every argument as owned by this uid.
    #[serde(default)]
    pub owner: Option<u32>,
}

/// Response body for `POST /api/v1/events`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublishEventResponse {
    /// Number of connection queues the event was pushed onto.
    pub recipients: usize,
}
