//! Event ingestion: lets the job engine publish events over HTTP.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{PublishEventRequest, PublishEventResponse};
use crate::app_state::AppState;
use crate::domain::{EventArg, OwnedBy, RawEvent};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /api/v1/events`: Publish an event to the push channel.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] without a matching bearer token
/// and [`GatewayError::InvalidRequest`] for an empty event name.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Publish an event",
    description = "Fans an event out to every logged-in push connection allowed to see it and subscribed to its name. `user` targets one uid; `owner` marks all arguments as owned by one uid. Requires `Authorization: Bearer <EVENT_INGEST_TOKEN>`.",
    request_body = PublishEventRequest,
    responses(
        (status = 202, description = "Event queued", body = PublishEventResponse),
        (status = 400, description = "Invalid event", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn publish_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PublishEventRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    authorize(&state, &headers)?;
    if req.event.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "event name must not be empty".to_string(),
        ));
    }

    let mut event = RawEvent::new(req.event);
    for arg in req.args {
        let arg: Arc<dyn EventArg> = match req.owner {
            Some(owner) => Arc::new(OwnedBy::new(owner, arg)),
            None => Arc::new(arg),
        };
        event = event.shared_arg(arg);
    }
    if let Some(user) = req.user {
        event = event.for_user(user);
    }

    let recipients = state.broadcaster.broadcast(&event);
    tracing::info!(event = %event.name, recipients, "event published");

    Ok((
        StatusCode::ACCEPTED,
        Json(PublishEventResponse { recipients }),
    ))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), GatewayError> {
    let Some(expected) = state.ingest_token.as_deref() else {
        return Err(GatewayError::Unauthorized);
    };
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match presented {
        Some(token) if token == expected => Ok(()),
        _ => Err(GatewayError::Unauthorized),
    }
}

/// Event routes, mounted under /api/v1 only when a token is configured.
pub fn routes() -> Router<AppState> {
    Router::new().route("/events", post(publish_event))
}
