//! WebSocket connection state machine.
//!
//! A connection starts in [`Mode::Standby`], reading one command at a time
//! and handing it to the [`CommandDispatcher`]. After `start` it switches
//! to [`Mode::Running`] for good: inbound frames are never read again, the
//! loop drains the event queue with a timeout of one interval and pushes a
//! status and a progress snapshot whenever the interval elapsed.

use std::sync::Arc;

use tokio::time::Instant;

use super::context::{ClientContext, Mode};
use super::dispatcher::CommandDispatcher;
use super::messages::{WsMessage, WsMessageType, decode_call};
use super::transport::{Inbound, Transport, send_frame};
use crate::app_state::AppState;
use crate::domain::EventInfo;
use crate::error::PushError;
use crate::service::CoreApi;

/// Runs a connection from open to close.
///
/// The connection is registered for the duration of the call and
/// unregistered on return, even if the task panics.
pub async fn run_connection<T: Transport>(mut transport: T, state: AppState) {
    let mut ctx = ClientContext::new(&state.defaults);
    let _registration = state.registry.register_scoped(Arc::clone(ctx.handle()));
    tracing::debug!(conn_id = %ctx.id(), "ws connection opened");

    let dispatcher = CommandDispatcher::new(Arc::clone(&state.api));
    let result = serve(&mut transport, &mut ctx, &dispatcher, state.api.as_ref()).await;
    match result {
        Ok(()) => transport.close().await,
        Err(e) => tracing::debug!(conn_id = %ctx.id(), error = %e, "ws connection dropped"),
    }

    tracing::debug!(conn_id = %ctx.id(), "ws connection closed");
}

/// Loops until the peer closes (`Ok`) or a transport failure (`Err`).
async fn serve<T: Transport>(
    transport: &mut T,
    ctx: &mut ClientContext,
    dispatcher: &CommandDispatcher,
    api: &dyn CoreApi,
) -> Result<(), PushError> {
    loop {
        match ctx.mode() {
            Mode::Standby => match transport.recv().await? {
                Inbound::Closed => return Ok(()),
                Inbound::Text(text) => {
                    let reply = match decode_call(&text) {
                        Ok(call) => dispatcher.dispatch(ctx, &call),
                        Err(body) => Some(WsMessage::error(&body)),
                    };
                    if let Some(reply) = reply {
                        send_frame(transport, &reply).await?;
                    }
                }
            },
            Mode::Running => push_step(transport, ctx, api).await?,
        }
    }
}

/// One iteration of the running loop.
async fn push_step<T: Transport>(
    transport: &mut T,
    ctx: &mut ClientContext,
    api: &dyn CoreApi,
) -> Result<(), PushError> {
    match ctx.next_event().await {
        Ok(Some(event)) => send_event(transport, &event).await?,
        Ok(None) => {}
        Err(_) => return Err(PushError::Closed),
    }

    let now = Instant::now();
    if ctx.push_due(now) {
        if let Some(session) = ctx.session() {
            let principal = session.principal();
            let status = WsMessage::new(WsMessageType::Status, api.status_info(principal));
            send_frame(transport, &status).await?;
            let progress = WsMessage::new(WsMessageType::Progress, api.progress_info(principal));
            send_frame(transport, &progress).await?;
        }
        ctx.schedule_next(now);
    }
    Ok(())
}

/// Sends an event, retrying without arguments if they cannot be encoded.
async fn send_event<T: Transport>(transport: &mut T, event: &EventInfo) -> Result<(), PushError> {
    match send_frame(transport, &WsMessage::new(WsMessageType::Event, event)).await {
        Err(PushError::Encode(e)) => {
            tracing::debug!(event = %event.eventname, error = %e, "event not converted, resending without arguments");
            let stripped = event.without_args();
            send_frame(transport, &WsMessage::new(WsMessageType::Event, &stripped)).await
        }
        other => other,
    }
}
