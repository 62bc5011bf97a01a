//! Command phase: applies decoded calls to a connection in standby.
//!
//! Before login only `login` is accepted; every other command is answered
//! with `Forbidden` and changes nothing. After login the connection may
//! adjust its interval, event filter and interaction level, log out, or
//! `start` streaming. Unknown commands are ignored without a reply.

use std::sync::Arc;

use serde_json::Value;

use super::context::{ClientContext, InteractionLevel};
use super::messages::{Call, WsMessage};
use crate::config::{MAX_INTERVAL_SECS, seconds_to_duration};
use crate::domain::{EventFilter, Session};
use crate::error::GatewayError;
use crate::service::CoreApi;

/// Command that switches a connection to push-only mode.
pub const START: &str = "start";

/// Applies standby commands to a [`ClientContext`].
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    api: Arc<dyn CoreApi>,
}

impl CommandDispatcher {
    /// Creates a dispatcher validating logins against `api`.
    #[must_use]
    pub fn new(api: Arc<dyn CoreApi>) -> Self {
        Self { api }
    }

    /// Applies `call` to `ctx`, returning the reply to send, if any.
    pub fn dispatch(&self, ctx: &mut ClientContext, call: &Call) -> Option<WsMessage> {
        match self.apply(ctx, call) {
            Ok(reply) => reply,
            Err(err) => Some(WsMessage::error(&err.to_body())),
        }
    }

    fn apply(
        &self,
        ctx: &mut ClientContext,
        call: &Call,
    ) -> Result<Option<WsMessage>, GatewayError> {
        if call.command == "login" {
            return self.login(ctx, call).map(Some);
        }
        let Some(session) = ctx.session() else {
            return Err(GatewayError::Forbidden);
        };

        match call.command.as_str() {
            "logout" => {
                ctx.set_session(None);
                tracing::info!(conn_id = %ctx.id(), uid = %session.primary_uid(), "logout");
                Ok(Some(WsMessage::response(Value::Bool(true))))
            }
            "setInterval" => {
                let interval = call
                    .arg(0, "seconds")
                    .and_then(Value::as_f64)
                    .and_then(seconds_to_duration)
                    .ok_or_else(|| {
                        GatewayError::InvalidRequest(format!(
                            "setInterval expects a positive number of seconds up to {MAX_INTERVAL_SECS}"
                        ))
                    })?;
                ctx.set_interval(interval);
                Ok(None)
            }
            "setEvents" => {
                let pattern = str_arg(call, 0, "pattern")?;
                ctx.set_filter(EventFilter::new(pattern)?);
                Ok(None)
            }
            "setInteraction" => {
                let level = call
                    .arg(0, "level")
                    .and_then(Value::as_u64)
                    .and_then(|bits| u32::try_from(bits).ok())
                    .ok_or_else(|| {
                        GatewayError::InvalidRequest(
                            "setInteraction expects an unsigned bitmask".to_string(),
                        )
                    })?;
                ctx.set_interaction(InteractionLevel::new(level));
                Ok(None)
            }
            START => {
                ctx.start();
                tracing::debug!(conn_id = %ctx.id(), interval = ?ctx.interval(), "streaming started");
                Ok(None)
            }
            other => {
                tracing::debug!(conn_id = %ctx.id(), command = other, "ignoring unknown command");
                Ok(None)
            }
        }
    }

    fn login(&self, ctx: &ClientContext, call: &Call) -> Result<WsMessage, GatewayError> {
        let username = str_arg(call, 0, "username")?;
        let password = str_arg(call, 1, "password")?;

        let Some(principal) = self.api.check_auth(username, password) else {
            tracing::warn!(conn_id = %ctx.id(), username, "login failed");
            return Err(GatewayError::Forbidden);
        };

        let data = serde_json::to_value(&principal)
            .map_err(|e| GatewayError::Internal(e.to_string()))?;
        tracing::info!(conn_id = %ctx.id(), uid = %principal.uid, "login");
        ctx.set_session(Some(Session::new(principal)));
        Ok(WsMessage::response(data))
    }
}

fn str_arg<'a>(call: &'a Call, index: usize, name: &str) -> Result<&'a str, GatewayError> {
    call.arg(index, name)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            GatewayError::InvalidRequest(format!("{} expects a string `{name}`", call.command))
        })
}
