//! Authorization-aware fan-out of domain events to connection queues.
//!
//! [`EventBroadcaster::broadcast`] serializes a [`RawEvent`] once and, under
//! the registry lock, enqueues the shared [`EventInfo`] for every
//! connection that is logged in, allowed to see the event and whose filter
//! matches its name.

use std::ops::ControlFlow;
use std::str::FromStr;
use std::sync::Arc;

use super::{ClientHandle, ConnectionRegistry, RawEvent};
use crate::error::GatewayError;

/// What to do when a non-admin client is excluded from an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AclMismatch {
    /// Skip that client and continue with the next one.
    #[default]
    Skip,
    /// Stop the fan-out: later clients do not receive the event either.
    StopFanout,
}

impl FromStr for AclMismatch {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "stop" => Ok(Self::StopFanout),
            other => Err(GatewayError::Config(format!(
                "ACL_MISMATCH must be `skip` or `stop`, got `{other}`"
            ))),
        }
    }
}

/// Outcome of the access check for one client.
enum Access {
    Unauthenticated,
    Excluded,
    Allowed,
}

/// Fans events out to every authorized, subscribed connection.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    registry: Arc<ConnectionRegistry>,
    on_mismatch: AclMismatch,
}

impl EventBroadcaster {
    /// Creates a broadcaster over `registry`.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>, on_mismatch: AclMismatch) -> Self {
        Self {
            registry,
            on_mismatch,
        }
    }

    /// The registry this broadcaster fans out to.
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Publishes `event` to all eligible connections.
    ///
    /// Never blocks on a connection. Returns the number of queues the
    /// event was pushed onto.
    pub fn broadcast(&self, event: &RawEvent) -> usize {
        let info = Arc::new(event.to_info());
        let mut recipients = 0;

        self.registry.for_each(|client| {
            match check_access(client, event) {
                Access::Unauthenticated => return ControlFlow::Continue(()),
                Access::Excluded => {
                    tracing::trace!(conn_id = %client.id(), event = %event.name, "event withheld from client");
                    return match self.on_mismatch {
                        AclMismatch::Skip => ControlFlow::Continue(()),
                        AclMismatch::StopFanout => ControlFlow::Break(()),
                    };
                }
                Access::Allowed => {}
            }

            let wanted = client.with_subscription(|sub| sub.filter.matches(&event.name));
            if wanted && client.enqueue(Arc::clone(&info)) {
                tracing::debug!(conn_id = %client.id(), event = %event.name, "pushing event");
                recipients += 1;
            }
            ControlFlow::Continue(())
        });

        recipients
    }
}

fn check_access(client: &ClientHandle, event: &RawEvent) -> Access {
    client.with_subscription(|sub| {
        let Some(session) = &sub.session else {
            return Access::Unauthenticated;
        };
        if session.principal().is_admin() {
            return Access::Allowed;
        }

        let uid = session.primary_uid();
        if event.recipient.is_some_and(|recipient| recipient != uid) {
            return Access::Excluded;
        }
        if event.owners().any(|owner| owner != uid) {
            return Access::Excluded;
        }
        Access::Allowed
    })
}
