//! The set of live connections, guarded by one process-wide lock.
//!
//! [`ConnectionRegistry`] holds a [`ClientHandle`] for every open
//! connection. Membership changes and the whole broadcast fan-out run
//! under the same [`parking_lot::Mutex`], so a broadcast never observes a
//! half-registered client. The critical section only enqueues: no I/O and
//! no waiting on a connection queue happens while the lock is held.

use std::ops::ControlFlow;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;

use super::{ConnectionId, EventFilter, EventInfo, Session};

/// Sending half of a connection's event queue.
pub type EventSender = mpsc::UnboundedSender<Arc<EventInfo>>;

/// Receiving half of a connection's event queue.
pub type EventReceiver = mpsc::UnboundedReceiver<Arc<EventInfo>>;

/// Connection state the broadcaster needs to read.
///
/// Written only by the owning connection's command phase.
#[derive(Debug, Clone, Default)]
pub struct Subscription {
    /// Present once login succeeded.
    pub session: Option<Session>,
    /// Which event names this connection wants.
    pub filter: EventFilter,
    /// Whether the connection switched to push-only mode.
    pub streaming: bool,
}

/// Registry-side view of one connection.
#[derive(Debug)]
pub struct ClientHandle {
    id: ConnectionId,
    queue: EventSender,
    subscription: RwLock<Subscription>,
}

impl ClientHandle {
    /// Creates a handle and the receiving end of its event queue.
    #[must_use]
    pub fn new(filter: EventFilter) -> (Arc<Self>, EventReceiver) {
        let (queue, rx) = mpsc::unbounded_channel();
        let handle = Self {
            id: ConnectionId::new(),
            queue,
            subscription: RwLock::new(Subscription {
                filter,
                ..Subscription::default()
            }),
        };
        (Arc::new(handle), rx)
    }

    /// Connection id.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.subscription.read().session.clone()
    }

    /// Replaces the session (`None` logs out).
    pub fn set_session(&self, session: Option<Session>) {
        self.subscription.write().session = session;
    }

    /// Replaces the event filter.
    pub fn set_filter(&self, filter: EventFilter) {
        self.subscription.write().filter = filter;
    }

    /// Marks the connection as streaming.
    pub fn mark_streaming(&self) {
        self.subscription.write().streaming = true;
    }

    /// Runs `f` with read access to the subscription.
    pub fn with_subscription<R>(&self, f: impl FnOnce(&Subscription) -> R) -> R {
        f(&self.subscription.read())
    }

    /// Pushes an event onto the queue without blocking.
    ///
    /// Returns `false` if the connection already dropped its receiver.
    pub fn enqueue(&self, event: Arc<EventInfo>) -> bool {
        self.queue.send(event).is_ok()
    }
}

/// Counters reported by the stats endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Registered connections.
    pub connections: usize,
    /// Connections with a session.
    pub authenticated: usize,
    /// Connections in push-only mode.
    pub streaming: usize,
}

/// All live connections, in registration order.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    clients: Mutex<Vec<Arc<ClientHandle>>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection. Registering the same handle twice is a no-op.
    pub fn register(&self, client: Arc<ClientHandle>) {
        let mut clients = self.clients.lock();
        if clients.iter().all(|c| c.id != client.id) {
            clients.push(client);
        }
    }

    /// Adds a connection for the lifetime of the returned guard.
    ///
    /// The connection is removed when the guard drops, including while a
    /// panicking connection task unwinds.
    pub fn register_scoped(self: &Arc<Self>, client: Arc<ClientHandle>) -> Registration {
        let id = client.id;
        self.register(client);
        Registration {
            registry: Arc::clone(self),
            id,
        }
    }

    /// Removes a connection.
    ///
    /// Returns `false` when the id was not registered; that is not an error.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let mut clients = self.clients.lock();
        let before = clients.len();
        clients.retain(|c| c.id != id);
        clients.len() != before
    }

    /// Visits every connection under the registry lock, in registration
    /// order, until `visit` breaks.
    pub fn for_each(&self, mut visit: impl FnMut(&ClientHandle) -> ControlFlow<()>) {
        let clients = self.clients.lock();
        for client in clients.iter() {
            if visit(client).is_break() {
                break;
            }
        }
    }

    /// Returns `true` if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.clients.lock().iter().any(|c| c.id == id)
    }

    /// Number of registered connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    /// Returns `true` if no connection is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }

    /// Connection counters.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats::default();
        self.for_each(|client| {
            stats.connections += 1;
            client.with_subscription(|sub| {
                if sub.session.is_some() {
                    stats.authenticated += 1;
                }
                if sub.streaming {
                    stats.streaming += 1;
                }
            });
            ControlFlow::Continue(())
        });
        stats
    }
}

/// Unregisters its connection when dropped.
#[derive(Debug)]
#[must_use = "dropping the guard unregisters the connection"]
pub struct Registration {
    registry: Arc<ConnectionRegistry>,
    id: ConnectionId,
}

impl Registration {
    /// The guarded connection.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if self.registry.unregister(self.id) {
            tracing::debug!(conn_id = %self.id, "connection unregistered");
        }
    }
}
