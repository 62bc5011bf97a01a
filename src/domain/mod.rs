//! Domain layer: identities, events, the connection registry and fan-out.
//!
//! This module holds everything the push channel shares between
//! connections: the principal model, the event and payload capability
//! types, the registry of live connections and the broadcaster that
//! delivers events to them.

pub mod broadcaster;
pub mod connection_id;
pub mod event;
pub mod event_filter;
pub mod principal;
pub mod registry;

pub use broadcaster::{AclMismatch, EventBroadcaster};
pub use connection_id::ConnectionId;
pub use event::{EventArg, EventInfo, InfoData, Json, Owned, OwnedBy, RawEvent};
pub use event_filter::EventFilter;
pub use principal::{Principal, Role, Session, UserId};
pub use registry::{ClientHandle, ConnectionRegistry, RegistryStats, Registration};
