//! Domain events and the capabilities their payload values may expose.
//!
//! A [`RawEvent`] is what producers hand to the
//! [`super::EventBroadcaster`]: a name, ordered arguments and an optional
//! intended recipient. The broadcaster turns it into one shared
//! [`EventInfo`], the form pushed to clients.
//!
//! Arguments implement [`EventArg`]. Two optional capabilities are probed
//! through it:
//!
//! - [`InfoData`]: the value can produce a serializable snapshot of itself.
//!   Snapshots are taken once, at broadcast time.
//! - [`Owned`]: the value belongs to a principal. Non-admin clients only
//!   receive events whose owned arguments belong to them.
//!
//! Arguments without a snapshot are passed through and encoded when the
//! event is sent, which may fail.

use std::fmt;
use std::sync::Arc;

use serde::ser::Error as _;
use serde::{Serialize, Serializer};

use super::UserId;

/// Capability: produce a serializable snapshot.
pub trait InfoData {
    /// Returns the snapshot pushed to clients in place of the value.
    fn to_info_data(&self) -> serde_json::Value;
}

/// Capability: the value is owned by a principal.
pub trait Owned {
    /// The owning principal's uid.
    fn owner(&self) -> UserId;
}

/// A value that may be passed as a broadcast argument.
pub trait EventArg: fmt::Debug + Send + Sync {
    /// Raw encoding used when the value has no [`InfoData`] capability.
    ///
    /// # Errors
    ///
    /// Returns an error if the value has no JSON representation.
    fn encode(&self) -> Result<serde_json::Value, serde_json::Error>;

    /// Returns the snapshot capability, if supported.
    fn as_info(&self) -> Option<&dyn InfoData> {
        None
    }

    /// Returns the ownership capability, if supported.
    fn as_owned(&self) -> Option<&dyn Owned> {
        None
    }
}

impl EventArg for serde_json::Value {
    fn encode(&self) -> Result<serde_json::Value, serde_json::Error> {
        Ok(self.clone())
    }
}

/// Adapter passing any [`Serialize`] value through as an argument.
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T> EventArg for Json<T>
where
    T: Serialize + fmt::Debug + Send + Sync,
{
    fn encode(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(&self.0)
    }
}

/// Marks an argument as owned by `owner`.
#[derive(Debug, Clone)]
pub struct OwnedBy<A> {
    /// Owning principal.
    pub owner: UserId,
    /// Wrapped argument.
    pub inner: A,
}

impl<A> OwnedBy<A> {
    /// Wraps `inner` with an owner.
    pub fn new(owner: impl Into<UserId>, inner: A) -> Self {
        Self {
            owner: owner.into(),
            inner,
        }
    }
}

impl<A> Owned for OwnedBy<A> {
    fn owner(&self) -> UserId {
        self.owner
    }
}

impl<A: EventArg> EventArg for OwnedBy<A> {
    fn encode(&self) -> Result<serde_json::Value, serde_json::Error> {
        self.inner.encode()
    }

    fn as_info(&self) -> Option<&dyn InfoData> {
        self.inner.as_info()
    }

    fn as_owned(&self) -> Option<&dyn Owned> {
        Some(self)
    }
}

/// An event as produced inside the server, before fan-out.
#[derive(Debug, Clone)]
pub struct RawEvent {
    /// Event name matched against client filters.
    pub name: String,
    /// Ordered positional arguments.
    pub args: Vec<Arc<dyn EventArg>>,
    /// Intended recipient. Never serialized.
    pub recipient: Option<UserId>,
}

impl RawEvent {
    /// Creates an event with no arguments and no recipient.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            recipient: None,
        }
    }

    /// Appends an argument.
    #[must_use]
    pub fn arg(mut self, arg: impl EventArg + 'static) -> Self {
        self.args.push(Arc::new(arg));
        self
    }

    /// Appends an already shared argument.
    #[must_use]
    pub fn shared_arg(mut self, arg: Arc<dyn EventArg>) -> Self {
        self.args.push(arg);
        self
    }

    /// Restricts non-admin delivery to `recipient`.
    #[must_use]
    pub fn for_user(mut self, recipient: impl Into<UserId>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    /// Owners named by the arguments, in argument order.
    pub fn owners(&self) -> impl Iterator<Item = UserId> + '_ {
        self.args
            .iter()
            .filter_map(|arg| arg.as_owned().map(|owned| owned.owner()))
    }

    /// Builds the client-facing form, snapshotting [`InfoData`] arguments.
    #[must_use]
    pub fn to_info(&self) -> EventInfo {
        let args = self
            .args
            .iter()
            .map(|arg| match arg.as_info() {
                Some(info) => ArgValue::Snapshot(info.to_info_data()),
                None => ArgValue::Raw(Arc::clone(arg)),
            })
            .collect();
        EventInfo {
            eventname: self.name.clone(),
            event_args: args,
        }
    }
}

/// One argument of an [`EventInfo`].
#[derive(Debug, Clone)]
pub enum ArgValue {
    /// Snapshot taken at broadcast time.
    Snapshot(serde_json::Value),
    /// Passed-through value, encoded at send time.
    Raw(Arc<dyn EventArg>),
}

impl Serialize for ArgValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Snapshot(value) => value.serialize(serializer),
            Self::Raw(arg) => arg
                .encode()
                .map_err(S::Error::custom)?
                .serialize(serializer),
        }
    }
}

/// Serialized form of an event, shared read-only by every recipient queue.
#[derive(Debug, Clone, Serialize)]
pub struct EventInfo {
    /// Event name.
    pub eventname: String,
    /// Positional arguments.
    pub event_args: Vec<ArgValue>,
}

impl EventInfo {
    /// Copy of this event with the argument list cleared.
    #[must_use]
    pub fn without_args(&self) -> Self {
        Self {
            eventname: self.eventname.clone(),
            event_args: Vec::new(),
        }
    }
}
