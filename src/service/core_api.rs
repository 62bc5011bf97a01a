//! Surface of the job server's API layer consumed by the push channel.
//!
//! Login validation and the content of status and progress snapshots are
//! owned by the API layer; the push channel only forwards them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Principal, UserId};

/// Server-wide status snapshot, pushed every interval.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    /// Whether downloading is paused.
    pub pause: bool,
    /// Number of active downloads.
    pub active: u32,
    /// Files waiting in the queue.
    pub queue: u32,
    /// Total number of files.
    pub total: u32,
    /// Aggregate speed in bytes per second.
    pub speed: u64,
    /// Whether new downloads may start.
    pub download: bool,
    /// Whether automatic reconnect is enabled.
    pub reconnect: bool,
}

/// Progress of one running task, pushed every interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressInfo {
    /// Plugin handling the task.
    pub plugin: String,
    /// Task display name.
    pub name: String,
    /// Short status message.
    pub status_msg: String,
    /// Remaining seconds, if known.
    pub eta: Option<u64>,
    /// Bytes done.
    pub done: u64,
    /// Bytes total.
    pub total: u64,
    /// Principal the task runs for.
    pub owner: UserId,
}

/// API-layer collaborator used by the command phase and the push loop.
pub trait CoreApi: fmt::Debug + Send + Sync {
    /// Validates credentials, returning the principal on success.
    fn check_auth(&self, username: &str, password: &str) -> Option<Principal>;

    /// Status snapshot as seen by `principal`.
    fn status_info(&self, principal: &Principal) -> ServerStatus;

    /// Progress snapshots visible to `principal`.
    fn progress_info(&self, principal: &Principal) -> Vec<ProgressInfo>;
}
