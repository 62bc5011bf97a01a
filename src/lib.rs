//! # courier-gateway
//!
//! Real-time notification channel for a job-management server.
//!
//! A WebSocket client connects to `/async`, logs in, picks a push interval
//! and an event filter, then sends `start`. From that point the connection
//! is push-only: it receives the domain events it is allowed to see and a
//! status plus progress snapshot every interval.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket /async, HTTP /api/v1)
//!     │
//!     ├── Push loop + CommandDispatcher (ws/)
//!     ├── REST Handlers (api/)
//!     │
//!     ├── EventBroadcaster (domain/)
//!     ├── ConnectionRegistry (domain/)
//!     │
//!     └── CoreApi: logins, status, progress (service/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;
