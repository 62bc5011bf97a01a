//! WebSocket layer: the push channel served at `/async`.
//!
//! A client logs in, configures its interval and filters, then sends
//! `start`. From then on it only receives events and periodic status and
//! progress snapshots.

pub mod connection;
pub mod context;
pub mod dispatcher;
pub mod handler;
pub mod messages;
pub mod transport;
