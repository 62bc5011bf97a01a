//! Service layer: the API-layer collaborator and its bundled implementation.

pub mod core_api;
pub mod status_board;

pub use core_api::{CoreApi, ProgressInfo, ServerStatus};
pub use status_board::StatusBoard;
