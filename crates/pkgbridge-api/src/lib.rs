//! PkgBridge HTTP API
//!
//! This crate provides the Axum-based HTTP surface of the gateway: the
//! diagnostic status page and the Maven and binary proxy route families.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
