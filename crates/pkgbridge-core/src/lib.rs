//! PkgBridge Index Cache
//!
//! This crate maintains the periodically refreshed, atomically replaced
//! snapshot of upstream projects and releases that the routing engine
//! reads on every request.

pub mod index;
pub mod source;

pub use index::{IndexConfig, ProjectIndex};
pub use source::ProjectSource;
