//! PkgBridge Upstream Client
//!
//! This crate provides the client for communicating with the upstream
//! GitLab instance: listing group projects and project releases, and
//! probing package URLs on behalf of the routing engine.

pub mod client;
pub mod error;
pub mod models;

pub use client::{DEFAULT_USER_AGENT, GitLabClient, GitLabClientConfig, PackageProbe};
pub use error::ProxyError;
pub use models::{Project, ProjectLinks, Release, ReleaseCommit};
