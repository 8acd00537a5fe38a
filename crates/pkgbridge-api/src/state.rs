//! Application state

use pkgbridge_core::ProjectIndex;
use pkgbridge_proxy::PackageProbe;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<ProjectIndex>,
    pub client: Arc<dyn PackageProbe>,
    /// Hostname of the upstream instance, shown on the status page
    pub instance: String,
    /// Number of configured groups, shown on the status page
    pub group_count: usize,
}

impl AppState {
    pub fn new(
        index: Arc<ProjectIndex>,
        client: Arc<dyn PackageProbe>,
        instance: String,
        group_count: usize,
    ) -> Self {
        Self {
            index,
            client,
            instance,
            group_count,
        }
    }
}
