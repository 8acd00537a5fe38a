//! API routes

mod binaries;
mod maven;
mod proxy;
mod status;

use axum::Router;

use crate::state::AppState;

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Diagnostic status page
        .merge(status::routes())
        // Maven package proxying
        .merge(maven::routes())
        // Generic build artifact proxying
        .merge(binaries::routes())
        .with_state(state)
}
