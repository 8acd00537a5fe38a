//! Maven package proxying
//!
//! Any project in the index may own a given Maven coordinate, so the
//! handler races one probe per candidate and redirects to the first
//! success in snapshot order.

use axum::Router;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::get;
use futures::future::join_all;
use std::sync::Arc;
use tracing::debug;

use pkgbridge_proxy::{PackageProbe, Project};

use crate::error::ApiError;
use crate::routes::proxy;
use crate::state::AppState;

/// Projects whose path occurs somewhere in the requested path. This is a
/// prefilter to avoid probing every known project; the probe results
/// decide actual ownership.
fn candidates<'a>(projects: &'a [Project], path: &str) -> Vec<&'a Project> {
    projects
        .iter()
        .filter(|project| path.contains(&project.path))
        .collect()
}

async fn maven_proxy(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    debug!("Got maven request: {}", path);
    let agent = proxy::user_agent(&headers);

    let projects = state.index.projects();
    let candidates = candidates(&projects, &path);
    if candidates.is_empty() {
        return Err(ApiError::NotFound(path));
    }

    let probes = candidates.iter().map(|project| {
        let target = format!("{}/packages/{}", project.links.self_url, path);
        let client = Arc::clone(&state.client);
        let agent = agent.clone();
        async move {
            debug!("Attempting to resolve maven target at {}", target);
            client.probe(&target, &agent).await
        }
    });

    // Await every probe, then pick the first success in candidate order.
    // Ties are broken by snapshot order, not latency, so the winner is
    // deterministic for a given cache state.
    let winner = join_all(probes)
        .await
        .into_iter()
        .filter_map(|result| result.ok())
        .find(|response| response.status().is_success());

    match winner {
        Some(response) => Ok(proxy::redirect_to_upstream(&response)),
        None => Err(ApiError::NotFound(path)),
    }
}

/// Create maven routes. GET routes also answer HEAD.
pub fn routes() -> Router<AppState> {
    Router::new().route("/maven/{*path}", get(maven_proxy))
}
