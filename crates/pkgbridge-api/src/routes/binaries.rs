//! Generic build artifact proxying
//!
//! Routes `/binaries/{project}/{params...}` to a single project's generic
//! package registry, resolving the symbolic `latest` version against the
//! cached release list.

use axum::Router;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::get;
use tracing::debug;

use pkgbridge_proxy::{PackageProbe, Release};

use crate::error::ApiError;
use crate::routes::proxy;
use crate::state::AppState;

/// Build the artifact path for a request. A leading `latest` segment is
/// replaced with the tag of the newest cached release; `None` means the
/// version could not be resolved.
fn resolve_artifact_path(params: &str, releases: Option<&[Release]>) -> Option<String> {
    let mut segments = params.split('/');
    match segments.next() {
        Some("latest") => {
            let tag = &releases?.first()?.tag_name;
            let rest = segments.collect::<Vec<_>>().join("/");
            Some(format!("{}/{}", tag, rest))
        }
        _ => Some(params.to_string()),
    }
}

async fn binaries_proxy(
    State(state): State<AppState>,
    Path((project, params)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    debug!("Got binaries request for project {}: {}", project, params);
    let agent = proxy::user_agent(&headers);

    let projects = state.index.projects();
    let Some(project) = projects.iter().find(|p| p.path == project) else {
        return Err(ApiError::NotFound(project));
    };

    let releases = state.index.releases();
    let Some(artifact_path) =
        resolve_artifact_path(&params, releases.get(&project.path).map(Vec::as_slice))
    else {
        debug!("No cached release to resolve latest for {}", project.path);
        return Err(ApiError::NotFound(params));
    };

    let target = format!(
        "{}/packages/generic/build/{}",
        project.links.self_url, artifact_path
    );
    debug!("Attempting to resolve binary target at {}", target);

    let response = state.client.probe(&target, &agent).await?;
    if !response.status().is_success() {
        return Err(ApiError::NotFound(artifact_path));
    }
    Ok(proxy::redirect_to_upstream(&response))
}

/// Create binaries routes. GET routes also answer HEAD.
pub fn routes() -> Router<AppState> {
    Router::new().route("/binaries/{project}/{*params}", get(binaries_proxy))
}
