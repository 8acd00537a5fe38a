//! Wire models for the upstream GitLab REST API

use serde::Deserialize;

/// A project as returned by `GET /groups/{group}/projects`.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub path_with_namespace: String,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(rename = "_links")]
    pub links: ProjectLinks,
}

/// API links attached to a project. `self` is the base URL for all
/// package operations on the project.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectLinks {
    #[serde(rename = "self")]
    pub self_url: String,
    pub events: String,
}

/// A release as returned by `GET /projects/{path}/releases`.
///
/// Upstream returns releases newest-first; consumers treat the first
/// entry of a release list as the latest version.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub name: String,
    pub tag_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub upcoming_release: bool,
    pub commit: ReleaseCommit,
}

/// The commit a release points to.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseCommit {
    pub id: String,
    pub short_id: String,
    pub web_url: String,
}
