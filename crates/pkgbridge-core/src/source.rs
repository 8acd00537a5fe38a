//! Seam between the index cache and the upstream API client

use async_trait::async_trait;
use pkgbridge_proxy::{GitLabClient, Project, ProxyError, Release};

/// Upstream listing operations the index cache depends on.
#[async_trait]
pub trait ProjectSource: Send + Sync {
    /// List all projects of a group.
    async fn group_projects(&self, group: &str) -> Result<Vec<Project>, ProxyError>;

    /// List all releases of a project, newest first.
    async fn project_releases(&self, project: &Project) -> Result<Vec<Release>, ProxyError>;
}

#[async_trait]
impl ProjectSource for GitLabClient {
    async fn group_projects(&self, group: &str) -> Result<Vec<Project>, ProxyError> {
        GitLabClient::group_projects(self, group).await
    }

    async fn project_releases(&self, project: &Project) -> Result<Vec<Release>, ProxyError> {
        GitLabClient::project_releases(self, &project.path_with_namespace).await
    }
}
