//! GitLab upstream client

use async_trait::async_trait;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, Response};
use tracing::{debug, info};
use url::Url;

use crate::error::ProxyError;
use crate::models::{Project, Release};

/// Browser-style user agent used when the caller sends none; some CDN
/// frontends reject requests without one.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0";

/// GitLab client configuration
#[derive(Clone, Debug)]
pub struct GitLabClientConfig {
    /// Hostname of the GitLab instance, e.g. `gitlab.com`
    pub instance: String,
}

/// REST client for a single GitLab instance.
///
/// Configuration is immutable after construction; the client is shared
/// read-only between the index refresh loop and every request handler
/// and does its own connection pooling.
pub struct GitLabClient {
    endpoint: Url,
    client: Client,
}

impl GitLabClient {
    /// Create a new client for the given instance.
    pub fn new(config: GitLabClientConfig) -> Result<Self, ProxyError> {
        let endpoint = Url::parse(&format!("https://{}/api/v4/", config.instance))?;
        let client = Client::builder().build()?;

        info!("Created GitLab client for {}", endpoint);

        Ok(Self { endpoint, client })
    }

    /// List all projects of a group.
    pub async fn group_projects(&self, group: &str) -> Result<Vec<Project>, ProxyError> {
        let url = format!(
            "{}groups/{}/projects",
            self.endpoint,
            utf8_percent_encode(group, NON_ALPHANUMERIC)
        );
        debug!("Listing projects at {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ProxyError::Status {
                status: response.status().as_u16(),
                url,
            });
        }
        Ok(response.json().await?)
    }

    /// List all releases of a project, newest first.
    pub async fn project_releases(
        &self,
        path_with_namespace: &str,
    ) -> Result<Vec<Release>, ProxyError> {
        let url = format!(
            "{}projects/{}/releases",
            self.endpoint,
            utf8_percent_encode(path_with_namespace, NON_ALPHANUMERIC)
        );
        debug!("Listing releases at {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ProxyError::Status {
                status: response.status().as_u16(),
                url,
            });
        }
        Ok(response.json().await?)
    }

    /// Issue a speculative HEAD request against a package URL. The caller
    /// inspects the returned status to decide whether the resource exists.
    pub async fn probe(&self, url: &str, user_agent: &str) -> Result<Response, ProxyError> {
        debug!("Probing {}", url);
        Ok(self
            .client
            .head(url)
            .header("user-agent", user_agent)
            .header("accept", "*/*")
            .send()
            .await?)
    }
}

/// Probing operations the routing engine depends on, kept behind a trait
/// so tests can script per-candidate outcomes.
#[async_trait]
pub trait PackageProbe: Send + Sync {
    /// Issue a speculative HEAD request against a package URL.
    async fn probe(&self, url: &str, user_agent: &str) -> Result<Response, ProxyError>;
}

#[async_trait]
impl PackageProbe for GitLabClient {
    async fn probe(&self, url: &str, user_agent: &str) -> Result<Response, ProxyError> {
        GitLabClient::probe(self, url, user_agent).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_includes_api_prefix() {
        let client = GitLabClient::new(GitLabClientConfig {
            instance: "gitlab.example.com".to_string(),
        })
        .unwrap();
        assert_eq!(
            client.endpoint.as_str(),
            "https://gitlab.example.com/api/v4/"
        );
    }

    #[test]
    fn invalid_instance_is_rejected() {
        let result = GitLabClient::new(GitLabClientConfig {
            instance: "not a hostname".to_string(),
        });
        assert!(result.is_err());
    }
}
