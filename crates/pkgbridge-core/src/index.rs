//! Background-refreshed project and release index

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use pkgbridge_proxy::{Project, Release};

use crate::source::ProjectSource;

/// Index cache configuration
#[derive(Clone, Debug)]
pub struct IndexConfig {
    /// Groups whose projects are polled
    pub groups: Vec<String>,
    /// Delay between refresh cycles
    pub poll_interval: Duration,
}

/// Periodically refreshed snapshot of upstream projects and their releases.
///
/// Readers always get the latest published snapshot without waiting on a
/// refresh in progress. Each collection is replaced wholesale and never
/// edited in place, so concurrent readers cannot observe a torn list.
/// The project list and the release map are published by separate fetch
/// phases: a brand-new project may briefly appear with no releases yet.
pub struct ProjectIndex {
    config: IndexConfig,
    source: Arc<dyn ProjectSource>,
    projects: RwLock<Arc<Vec<Project>>>,
    releases: RwLock<Arc<HashMap<String, Vec<Release>>>>,
    shutdown: watch::Sender<bool>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl ProjectIndex {
    /// Create an empty index. Call [`start`](Self::start) to begin polling.
    pub fn new(config: IndexConfig, source: Arc<dyn ProjectSource>) -> Arc<Self> {
        let (shutdown, _) = watch::channel(false);
        Arc::new(Self {
            config,
            source,
            projects: RwLock::new(Arc::new(Vec::new())),
            releases: RwLock::new(Arc::new(HashMap::new())),
            shutdown,
            refresh_task: Mutex::new(None),
        })
    }

    /// Spawn the refresh loop for an index handle. The first cycle begins
    /// immediately; each subsequent cycle waits out the configured poll
    /// interval. Call once.
    pub fn start(index: &Arc<Self>) {
        let task = Arc::clone(index);
        let mut shutdown = index.shutdown.subscribe();

        info!("Starting index refresh task");
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(task.config.poll_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => task.refresh().await,
                    _ = shutdown.changed() => break,
                }
            }
            info!("Index refresh task stopped");
        });

        *index.refresh_task.lock() = Some(handle);
    }

    /// Run one full refresh cycle.
    ///
    /// Phase 1 lists every configured group concurrently and publishes the
    /// flattened project list; phase 2 lists releases for every project of
    /// the just-published list and publishes the path-to-releases map. A
    /// failed fetch degrades to an empty result for that group or project
    /// and never aborts the cycle.
    pub async fn refresh(&self) {
        info!("Refreshing project index");
        let projects = self.fetch_projects().await;
        *self.projects.write() = Arc::clone(&projects);

        let releases = self.fetch_releases(&projects).await;
        *self.releases.write() = releases;
    }

    async fn fetch_projects(&self) -> Arc<Vec<Project>> {
        let fetches = self.config.groups.iter().map(|group| {
            let source = Arc::clone(&self.source);
            async move {
                match source.group_projects(group).await {
                    Ok(projects) => {
                        debug!("Fetched {} projects for group {}", projects.len(), group);
                        projects
                    }
                    Err(e) => {
                        error!("Could not list projects for group {}: {}", group, e);
                        Vec::new()
                    }
                }
            }
        });

        Arc::new(join_all(fetches).await.into_iter().flatten().collect())
    }

    async fn fetch_releases(&self, projects: &[Project]) -> Arc<HashMap<String, Vec<Release>>> {
        let fetches = projects.iter().map(|project| {
            let source = Arc::clone(&self.source);
            async move {
                match source.project_releases(project).await {
                    Ok(releases) => {
                        debug!(
                            "Fetched {} releases for project {}",
                            releases.len(),
                            project.path
                        );
                        (project.path.clone(), releases)
                    }
                    Err(e) => {
                        error!("Could not list releases for {}: {}", project.path, e);
                        (project.path.clone(), Vec::new())
                    }
                }
            }
        });

        Arc::new(join_all(fetches).await.into_iter().collect())
    }

    /// The latest published project list; never waits on a refresh.
    pub fn projects(&self) -> Arc<Vec<Project>> {
        Arc::clone(&self.projects.read())
    }

    /// The latest published path-to-releases map; never waits on a refresh.
    pub fn releases(&self) -> Arc<HashMap<String, Vec<Release>>> {
        Arc::clone(&self.releases.read())
    }

    /// Stop the refresh loop and wait for it to exit. An in-flight cycle
    /// runs to completion before the loop observes the signal. Idempotent.
    pub async fn close(&self) {
        info!("Stopping index refresh task");
        let _ = self.shutdown.send(true);

        let handle = self.refresh_task.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Index refresh task did not shut down cleanly: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pkgbridge_proxy::{ProjectLinks, ProxyError, ReleaseCommit};

    fn make_project(path: &str) -> Project {
        Project {
            id: 1,
            name: path.to_string(),
            path: path.to_string(),
            path_with_namespace: format!("kk/{}", path),
            default_branch: Some("master".to_string()),
            links: ProjectLinks {
                self_url: format!("https://gitlab.example.com/api/v4/projects/{}", path),
                events: format!("https://gitlab.example.com/api/v4/projects/{}/events", path),
            },
        }
    }

    fn make_release(tag: &str) -> Release {
        Release {
            name: format!("Release {}", tag),
            tag_name: tag.to_string(),
            description: None,
            upcoming_release: false,
            commit: ReleaseCommit {
                id: "a1b2c3".to_string(),
                short_id: "a1b2".to_string(),
                web_url: "https://gitlab.example.com/commit/a1b2c3".to_string(),
            },
        }
    }

    fn fetch_failed() -> ProxyError {
        ProxyError::Status {
            url: "https://gitlab.example.com/api/v4".to_string(),
            status: 502,
        }
    }

    /// Stub upstream keyed by group and project path. Missing keys fail
    /// the fetch, standing in for an unreachable upstream.
    struct StubSource {
        groups: HashMap<String, Vec<Project>>,
        releases: HashMap<String, Vec<Release>>,
    }

    #[async_trait]
    impl ProjectSource for StubSource {
        async fn group_projects(&self, group: &str) -> Result<Vec<Project>, ProxyError> {
            self.groups.get(group).cloned().ok_or_else(fetch_failed)
        }

        async fn project_releases(&self, project: &Project) -> Result<Vec<Release>, ProxyError> {
            self.releases
                .get(&project.path)
                .cloned()
                .ok_or_else(fetch_failed)
        }
    }

    fn make_index(groups: Vec<&str>, source: StubSource) -> Arc<ProjectIndex> {
        ProjectIndex::new(
            IndexConfig {
                groups: groups.into_iter().map(String::from).collect(),
                poll_interval: Duration::from_millis(20),
            },
            Arc::new(source),
        )
    }

    #[tokio::test]
    async fn refresh_publishes_projects_and_releases() {
        let source = StubSource {
            groups: HashMap::from([(
                "kk".to_string(),
                vec![make_project("skroll"), make_project("pthread")],
            )]),
            releases: HashMap::from([
                ("skroll".to_string(), vec![make_release("v2.0")]),
                ("pthread".to_string(), vec![]),
            ]),
        };
        let index = make_index(vec!["kk"], source);

        assert!(index.projects().is_empty());
        index.refresh().await;

        let projects = index.projects();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].path, "skroll");

        let releases = index.releases();
        assert_eq!(releases["skroll"][0].tag_name, "v2.0");
        assert!(releases["pthread"].is_empty());
    }

    #[tokio::test]
    async fn failed_group_degrades_to_empty() {
        let source = StubSource {
            groups: HashMap::from([("kk".to_string(), vec![make_project("skroll")])]),
            releases: HashMap::from([("skroll".to_string(), vec![])]),
        };
        let index = make_index(vec!["kk", "missing"], source);

        index.refresh().await;

        // The failing group contributes nothing; the healthy one still lands.
        let projects = index.projects();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].path, "skroll");
    }

    #[tokio::test]
    async fn failed_release_fetch_is_isolated() {
        let source = StubSource {
            groups: HashMap::from([(
                "kk".to_string(),
                vec![make_project("skroll"), make_project("broken")],
            )]),
            releases: HashMap::from([("skroll".to_string(), vec![make_release("v1.0")])]),
        };
        let index = make_index(vec!["kk"], source);

        index.refresh().await;

        let releases = index.releases();
        assert_eq!(releases["skroll"].len(), 1);
        assert!(releases["broken"].is_empty());
    }

    #[tokio::test]
    async fn release_order_is_preserved() {
        let source = StubSource {
            groups: HashMap::from([("kk".to_string(), vec![make_project("skroll")])]),
            releases: HashMap::from([(
                "skroll".to_string(),
                vec![make_release("v2.0"), make_release("v1.0")],
            )]),
        };
        let index = make_index(vec!["kk"], source);

        index.refresh().await;

        // First entry stays first; the routing engine treats it as latest.
        let releases = index.releases();
        assert_eq!(releases["skroll"][0].tag_name, "v2.0");
        assert_eq!(releases["skroll"][1].tag_name, "v1.0");
    }

    #[tokio::test]
    async fn readers_see_old_snapshot_until_replaced() {
        let source = StubSource {
            groups: HashMap::from([("kk".to_string(), vec![make_project("skroll")])]),
            releases: HashMap::from([("skroll".to_string(), vec![])]),
        };
        let index = make_index(vec!["kk"], source);

        let before = index.projects();
        index.refresh().await;
        let after = index.projects();

        // The old handle still reads the old complete list.
        assert!(before.is_empty());
        assert_eq!(after.len(), 1);
    }

    #[tokio::test]
    async fn close_joins_refresh_task() {
        let source = StubSource {
            groups: HashMap::from([("kk".to_string(), vec![make_project("skroll")])]),
            releases: HashMap::from([("skroll".to_string(), vec![])]),
        };
        let index = make_index(vec!["kk"], source);

        ProjectIndex::start(&index);
        tokio::time::sleep(Duration::from_millis(5)).await;
        index.close().await;

        // The first cycle ran before the loop observed the stop signal.
        assert_eq!(index.projects().len(), 1);

        // Closing again is a no-op.
        index.close().await;
    }
}
