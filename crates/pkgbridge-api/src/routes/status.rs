//! Diagnostic status page

use axum::Router;
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;

use crate::state::AppState;

/// Render the cache state as a plain HTML page. Reads only the current
/// snapshot and never touches upstream, so it always answers 200.
async fn status(State(state): State<AppState>) -> Html<String> {
    let projects = state.index.projects();
    let releases = state.index.releases();
    let release_count: usize = releases.values().map(Vec::len).sum();

    let project_list = projects
        .iter()
        .map(|project| {
            let latest = releases
                .get(&project.path)
                .and_then(|list| list.first())
                .map(|release| release.name.as_str())
                .unwrap_or("n/a");
            format!(
                "<div class=\"list-entry\">\n    <b>{}</b>: {}<br>\n    Latest release: {}\n</div>",
                project.name, project.links.self_url, latest
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    Html(format!(
        r#"<html lang='en'>
    <head>
        <meta charset='UTF-8'>
        <title>PkgBridge Status</title>
        <style>
            html {{
                background: #121212;
                color: #EEEEEE;
            }}
            h1 {{
                color: #1288FF
            }}
            h2 {{
                color: #AAAAAA;
            }}
            .list-entry {{
                padding: 8px;
                margin: auto auto 16px auto;
                border: 1px solid #AAAAAA;
                border-radius: 6px;
                background: #222222;
            }}
        </style>
    </head>
    <body>
        <h1>PKGBRIDGE STATUS</h1>
        Version: {version}<br>
        GitLab Instance: {instance}<br>
        Groups: {groups}<br>
        Projects: {projects}<br>
        Releases: {releases}

        <h2>SERVING PROJECTS</h2>
        {project_list}
    </body>
</html>"#,
        version = env!("CARGO_PKG_VERSION"),
        instance = state.instance,
        groups = state.group_count,
        projects = projects.len(),
        releases = release_count,
        project_list = project_list,
    ))
}

/// Create status routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/status", get(status))
}
