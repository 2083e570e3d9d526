pub mod render;
mod server;
mod watcher;

use mockup_context::project::MockupProject;

/// Serve the project's preview with live reload until the process is stopped.
pub async fn start(project: MockupProject, port: u16) -> anyhow::Result<()> {
    server::run(project, port).await
}
