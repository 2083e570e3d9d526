use anyhow::Result;
use mockup_context::project::MockupProject;

pub async fn run(project: MockupProject, port: u16) -> Result<()> {
    println!("Starting preview server for '{}'...", project.config.display_title());
    mockup_dev::start(project, port).await
}
