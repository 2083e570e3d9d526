use anyhow::{Context, Result};
use mockup_compiler::compile_preview;
use mockup_context::project::MockupProject;
use std::fs;

pub fn run(project: &MockupProject) -> Result<()> {
    let components = project.load_components()?;
    let page = project.load_page()?;

    println!("Rendering preview...");
    println!("  {} component(s), page '{}'", components.len(), page.name);

    let document = compile_preview(&page, &components);
    let html = document.to_html(project.config.display_title());

    let out_path = project.out_path();
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&out_path, &html)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;

    println!("\nWrote {} ({} bytes)", out_path.display(), html.len());
    Ok(())
}
