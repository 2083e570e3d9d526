use anyhow::Result;
use mockup_compiler::{compile_preview, ComponentRecord};
use mockup_context::project::MockupProject;
use tracing::debug;

const CLIENT_JS: &str = include_str!("client.js");

/// Load the project inputs fresh from disk and render the preview document.
pub fn render_preview(project: &MockupProject) -> Result<String> {
    let components = project.load_components()?;
    let page = project.load_page()?;
    debug!(components = components.len(), page = %page.name, "rendering preview");
    Ok(render_records(&page, &components, project.config.display_title()))
}

/// Render a page record against a component library into a full HTML document.
pub fn render_records(page: &ComponentRecord, components: &[ComponentRecord], title: &str) -> String {
    compile_preview(page, components).to_html(title)
}

/// Host page: the preview runs in a script-only sandboxed frame, reloaded over
/// the WebSocket when inputs change.
pub fn host_html(title: &str) -> String {
    let title = escape_html(title);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8" />
<meta name="viewport" content="width=device-width, initial-scale=1.0" />
<title>{title} · mockup</title>
<style>
  html, body {{ margin: 0; height: 100%; font-family: system-ui, sans-serif; }}
  header {{ display: flex; justify-content: space-between; padding: 6px 12px; background: #1f2933; color: #f5f7fa; font-size: 13px; }}
  iframe {{ border: 0; width: 100%; height: calc(100% - 30px); background: #fff; }}
</style>
</head>
<body>
<header><span>{title}</span><span id="mockup-status">connecting</span></header>
<iframe id="mockup-preview" src="/__mockup/preview" sandbox="allow-scripts" title="preview"></iframe>
<script>{CLIENT_JS}</script>
</body>
</html>"#
    )
}

pub fn error_html(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><body>
        <h1>Render Error</h1>
        <pre>{}</pre>
        </body></html>"#,
        escape_html(message)
    )
}

fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(ch),
        }
    }
    result
}
