use regex::Regex;
use serde::{Deserialize, Serialize};

/// Script injected ahead of all component logic. Suppresses navigation,
/// submission and network side effects while leaving hover/active styling intact.
pub const RUNTIME_GUARD_JS: &str = include_str!("guard.js");

/// The assembled preview: one markup body, one style sheet, one script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewDocument {
    pub markup: String,
    /// Component styles first, page styles last.
    pub styles: String,
    /// Component logic first, page logic last. Each source runs in its own `try`.
    pub script: String,
    pub runtime_guard: String,
}

/// Combine inlined markup with ordered styles and neutralized scripts.
///
/// Callers pass reusable-component entries before the page's own.
pub fn assemble(markup: &str, styles: &[String], scripts: &[String]) -> PreviewDocument {
    let styles = styles
        .iter()
        .map(|css| css.trim())
        .filter(|css| !css.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let script = scripts
        .iter()
        .map(|js| js.trim())
        .filter(|js| !js.is_empty())
        .map(isolate_script)
        .collect::<Vec<_>>()
        .join("\n");

    PreviewDocument {
        markup: markup.to_string(),
        styles,
        script,
        runtime_guard: RUNTIME_GUARD_JS.to_string(),
    }
}

/// Wrap one logic source so a runtime failure only skips that source.
fn isolate_script(js: &str) -> String {
    format!(
        "try {{\n{js}\n}} catch (err) {{\n  console.warn('[mockup] preview script failed', err);\n}}"
    )
}

impl PreviewDocument {
    /// Render as one self-contained HTML document.
    ///
    /// When the markup is already a full document (contains `<html`), styles go
    /// before `</head>` and scripts before `</body>`; otherwise a default shell is used.
    pub fn to_html(&self, title: &str) -> String {
        let style_block = if self.styles.is_empty() {
            String::new()
        } else {
            format!("<style>\n{}\n</style>", escape_close_tag(&self.styles, "style"))
        };
        let guard = escape_close_tag(&self.runtime_guard, "script");
        let mut script_block = format!("<script>\n{}\n</script>", guard.trim_end());
        if !self.script.is_empty() {
            script_block.push_str(&format!(
                "\n<script>\n{}\n</script>",
                escape_close_tag(&self.script, "script")
            ));
        }

        if self.markup.contains("<html") {
            let mut html = self.markup.clone();
            inject_before_close(&mut html, "</head>", &style_block);
            inject_before_close(&mut html, "</body>", &script_block);
            html
        } else {
            let title = escape_text(title);
            let markup = &self.markup;
            format!(
                r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8" />
<meta name="viewport" content="width=device-width, initial-scale=1.0" />
<title>{title}</title>
{style_block}
</head>
<body>
{markup}
{script_block}
</body>
</html>"#
            )
        }
    }
}

/// Insert `content` before a closing tag (e.g. `</head>`, `</body>`),
/// indented one level deeper than the closing tag's line.
fn inject_before_close(html: &mut String, close_tag: &str, content: &str) {
    if content.is_empty() {
        return;
    }
    if let Some(pos) = html.rfind(close_tag) {
        let before = &html[..pos];
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let line_prefix = &before[line_start..];
        if !line_prefix.trim().is_empty() {
            html.insert_str(pos, content);
            return;
        }
        let child_indent = format!("{line_prefix}  ");
        let mut injection = String::new();
        for line in content.lines() {
            injection.push_str(&child_indent);
            injection.push_str(line);
            injection.push('\n');
        }
        html.insert_str(line_start, &injection);
    }
}

/// Keep embedded text from terminating its `<script>`/`<style>` element early.
fn escape_close_tag(text: &str, tag: &str) -> String {
    let re = Regex::new(&format!(r"(?i)</{tag}")).unwrap();
    re.replace_all(text, format!(r"<\/{tag}").as_str()).to_string()
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
