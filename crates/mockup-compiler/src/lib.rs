pub mod binding;
pub mod error;
pub mod heuristic;
pub mod inline;
pub mod neutralize;
pub mod registry;
pub mod render;
pub mod rewrite;

pub use binding::{resolve, AttributePolicy, BindingContext, ResolvedValue};
pub use error::{PreviewError, PreviewResult};
pub use heuristic::{content_field, infer_content_field};
pub use inline::{inline, inline_with_limit, InlineResult, MAX_ITERATIONS};
pub use neutralize::neutralize;
pub use registry::{ComponentRecord, Registry};
pub use render::{assemble, PreviewDocument, RUNTIME_GUARD_JS};
pub use rewrite::rewrite;

use mockup_parser::extract_field_defaults;
use tracing::debug;

/// Compile a page and its component library into a preview document.
///
/// Pipeline:
/// 1. Seed the page context from the page logic's literal field initializers.
/// 2. `rewrite()` the page markup with that context.
/// 3. `inline()` every registered component tag.
/// 4. `assemble()` with component assets ahead of the page's own style and logic.
pub fn compile_preview(page: &ComponentRecord, components: &[ComponentRecord]) -> PreviewDocument {
    let registry = Registry::register(components.iter().cloned());
    let ctx = page_context(page);
    debug!(
        components = registry.len(),
        page_fields = ctx.len(),
        "compiling preview"
    );

    let page_markup = rewrite(&page.markup, &ctx);
    let inlined = inline(&page_markup, &registry);

    let mut styles = inlined.styles;
    styles.push(page.style_sheet.clone());
    let mut scripts = inlined.scripts;
    scripts.push(neutralize(&page.logic_source));

    assemble(&inlined.markup, &styles, &scripts)
}

/// Like [`compile_preview`], decoding the page record and the component list from JSON.
pub fn compile_preview_json(page_json: &str, components_json: &str) -> PreviewResult<PreviewDocument> {
    let page: ComponentRecord = serde_json::from_str(page_json).map_err(PreviewError::InvalidPage)?;
    let components: Vec<ComponentRecord> =
        serde_json::from_str(components_json).map_err(PreviewError::InvalidComponents)?;
    Ok(compile_preview(&page, &components))
}

/// The binding context a page renders with: its literal field initializers.
pub fn page_context(page: &ComponentRecord) -> BindingContext {
    extract_field_defaults(&page.logic_source)
        .into_iter()
        .map(|(name, literal)| (name, ResolvedValue::from(literal).into_json()))
        .collect()
}

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub fn compile_mockup(page_json: &str, components_json: &str, title: &str) -> Result<String, JsValue> {
    compile_preview_json(page_json, components_json)
        .map(|doc| doc.to_html(title))
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
