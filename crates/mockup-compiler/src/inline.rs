//! Recursive expansion of custom component tags.
//!
//! Each iteration runs four passes over the whole markup: self-closing
//! instances, paired instances holding only text, empty paired instances,
//! then paired instances wrapping nested markup (projected into the
//! component's `<ng-content>`). Expansion can reveal further tags, so the
//! loop repeats until a full iteration changes nothing or the iteration cap
//! is reached. Hitting the cap is not an error: whatever is still unexpanded
//! stays in the output as written.

use std::collections::HashSet;

use regex::{Captures, Regex};
use serde::Serialize;
use tracing::{debug, warn};

use crate::binding::{resolve_property, BindingContext};
use crate::heuristic::content_field;
use crate::neutralize::neutralize;
use crate::registry::{ComponentRecord, Registry};
use crate::rewrite::{is_fallback_condition, rewrite, HIDDEN_STYLE};
use mockup_parser::interpolation_refs;

/// Upper bound on expansion iterations for one page.
pub const MAX_ITERATIONS: usize = 20;

/// Attribute list of an opening tag; quoted values may contain `<` or `>`.
const ATTRS: &str = r#"(?:\s(?:[^<>"']|"[^"]*"|'[^']*')*)?"#;

/// Fully inlined markup plus the assets of every component it used.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InlineResult {
    pub markup: String,
    /// One style sheet per distinct component, in first-use order.
    pub styles: Vec<String>,
    /// One neutralized logic source per distinct component, in first-use order.
    pub scripts: Vec<String>,
}

/// Working state of one `inline` call.
#[derive(Debug)]
pub struct ExpansionState<'r> {
    registry: &'r Registry,
    markup: String,
    aggregated: HashSet<String>,
    styles: Vec<String>,
    scripts: Vec<String>,
    iterations: usize,
    max_iterations: usize,
}

/// Expand every registered component tag in `page_markup`.
pub fn inline(page_markup: &str, registry: &Registry) -> InlineResult {
    inline_with_limit(page_markup, registry, MAX_ITERATIONS)
}

/// [`inline`] with an explicit iteration cap.
pub fn inline_with_limit(page_markup: &str, registry: &Registry, max_iterations: usize) -> InlineResult {
    let mut state = ExpansionState::new(page_markup, registry, max_iterations);
    state.run();
    state.finish()
}

impl<'r> ExpansionState<'r> {
    pub fn new(markup: &str, registry: &'r Registry, max_iterations: usize) -> Self {
        Self {
            registry,
            markup: markup.to_string(),
            aggregated: HashSet::new(),
            styles: Vec::new(),
            scripts: Vec::new(),
            iterations: 0,
            max_iterations,
        }
    }

    /// Iterate to a fixed point or the cap.
    pub fn run(&mut self) {
        let mut changed = false;
        while self.iterations < self.max_iterations {
            self.iterations += 1;
            let before = self.markup.clone();

            self.expand_self_closing();
            self.expand_text_content();
            self.expand_empty();
            self.expand_projected();

            changed = self.markup != before;
            if !changed {
                break;
            }
        }

        if changed {
            warn!(
                iterations = self.iterations,
                "component expansion hit the iteration cap; leaving remaining tags unexpanded"
            );
        } else {
            debug!(
                iterations = self.iterations,
                components = self.aggregated.len(),
                "component expansion settled"
            );
        }
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn finish(self) -> InlineResult {
        InlineResult {
            markup: self.markup,
            styles: self.styles,
            scripts: self.scripts,
        }
    }

    /// `<app-x ... />`
    fn expand_self_closing(&mut self) {
        let re = Regex::new(r#"<([A-Za-z][\w-]*)((?:\s(?:[^<>"']|"[^"]*"|'[^']*')*?)?)\s*/>"#).unwrap();
        let markup = std::mem::take(&mut self.markup);
        self.markup = re
            .replace_all(&markup, |caps: &Captures| {
                self.expand_instance(&caps[1], &caps[2], "")
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned();
    }

    /// `<app-x ...>Some text</app-x>`
    fn expand_text_content(&mut self) {
        let re = Regex::new(&format!(
            r#"<([A-Za-z][\w-]*)({ATTRS})>([^<]*[^<\s][^<]*)</([A-Za-z][\w-]*)\s*>"#
        ))
        .unwrap();
        let markup = std::mem::take(&mut self.markup);
        self.markup = re
            .replace_all(&markup, |caps: &Captures| {
                if caps[1] != caps[4] {
                    return caps[0].to_string();
                }
                self.expand_instance(&caps[1], &caps[2], &caps[3])
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned();
    }

    /// `<app-x ...></app-x>`
    fn expand_empty(&mut self) {
        let re =
            Regex::new(&format!(r#"<([A-Za-z][\w-]*)({ATTRS})>\s*</([A-Za-z][\w-]*)\s*>"#)).unwrap();
        let markup = std::mem::take(&mut self.markup);
        self.markup = re
            .replace_all(&markup, |caps: &Captures| {
                if caps[1] != caps[3] {
                    return caps[0].to_string();
                }
                self.expand_instance(&caps[1], &caps[2], "")
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned();
    }

    /// `<app-x ...><p>nested</p></app-x>`
    fn expand_projected(&mut self) {
        let open_re = Regex::new(&format!(r#"<([A-Za-z][\w-]*)({ATTRS})>"#)).unwrap();
        let markup = std::mem::take(&mut self.markup);
        let mut result = String::with_capacity(markup.len());
        let mut cursor = 0;

        while let Some(caps) = open_re.captures_at(&markup, cursor) {
            let Some(whole) = caps.get(0) else {
                break;
            };
            let tag = &caps[1];
            let attrs = &caps[2];
            if !self.registry.contains(tag) || attrs.trim_end().ends_with('/') {
                result.push_str(&markup[cursor..whole.end()]);
                cursor = whole.end();
                continue;
            }

            let content_start = whole.end();
            let close = find_matching_close_tag(&markup[content_start..], tag)
                .map(|pos| content_start + pos);
            let Some(close) = close else {
                result.push_str(&markup[cursor..whole.end()]);
                cursor = whole.end();
                continue;
            };
            let inner = &markup[content_start..close];
            if !inner.contains('<') {
                // text-only and empty instances belong to the other passes
                result.push_str(&markup[cursor..whole.end()]);
                cursor = whole.end();
                continue;
            }
            let close_end = markup[close..]
                .find('>')
                .map(|pos| close + pos + 1)
                .unwrap_or(markup.len());

            result.push_str(&markup[cursor..whole.start()]);
            match self.expand_instance(tag, attrs, inner) {
                Some(expanded) => result.push_str(&expanded),
                None => result.push_str(&markup[whole.start()..close_end]),
            }
            cursor = close_end;
        }

        result.push_str(&markup[cursor..]);
        self.markup = result;
    }

    /// Render one instance of a registered component. `None` for unregistered tags.
    fn expand_instance(&mut self, tag: &str, attrs: &str, inner: &str) -> Option<String> {
        let registry = self.registry;
        let record = registry.lookup(tag)?;
        self.aggregate(tag, record);

        if record.markup.trim().is_empty() {
            debug!(selector = tag, "component has no markup; expanding to nothing");
            return Some(String::new());
        }

        let field = content_field(record);
        let ctx = instance_context(attrs, inner, &field);
        let rendered = rewrite(&record.markup, &ctx);

        let projected = if inner.contains('<') {
            inner.trim()
        } else if interpolation_refs(&record.markup).contains(&field) {
            ""
        } else {
            inner.trim()
        };
        debug!(selector = tag, keys = ctx.len(), "expanded component instance");
        let expanded = project_content(&rendered, projected);
        if is_hidden_instance(attrs) {
            return Some(format!("<div {HIDDEN_STYLE}>{expanded}</div>"));
        }
        Some(expanded)
    }

    /// Collect style and logic the first time a selector is expanded.
    fn aggregate(&mut self, tag: &str, record: &ComponentRecord) {
        if !self.aggregated.insert(tag.to_string()) {
            return;
        }
        let style = record.style_sheet.trim();
        if !style.is_empty() {
            self.styles.push(style.to_string());
        }
        let script = neutralize(&record.logic_source);
        if !script.is_empty() {
            self.scripts.push(script);
        }
    }
}

/// Whether the host tag was hidden as a loading, empty or error branch.
fn is_hidden_instance(attrs: &str) -> bool {
    if attrs.contains(HIDDEN_STYLE) {
        return true;
    }
    let if_re = Regex::new(r#"\*ngIf\s*=\s*"([^"]*)""#).unwrap();
    if_re
        .captures(attrs)
        .map(|caps| is_fallback_condition(caps[1].split(';').next().unwrap_or_default()))
        .unwrap_or(false)
}

/// Build the binding context for one component instance.
///
/// Property bindings are read first, then plain `name="value"` and bare-name
/// attributes. An earlier key is never overwritten. Plain inner text goes
/// into `content_field`.
pub fn instance_context(attrs: &str, inner: &str, content_field: &str) -> BindingContext {
    let mut ctx = BindingContext::new();
    let unbound = BindingContext::new();

    let property_re = Regex::new(r#"\[([\w.\-]+)\]\s*=\s*"([^"]*)""#).unwrap();
    for caps in property_re.captures_iter(attrs) {
        let raw_name = &caps[1];
        let name = raw_name.strip_prefix("attr.").unwrap_or(raw_name);
        if name.contains('.') {
            continue;
        }
        let value = resolve_property(name, &caps[2], &unbound);
        ctx.insert_if_absent(name, value.into_json());
    }

    let syntax_re = Regex::new(
        r#"\[\(?[\w.\-]+\)?\]\s*=\s*"[^"]*"|\([\w.\-]+\)\s*=\s*"[^"]*"|\*\w+\s*=\s*"[^"]*"|#[\w-]+(?:\s*=\s*"[^"]*")?"#,
    )
    .unwrap();
    let plain = syntax_re.replace_all(attrs, " ");
    let attr_re =
        Regex::new(r#"([A-Za-z_:][\w:.\-]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'))?"#).unwrap();
    for caps in attr_re.captures_iter(&plain) {
        let name = &caps[1];
        match caps.get(2).or_else(|| caps.get(3)) {
            Some(value) => ctx.insert_if_absent(name, value.as_str()),
            None => ctx.insert_if_absent(name, true),
        };
    }

    let text = inner.trim();
    if !text.is_empty() && !inner.contains('<') {
        ctx.insert_if_absent(content_field, text);
    }
    ctx
}

/// Place projected content at the first unselective `<ng-content>`. Other slots are dropped.
pub fn project_content(markup: &str, content: &str) -> String {
    let slot_re = Regex::new(r#"<ng-content\b([^>]*?)/?>(?:\s*</ng-content>)?"#).unwrap();
    let mut placed = false;
    slot_re
        .replace_all(markup, |caps: &Captures| {
            if !placed && !caps[1].contains("select") {
                placed = true;
                content.to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}

/// Offset of the `</tag>` closing the element whose content starts at `html`.
fn find_matching_close_tag(html: &str, tag_name: &str) -> Option<usize> {
    let open = format!("<{}", tag_name);
    let close = format!("</{}", tag_name);
    let mut depth = 0;
    let mut pos = 0;
    while pos < html.len() {
        let rest = &html[pos..];
        if rest.starts_with(&close) && is_name_end(rest.as_bytes().get(close.len())) {
            if depth == 0 {
                return Some(pos);
            }
            depth -= 1;
            pos += close.len();
        } else if rest.starts_with(&open) && is_name_end(rest.as_bytes().get(open.len())) {
            let self_closing = tag_end(rest)
                .map(|gt| rest[..gt].ends_with('/'))
                .unwrap_or(false);
            if !self_closing {
                depth += 1;
            }
            pos += open.len();
        } else {
            pos += rest.chars().next().map(char::len_utf8).unwrap_or(1);
        }
    }
    None
}

/// Offset of the `>` ending the tag at the start of `html`, skipping quoted values.
fn tag_end(html: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, ch) in html.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '>') => return Some(i),
            (None, _) => {}
        }
    }
    None
}

fn is_name_end(byte: Option<&u8>) -> bool {
    matches!(byte, Some(b' ' | b'>' | b'/' | b'\n' | b'\r' | b'\t'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn button() -> ComponentRecord {
        ComponentRecord {
            name: "AppButtonComponent".into(),
            selector: Some("app-button".into()),
            markup: r#"<button class="btn">{{ label }}</button>"#.into(),
            style_sheet: ".btn { color: red; }".into(),
            logic_source: "export class AppButtonComponent {\n  @Input() label: string;\n  @Input() icon: string;\n}".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_unregistered_tag_passthrough() {
        let registry = Registry::register(vec![button()]);
        let page = r#"<unknown-widget foo="1"></unknown-widget>"#;
        let result = inline(page, &registry);
        assert_eq!(result.markup, page);
        assert!(result.styles.is_empty());
        assert!(result.scripts.is_empty());
    }

    #[test]
    fn test_text_content_fills_heuristic_field() {
        let record = button();
        let ctx = instance_context("", "Save", &content_field(&record));
        assert_eq!(ctx, BindingContext::from_json(json!({"label": "Save"})));

        let registry = Registry::register(vec![record]);
        let result = inline("<main><app-button>Save</app-button></main>", &registry);
        assert_eq!(result.markup, r#"<main><button class="btn">Save</button></main>"#);
    }

    #[test]
    fn test_styles_and_scripts_deduplicated() {
        let registry = Registry::register(vec![button()]);
        let page = "<app-button>Save</app-button><app-button label=\"Cancel\"></app-button><app-button />";
        let result = inline(page, &registry);
        assert_eq!(
            result.markup,
            r#"<button class="btn">Save</button><button class="btn">Cancel</button><button class="btn">label</button>"#
        );
        assert_eq!(result.styles, vec![".btn { color: red; }"]);
        assert_eq!(result.scripts.len(), 1);
        assert!(result.scripts[0].starts_with("class AppButtonComponent {"));
    }

    #[test]
    fn test_attribute_precedence() {
        let ctx = instance_context(
            r#" [label]="'Bound'" label="Plain" (click)="go()" *ngIf="ok" #ref [class.x]="y" primary"#,
            "",
            "label",
        );
        assert_eq!(
            ctx,
            BindingContext::from_json(json!({"label": "Bound", "primary": true}))
        );
    }

    #[test]
    fn test_nested_components_expand() {
        let card = ComponentRecord {
            markup: "<div class=\"card\"><h2>{{ title }}</h2><app-button>Open</app-button></div>".into(),
            style_sheet: ".card {}".into(),
            logic_source: "@Input() title: string;".into(),
            ..ComponentRecord::new("app-card", "")
        };
        let registry = Registry::register(vec![card, button()]);
        let result = inline(r#"<app-card title="Hello"></app-card>"#, &registry);
        assert_eq!(
            result.markup,
            r#"<div class="card"><h2>Hello</h2><button class="btn">Open</button></div>"#
        );
        assert_eq!(result.styles, vec![".card {}", ".btn { color: red; }"]);
    }

    #[test]
    fn test_nested_markup_projected() {
        let panel = ComponentRecord::new(
            "app-panel",
            "<section><ng-content select=\"[header]\"></ng-content><ng-content></ng-content></section>",
        );
        let registry = Registry::register(vec![panel, button()]);
        let result = inline(
            "<app-panel><p>Body</p><app-button>Go</app-button></app-panel>",
            &registry,
        );
        assert_eq!(
            result.markup,
            r#"<section><p>Body</p><button class="btn">Go</button></section>"#
        );
    }

    #[test]
    fn test_self_referential_component_terminates() {
        let looped = ComponentRecord::new("app-loop", "<div><app-loop></app-loop></div>");
        let registry = Registry::register(vec![looped]);

        let result = inline_with_limit("<app-loop></app-loop>", &registry, 3);
        assert_eq!(result.markup, "<div><div><div><app-loop></app-loop></div></div></div>");
        assert_eq!(result.scripts.len(), 0);

        let capped = inline("<app-loop></app-loop>", &registry);
        assert_eq!(capped.markup.matches("<div>").count(), MAX_ITERATIONS);
    }

    #[test]
    fn test_empty_markup_expands_to_nothing() {
        let blank = ComponentRecord {
            style_sheet: ".blank {}".into(),
            ..ComponentRecord::new("app-blank", "")
        };
        let registry = Registry::register(vec![blank]);
        let result = inline("<p>a</p><app-blank></app-blank><p>b</p>", &registry);
        assert_eq!(result.markup, "<p>a</p><p>b</p>");
        assert_eq!(result.styles, vec![".blank {}"]);
    }

    #[test]
    fn test_settles_without_using_cap() {
        let registry = Registry::register(vec![button()]);
        let mut state = ExpansionState::new("<app-button>Hi</app-button>", &registry, MAX_ITERATIONS);
        state.run();
        assert_eq!(state.iterations(), 2);
    }

    #[test]
    fn test_text_projected_when_field_unused() {
        let chip = ComponentRecord::new("app-chip", "<span class=\"chip\"><ng-content></ng-content></span>");
        let registry = Registry::register(vec![chip]);
        let result = inline("<app-chip>New</app-chip>", &registry);
        assert_eq!(result.markup, r#"<span class="chip">New</span>"#);
    }

    #[test]
    fn test_fallback_instances_stay_hidden() {
        let spinner = ComponentRecord::new("app-spinner", r#"<div class="spinner">Loading...</div>"#);
        let registry = Registry::register(vec![spinner, button()]);

        let page = rewrite(
            r#"<main><app-spinner *ngIf="isLoading"></app-spinner><app-button *ngIf="user">Go</app-button></main>"#,
            &BindingContext::new(),
        );
        let result = inline(&page, &registry);
        assert_eq!(
            result.markup,
            format!(
                r#"<main><div {HIDDEN_STYLE}><div class="spinner">Loading...</div></div><button class="btn">Go</button></main>"#
            )
        );

        let raw = inline(r#"<app-spinner *ngIf="items.length === 0" />"#, &registry);
        assert_eq!(
            raw.markup,
            format!(r#"<div {HIDDEN_STYLE}><div class="spinner">Loading...</div></div>"#)
        );
    }

    #[test]
    fn test_angle_bracket_inside_attribute_value() {
        let badge = ComponentRecord {
            logic_source: "@Input() visible: boolean;\n@Input() text: string;".into(),
            ..ComponentRecord::new(
                "app-badge",
                r#"<span class="badge" title="{{ visible }}">{{ text }}<ng-content></ng-content></span>"#,
            )
        };
        let registry = Registry::register(vec![badge, button()]);

        let result = inline(r#"<app-badge visible="count > 0">New</app-badge>"#, &registry);
        assert_eq!(result.markup, r#"<span class="badge" title="count > 0">New</span>"#);

        let empty = inline(r#"<app-badge visible="a > b" text="Hot"></app-badge>"#, &registry);
        assert_eq!(empty.markup, r#"<span class="badge" title="a > b">Hot</span>"#);

        let nested = inline(
            r#"<app-badge visible="x > 1"><app-button label="Ok" /></app-badge>"#,
            &registry,
        );
        assert_eq!(
            nested.markup,
            r#"<span class="badge" title="x > 1">text<button class="btn">Ok</button></span>"#
        );
    }

    #[test]
    fn test_find_matching_close_tag_nested() {
        assert_eq!(find_matching_close_tag("<app-x>in</app-x>tail</app-x>", "app-x"), Some(21));
        assert_eq!(find_matching_close_tag("<app-x/>x</app-x>", "app-x"), Some(9));
        assert_eq!(find_matching_close_tag("<app-xy></app-xy></app-x>", "app-x"), Some(17));
        assert_eq!(find_matching_close_tag("<p>no close", "app-x"), None);
        assert_eq!(find_matching_close_tag(r#"<app-x a="1 > 0"/>x</app-x>"#, "app-x"), Some(19));
    }
}
