//! Ordered template rewriting.
//!
//! A component template is rewritten by a fixed sequence of passes, each a
//! single global substitution over the whole string. Later passes assume the
//! earlier ones already consumed their syntax: bindings are resolved before
//! event handlers are stripped, and structural directives are handled last so
//! that an element's `[routerLink]` has already been resolved to text.

use regex::{Captures, Regex};
use tracing::trace;

use crate::binding::{
    display_value, lookup, render_attribute, resolve_interpolation, resolve_property,
    AttributePolicy, BindingContext,
};
use mockup_parser::strip_quotes;

/// Inline style that hides an element kept only for its fallback state.
pub const HIDDEN_STYLE: &str = r#"style="display: none !important;""#;

/// One named stage of the rewrite pipeline.
pub struct RewritePass {
    pub name: &'static str,
    pub apply: fn(&str, &BindingContext) -> String,
}

/// The rewrite pipeline, in application order.
pub const PASSES: [RewritePass; 6] = [
    RewritePass { name: "interpolation", apply: resolve_interpolations },
    RewritePass { name: "property-binding", apply: resolve_property_bindings },
    RewritePass { name: "event-binding", apply: strip_event_bindings },
    RewritePass { name: "conditional", apply: apply_conditionals },
    RewritePass { name: "repeater", apply: strip_repeaters },
    RewritePass { name: "router-link", apply: convert_router_links },
];

/// Rewrite one template against a binding context.
pub fn rewrite(markup: &str, ctx: &BindingContext) -> String {
    PASSES.iter().fold(markup.to_string(), |acc, pass| {
        let next = (pass.apply)(&acc, ctx);
        if next != acc {
            trace!(pass = pass.name, "rewrite pass changed markup");
        }
        next
    })
}

/// 1. `{{ expr }}` → resolved text.
pub fn resolve_interpolations(markup: &str, ctx: &BindingContext) -> String {
    let mut result = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        if let Some(end) = after_open.find("}}") {
            result.push_str(&resolve_interpolation(&after_open[..end], ctx));
            rest = &after_open[end + 2..];
        } else {
            result.push_str("{{");
            rest = after_open;
        }
    }
    result.push_str(rest);
    result
}

/// 2. `[name]="expr"` → `name="value"`, bare boolean, or nothing.
///
/// `[attr.x]` renders as `x`. Two-way `[(ngModel)]` becomes `value` when the
/// expression resolves. Per-key `[class.x]` / `[style.x]` bindings are dropped.
pub fn resolve_property_bindings(markup: &str, ctx: &BindingContext) -> String {
    let banana_re = Regex::new(r#"\s*\[\(([\w.\-]+)\)\]="([^"]*)""#).unwrap();
    let result = banana_re.replace_all(markup, |caps: &Captures| {
        if &caps[1] != "ngModel" {
            return String::new();
        }
        match lookup(caps[2].trim(), ctx) {
            Some(value) => format!(" value=\"{}\"", display_value(value).replace('"', "&quot;")),
            None => String::new(),
        }
    });

    let property_re = Regex::new(r#"\s*\[([\w.\-]+)\]="([^"]*)""#).unwrap();
    property_re
        .replace_all(&result, |caps: &Captures| {
            let raw_name = &caps[1];
            let name = raw_name.strip_prefix("attr.").unwrap_or(raw_name);
            if name.contains('.') {
                return String::new();
            }
            let value = resolve_property(name, &caps[2], ctx);
            let rendered = render_attribute(name, &value, AttributePolicy::Preview);
            if rendered.is_empty() {
                String::new()
            } else {
                format!(" {rendered}")
            }
        })
        .to_string()
}

/// 3. `(event)="handler"` → removed.
pub fn strip_event_bindings(markup: &str, _ctx: &BindingContext) -> String {
    let event_re = Regex::new(r#"\s*\([\w.\-]+\)="[^"]*""#).unwrap();
    event_re.replace_all(markup, "").to_string()
}

/// 4. `*ngIf="cond"` → removed, or a forced-hidden style for loading/empty/error branches.
pub fn apply_conditionals(markup: &str, _ctx: &BindingContext) -> String {
    let if_re = Regex::new(r#"\s*\*ngIf="([^"]*)""#).unwrap();
    if_re
        .replace_all(markup, |caps: &Captures| {
            let condition = caps[1].split(';').next().unwrap_or_default();
            if is_fallback_condition(condition) {
                format!(" {HIDDEN_STYLE}")
            } else {
                String::new()
            }
        })
        .to_string()
}

/// Whether an `*ngIf` condition guards a loading, empty, or error branch.
///
/// Keyword matching on the condition text, so the preview favors the
/// populated rendering.
pub fn is_fallback_condition(condition: &str) -> bool {
    let lower = condition.to_lowercase();
    if lower.contains("loading") || lower.contains("error") {
        return true;
    }
    if lower.contains("length === 0") || lower.contains("length == 0") {
        return true;
    }
    let negation_re = Regex::new(r#"!\s*[\w(]"#).unwrap();
    negation_re.is_match(&lower)
        && ["data", "record", "item"].iter().any(|word| lower.contains(word))
}

/// 5. `*ngFor="..."` → removed; the element renders exactly once.
pub fn strip_repeaters(markup: &str, _ctx: &BindingContext) -> String {
    let for_re = Regex::new(r#"\s*\*ngFor="[^"]*""#).unwrap();
    for_re.replace_all(markup, "").to_string()
}

/// 6. `routerLink="/path"` → `href="/path"`.
///
/// A value naming a context key resolves through the context; an array
/// literal (`['/users', id]`) is joined into a path.
pub fn convert_router_links(markup: &str, ctx: &BindingContext) -> String {
    let link_re = Regex::new(r#"\brouterLink="([^"]*)""#).unwrap();
    link_re
        .replace_all(markup, |caps: &Captures| {
            let href = router_href(caps[1].trim(), ctx);
            format!("href=\"{}\"", href.replace('"', "&quot;"))
        })
        .to_string()
}

fn router_href(value: &str, ctx: &BindingContext) -> String {
    if let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        let segments: Vec<String> = inner
            .split(',')
            .map(|segment| {
                let segment = segment.trim();
                if let Some(text) = strip_quotes(segment) {
                    text.to_string()
                } else if let Some(v) = lookup(segment, ctx) {
                    display_value(v)
                } else {
                    segment.to_string()
                }
            })
            .filter(|s| !s.is_empty())
            .collect();
        let joined = segments.join("/");
        let mut path = String::with_capacity(joined.len());
        for ch in joined.chars() {
            if ch == '/' && path.ends_with('/') {
                continue;
            }
            path.push(ch);
        }
        return path;
    }
    match lookup(value, ctx) {
        Some(v) => display_value(v),
        None => value.to_string(),
    }
}
