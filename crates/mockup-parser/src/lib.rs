use regex::Regex;

/// A literal initial value found on a class field, e.g. `title = 'Dashboard';`.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

/// Convert PascalCase to kebab-case: `UserCard` → `user-card`
pub fn pascal_to_kebab(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 && !result.ends_with('-') {
                result.push('-');
            }
            result.extend(ch.to_lowercase());
        } else if ch == ' ' || ch == '_' {
            if !result.ends_with('-') {
                result.push('-');
            }
        } else {
            result.push(ch);
        }
    }
    result
}

/// Derive a tag name from a component's logical name.
///
/// Strips the conventional `Component` suffix, then lowercases into kebab-case:
/// `AppButtonComponent` → `app-button`.
pub fn normalize_selector(name: &str) -> String {
    let trimmed = name.trim();
    let base = trimmed.strip_suffix("Component").unwrap_or(trimmed);
    let base = if base.is_empty() { trimmed } else { base };
    pascal_to_kebab(base)
}

/// Find `selector: 'app-foo'` inside a component annotation.
///
/// Only the first selector of a comma-separated list is returned, and
/// attribute selectors (`[appFoo]`) are ignored.
pub fn parse_selector(logic: &str) -> Option<String> {
    let re = Regex::new(r#"selector\s*:\s*['"`]([^'"`]+)['"`]"#).unwrap();
    let cap = re.captures(logic)?;
    let first = cap[1].split(',').next()?.trim();
    if first.is_empty() || first.starts_with('[') || first.starts_with('.') {
        return None;
    }
    Some(first.to_string())
}

/// Parse input field names from a logic source, in declaration order.
///
/// Recognizes decorator inputs (`@Input() label: string;`, `@Input('alias') set value(v)`)
/// and signal inputs (`label = input<string>()`, `id = input.required<number>()`).
pub fn parse_inputs(logic: &str) -> Vec<String> {
    let decorator_re =
        Regex::new(r#"@Input\s*\([^)]*\)\s*(?:(?:public|private|protected|readonly)\s+)*(?:set\s+)?([A-Za-z_$][\w$]*)"#)
            .unwrap();
    let signal_re =
        Regex::new(r#"(?m)^\s*(?:(?:public|private|protected|readonly)\s+)*([A-Za-z_$][\w$]*)\s*=\s*input(?:\.required)?\s*[<(]"#)
            .unwrap();
    collect_in_order(logic, &[&decorator_re, &signal_re])
}

/// Parse output field names (`@Output() clicked = new EventEmitter<void>();`, `closed = output()`).
pub fn parse_outputs(logic: &str) -> Vec<String> {
    let decorator_re =
        Regex::new(r#"@Output\s*\([^)]*\)\s*(?:(?:public|private|protected|readonly)\s+)*([A-Za-z_$][\w$]*)"#)
            .unwrap();
    let signal_re =
        Regex::new(r#"(?m)^\s*(?:(?:public|private|protected|readonly)\s+)*([A-Za-z_$][\w$]*)\s*=\s*output\s*[<(]"#)
            .unwrap();
    collect_in_order(logic, &[&decorator_re, &signal_re])
}

/// Run several single-capture regexes and merge their hits by source position.
fn collect_in_order(source: &str, patterns: &[&Regex]) -> Vec<String> {
    let mut hits: Vec<(usize, String)> = Vec::new();
    for re in patterns {
        for m in re.captures_iter(source).filter_map(|cap| cap.get(1)) {
            hits.push((m.start(), m.as_str().to_string()));
        }
    }
    hits.sort_by_key(|(pos, _)| *pos);

    let mut names: Vec<String> = Vec::new();
    for (_, name) in hits {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Collect the root identifiers referenced by `{{ expr }}` interpolations.
///
/// `{{ user.name }}` contributes `user`; `{{ label | uppercase }}` contributes `label`.
/// Returned in first-seen order without duplicates.
pub fn interpolation_refs(markup: &str) -> Vec<String> {
    let interp_re = Regex::new(r#"\{\{([^}]*)\}\}"#).unwrap();
    let ident_re = Regex::new(r#"^[!\s(]*([A-Za-z_$][\w$]*)"#).unwrap();
    let mut refs: Vec<String> = Vec::new();
    for cap in interp_re.captures_iter(markup) {
        let Some(ident) = ident_re.captures(cap[1].trim()) else {
            continue;
        };
        let name = ident[1].to_string();
        if !refs.contains(&name) {
            refs.push(name);
        }
    }
    refs
}

/// Extract literal initial values from class fields and `this.x = ...` assignments.
///
/// Class field declarations win over later assignments. Non-literal initializers
/// (arrays, objects, calls) are skipped.
pub fn extract_field_defaults(logic: &str) -> Vec<(String, LiteralValue)> {
    let field_re = Regex::new(
        r#"(?m)^[ \t]*(?:(?:public|private|protected|readonly|static)\s+)*([A-Za-z_$][\w$]*)[?!]?\s*(?::\s*[^=;\n]+?)?\s*=\s*([^;\n]+?)\s*;?[ \t]*$"#,
    )
    .unwrap();
    let assign_re =
        Regex::new(r#"this\.([A-Za-z_$][\w$]*)\s*=\s*([^;\n]+?)\s*;?[ \t]*$"#).unwrap();
    let mut defaults: Vec<(String, LiteralValue)> = Vec::new();

    let mut push = |name: &str, raw: &str| {
        if matches!(name, "const" | "let" | "var" | "return" | "this") {
            return;
        }
        if defaults.iter().any(|(n, _)| n == name) {
            return;
        }
        if let Some(value) = parse_literal(raw) {
            defaults.push((name.to_string(), value));
        }
    };

    for cap in field_re.captures_iter(logic) {
        push(&cap[1], &cap[2]);
    }
    for line in logic.lines() {
        if let Some(cap) = assign_re.captures(line) {
            push(&cap[1], &cap[2]);
        }
    }
    defaults
}

/// Parse a JS literal: quoted string (no template substitutions), number, or boolean.
pub fn parse_literal(raw: &str) -> Option<LiteralValue> {
    let raw = raw.trim();
    if raw == "true" {
        return Some(LiteralValue::Bool(true));
    }
    if raw == "false" {
        return Some(LiteralValue::Bool(false));
    }
    if let Some(inner) = strip_quotes(raw) {
        if raw.starts_with('`') && inner.contains("${") {
            return None;
        }
        return Some(LiteralValue::Text(inner.to_string()));
    }
    raw.parse::<f64>().ok().map(LiteralValue::Number)
}

/// Return the inner text of a `'...'`, `"..."` or `` `...` `` literal.
pub fn strip_quotes(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    if raw.len() < 2 {
        return None;
    }
    let first = raw.chars().next()?;
    if !matches!(first, '\'' | '"' | '`') || !raw.ends_with(first) {
        return None;
    }
    let inner = &raw[1..raw.len() - 1];
    if inner.contains(first) {
        return None;
    }
    Some(inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUTTON_TS: &str = r#"
import { Component, Input, Output, EventEmitter } from '@angular/core';

@Component({
  selector: 'app-button',
  templateUrl: './app-button.component.html',
  styleUrls: ['./app-button.component.scss']
})
export class AppButtonComponent {
  @Input() label: string = 'Button';
  @Input() variant: 'primary' | 'secondary' = 'primary';
  @Input('iconName') icon?: string;
  @Output() clicked = new EventEmitter<void>();
}
"#;

    #[test]
    fn test_pascal_to_kebab() {
        assert_eq!(pascal_to_kebab("UserCard"), "user-card");
        assert_eq!(pascal_to_kebab("AppButton"), "app-button");
        assert_eq!(pascal_to_kebab("header"), "header");
        assert_eq!(pascal_to_kebab("Data Table"), "data-table");
    }

    #[test]
    fn test_normalize_selector() {
        assert_eq!(normalize_selector("AppButtonComponent"), "app-button");
        assert_eq!(normalize_selector("Footer"), "footer");
        assert_eq!(normalize_selector("Component"), "component");
    }

    #[test]
    fn test_parse_selector() {
        assert_eq!(parse_selector(BUTTON_TS).as_deref(), Some("app-button"));
        assert_eq!(parse_selector("selector: \"app-a, app-b\""), Some("app-a".into()));
        assert_eq!(parse_selector("selector: '[appTooltip]'"), None);
        assert_eq!(parse_selector("export class Foo {}"), None);
    }

    #[test]
    fn test_parse_inputs_decorators() {
        assert_eq!(parse_inputs(BUTTON_TS), vec!["label", "variant", "icon"]);
    }

    #[test]
    fn test_parse_inputs_signals_and_setters() {
        let ts = r#"
export class CardComponent {
  title = input<string>('');
  id = input.required<number>();
  @Input() set value(v: string) { this._v = v; }
}
"#;
        assert_eq!(parse_inputs(ts), vec!["title", "id", "value"]);
    }

    #[test]
    fn test_parse_outputs() {
        let ts = r#"
  @Output() clicked = new EventEmitter<void>();
  closed = output<boolean>();
"#;
        assert_eq!(parse_outputs(ts), vec!["clicked", "closed"]);
        assert_eq!(parse_outputs(BUTTON_TS), vec!["clicked"]);
    }

    #[test]
    fn test_interpolation_refs() {
        let html = r#"<button>{{ label }}</button><i>{{ icon }}</i><p>{{ user.name }} {{ label | uppercase }}</p>"#;
        assert_eq!(interpolation_refs(html), vec!["label", "icon", "user"]);
    }

    #[test]
    fn test_interpolation_refs_negation() {
        assert_eq!(interpolation_refs("{{ !open }}"), vec!["open"]);
        assert!(interpolation_refs("{{ 'literal' }}").is_empty());
    }

    #[test]
    fn test_extract_field_defaults() {
        let ts = r#"
export class DashboardComponent implements OnInit {
  title = 'Dashboard';
  count: number = 3;
  private open = false;
  users: User[] = [];
  ngOnInit(): void {
    this.subtitle = "Overview";
    this.title = 'Ignored';
  }
}
"#;
        let defaults = extract_field_defaults(ts);
        assert_eq!(
            defaults,
            vec![
                ("title".to_string(), LiteralValue::Text("Dashboard".into())),
                ("count".to_string(), LiteralValue::Number(3.0)),
                ("open".to_string(), LiteralValue::Bool(false)),
                ("subtitle".to_string(), LiteralValue::Text("Overview".into())),
            ]
        );
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(parse_literal("'hi'"), Some(LiteralValue::Text("hi".into())));
        assert_eq!(parse_literal("`x`"), Some(LiteralValue::Text("x".into())));
        assert_eq!(parse_literal("`${a}`"), None);
        assert_eq!(parse_literal("42"), Some(LiteralValue::Number(42.0)));
        assert_eq!(parse_literal("true"), Some(LiteralValue::Bool(true)));
        assert_eq!(parse_literal("[]"), None);
        assert_eq!(parse_literal("'a' + b"), None);
    }
}
