use chrono::Datelike;
use mockup_parser::{strip_quotes, LiteralValue};
use regex::Regex;
use serde_json::{Map, Value};

/// Attributes whose presence alone carries meaning.
pub const BOOLEAN_ATTRIBUTES: &[&str] = &[
    "disabled", "readonly", "required", "checked", "selected", "hidden",
];

/// Flat name → value mapping that bindings are resolved against.
///
/// Keys are kept exactly as written in the template. Values may be nested
/// objects so that dot paths (`user.name`) can be walked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingContext {
    values: Map<String, Value>,
}

impl BindingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Insert only when `key` is not already present. Returns whether it was inserted.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        let key = key.into();
        if self.values.contains_key(&key) {
            return false;
        }
        self.values.insert(key, value.into());
        true
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Build a context from a JSON object. Non-object values yield an empty context.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(values) => Self { values },
            _ => Self::default(),
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

impl FromIterator<(String, Value)> for BindingContext {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut ctx = BindingContext::new();
        for (key, value) in iter {
            ctx.insert_if_absent(key, value);
        }
        ctx
    }
}

/// The value a binding expression resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    Text(String),
    Bool(bool),
    Number(f64),
}

impl ResolvedValue {
    /// Render as text: booleans become `"true"`/`"false"`, integral numbers drop the fraction.
    pub fn display(&self) -> String {
        match self {
            ResolvedValue::Text(s) => s.clone(),
            ResolvedValue::Bool(b) => b.to_string(),
            ResolvedValue::Number(n) => format_number(*n),
        }
    }

    pub fn into_json(self) -> Value {
        match self {
            ResolvedValue::Text(s) => Value::String(s),
            ResolvedValue::Bool(b) => Value::Bool(b),
            ResolvedValue::Number(n) => number_to_json(n),
        }
    }

    fn is_truthy(&self) -> bool {
        match self {
            ResolvedValue::Text(s) => !s.is_empty() && s != "false",
            ResolvedValue::Bool(b) => *b,
            ResolvedValue::Number(n) => *n != 0.0,
        }
    }
}

impl From<&Value> for ResolvedValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Bool(b) => ResolvedValue::Bool(*b),
            Value::Number(n) => ResolvedValue::Number(n.as_f64().unwrap_or_default()),
            _ => ResolvedValue::Text(display_value(value)),
        }
    }
}

impl From<LiteralValue> for ResolvedValue {
    fn from(value: LiteralValue) -> Self {
        match value {
            LiteralValue::Text(s) => ResolvedValue::Text(s),
            LiteralValue::Bool(b) => ResolvedValue::Bool(b),
            LiteralValue::Number(n) => ResolvedValue::Number(n),
        }
    }
}

/// How attribute bindings are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributePolicy {
    /// Preview rendering: `disabled` bindings are always dropped so controls stay clickable.
    Preview,
    /// Plain boolean-attribute rules with no preview overrides.
    Faithful,
}

pub fn is_boolean_attribute(name: &str) -> bool {
    BOOLEAN_ATTRIBUTES.contains(&name)
}

/// Resolve a single binding written in template syntax.
///
/// Accepts `{{ expr }}` (interpolation) or `[name]="expr"` (property binding).
/// Anything else comes back as trimmed literal text.
pub fn resolve(expression: &str, ctx: &BindingContext) -> ResolvedValue {
    let expression = expression.trim();
    if let Some(inner) = expression
        .strip_prefix("{{")
        .and_then(|rest| rest.strip_suffix("}}"))
    {
        return ResolvedValue::Text(resolve_interpolation(inner, ctx));
    }

    let property_re = Regex::new(r#"^\[([\w.\-]+)\]\s*=\s*"([^"]*)"$"#).unwrap();
    if let Some(cap) = property_re.captures(expression) {
        return resolve_property(&cap[1], &cap[2], ctx);
    }

    ResolvedValue::Text(expression.to_string())
}

/// Resolve the expression inside `{{ ... }}` to display text. Never fails:
/// unresolvable expressions come back as a readable placeholder.
pub fn resolve_interpolation(expr: &str, ctx: &BindingContext) -> String {
    let expr = strip_pipes(expr.trim());

    if let Some(value) = ctx.get(expr) {
        return display_value(value);
    }
    if is_current_year(expr) {
        return chrono::Local::now().year().to_string();
    }
    if let Some(inner) = strip_quotes(expr) {
        return inner.to_string();
    }
    if expr.parse::<f64>().is_ok() {
        return expr.to_string();
    }
    if expr.contains('.') {
        return match lookup_path(expr, ctx) {
            Some(value) => display_value(value),
            None => last_segment(expr).to_string(),
        };
    }
    expr.to_string()
}

/// Resolve the right-hand side of a `[name]="expr"` binding.
pub fn resolve_property(name: &str, expr: &str, ctx: &BindingContext) -> ResolvedValue {
    let expr = expr.trim();

    if name == "class" || name == "className" {
        return ResolvedValue::Text(concat_class(expr, ctx));
    }
    if let Some(inner) = strip_quotes(expr) {
        return ResolvedValue::Text(inner.to_string());
    }
    match expr {
        "true" => return ResolvedValue::Bool(true),
        "false" => return ResolvedValue::Bool(false),
        _ => {}
    }
    if let Some(value) = lookup(expr, ctx) {
        return ResolvedValue::from(value);
    }
    if is_boolean_attribute(name) {
        return ResolvedValue::Bool(false);
    }
    ResolvedValue::Text(expr.to_string())
}

/// Render a resolved binding as attribute text (without leading whitespace).
///
/// Returns an empty string when the attribute should be removed.
pub fn render_attribute(name: &str, value: &ResolvedValue, policy: AttributePolicy) -> String {
    if policy == AttributePolicy::Preview && name == "disabled" {
        return String::new();
    }
    if is_boolean_attribute(name) {
        return if value.is_truthy() {
            name.to_string()
        } else {
            String::new()
        };
    }
    format!("{}=\"{}\"", name, escape_attribute(&value.display()))
}

/// `'btn btn-' + variant` → `btn btn-primary`
fn concat_class(expr: &str, ctx: &BindingContext) -> String {
    expr.split('+')
        .map(|token| {
            let token = token.trim();
            if let Some(inner) = strip_quotes(token) {
                inner.to_string()
            } else if let Some(value) = lookup(token, ctx) {
                display_value(value)
            } else {
                token.to_string()
            }
        })
        .collect()
}

/// Direct key first, then a fully resolved dot path.
pub(crate) fn lookup<'a>(expr: &str, ctx: &'a BindingContext) -> Option<&'a Value> {
    ctx.get(expr).or_else(|| {
        if expr.contains('.') {
            lookup_path(expr, ctx)
        } else {
            None
        }
    })
}

fn lookup_path<'a>(expr: &str, ctx: &'a BindingContext) -> Option<&'a Value> {
    let normalized = expr.replace("?.", ".").replace("!.", ".");
    let mut segments = normalized.split('.').map(str::trim);
    let mut current = ctx.get(segments.next()?)?;
    for segment in segments {
        current = current.get(segment)?;
    }
    Some(current)
}

fn last_segment(expr: &str) -> &str {
    expr.rsplit('.')
        .next()
        .map(|s| s.trim().trim_end_matches(['!', '?']))
        .unwrap_or(expr)
}

/// `value | date:'short'` → `value`. Logical `||` is left alone.
fn strip_pipes(expr: &str) -> &str {
    let bytes = expr.as_bytes();
    for i in 0..bytes.len() {
        if bytes[i] != b'|' {
            continue;
        }
        let prev = i > 0 && bytes[i - 1] == b'|';
        let next = i + 1 < bytes.len() && bytes[i + 1] == b'|';
        if !prev && !next {
            return expr[..i].trim();
        }
    }
    expr
}

fn is_current_year(expr: &str) -> bool {
    let re = Regex::new(r#"^new\s+Date\s*\(\s*\)\s*\.\s*getFullYear\s*\(\s*\)$"#).unwrap();
    re.is_match(expr)
}

/// Display text for a context value.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format_number(f),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

pub(crate) fn number_to_json(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

fn escape_attribute(text: &str) -> String {
    text.replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(value: Value) -> BindingContext {
        BindingContext::from_json(value)
    }

    #[test]
    fn test_interpolation_direct_key() {
        let c = ctx(json!({"label": "Save", "active": true, "count": 3}));
        assert_eq!(resolve_interpolation(" label ", &c), "Save");
        assert_eq!(resolve_interpolation("active", &c), "true");
        assert_eq!(resolve_interpolation("count", &c), "3");
    }

    #[test]
    fn test_interpolation_dot_path() {
        let c = ctx(json!({"user": {"profile": {"name": "Alice"}}}));
        assert_eq!(resolve_interpolation("user.profile.name", &c), "Alice");
        assert_eq!(resolve_interpolation("user?.profile?.name", &c), "Alice");
    }

    #[test]
    fn test_interpolation_unresolved_path_uses_last_segment() {
        let c = BindingContext::new();
        assert_eq!(resolve_interpolation("order.customer.email", &c), "email");
        assert_eq!(resolve_interpolation("user.name!", &c), "name");
    }

    #[test]
    fn test_interpolation_current_year() {
        let year = chrono::Local::now().year().to_string();
        assert_eq!(
            resolve_interpolation("new Date().getFullYear()", &BindingContext::new()),
            year
        );
    }

    #[test]
    fn test_interpolation_placeholder_and_literals() {
        let c = BindingContext::new();
        assert_eq!(resolve_interpolation("  pageTitle  ", &c), "pageTitle");
        assert_eq!(resolve_interpolation("'v1.2'", &c), "v1.2");
        assert_eq!(resolve_interpolation("4.5", &c), "4.5");
    }

    #[test]
    fn test_interpolation_strips_pipes() {
        let c = ctx(json!({"price": 12}));
        assert_eq!(resolve_interpolation("price | currency:'USD'", &c), "12");
        assert_eq!(resolve_interpolation("a || b", &c), "a || b");
    }

    #[test]
    fn test_property_literals_and_lookup() {
        let c = ctx(json!({"size": "lg", "open": false}));
        assert_eq!(
            resolve_property("label", "'Save'", &c),
            ResolvedValue::Text("Save".into())
        );
        assert_eq!(resolve_property("checked", "true", &c), ResolvedValue::Bool(true));
        assert_eq!(resolve_property("size", "size", &c), ResolvedValue::Text("lg".into()));
        assert_eq!(resolve_property("hidden", "open", &c), ResolvedValue::Bool(false));
    }

    #[test]
    fn test_property_unresolved_fallbacks() {
        let c = BindingContext::new();
        assert_eq!(resolve_property("readonly", "isLocked", &c), ResolvedValue::Bool(false));
        assert_eq!(
            resolve_property("items", "rows", &c),
            ResolvedValue::Text("rows".into())
        );
    }

    #[test]
    fn test_class_concatenation() {
        let c = ctx(json!({"variant": "primary"}));
        assert_eq!(
            resolve_property("class", "'btn btn-' + variant", &c),
            ResolvedValue::Text("btn btn-primary".into())
        );
        assert_eq!(
            resolve_property("class", "'card ' + tone", &BindingContext::new()),
            ResolvedValue::Text("card tone".into())
        );
    }

    #[test]
    fn test_render_boolean_attributes() {
        let on = ResolvedValue::Bool(true);
        let off = ResolvedValue::Bool(false);
        assert_eq!(render_attribute("disabled", &on, AttributePolicy::Faithful), "disabled");
        assert_eq!(render_attribute("disabled", &on, AttributePolicy::Preview), "");
        assert_eq!(render_attribute("checked", &on, AttributePolicy::Preview), "checked");
        assert_eq!(render_attribute("checked", &off, AttributePolicy::Preview), "");
        assert_eq!(
            render_attribute("required", &ResolvedValue::Text("false".into()), AttributePolicy::Faithful),
            ""
        );
    }

    #[test]
    fn test_render_plain_attribute() {
        let value = ResolvedValue::Text("say \"hi\"".into());
        assert_eq!(
            render_attribute("title", &value, AttributePolicy::Preview),
            "title=\"say &quot;hi&quot;\""
        );
        assert_eq!(
            render_attribute("aria-expanded", &ResolvedValue::Bool(false), AttributePolicy::Preview),
            "aria-expanded=\"false\""
        );
    }

    #[test]
    fn test_resolve_dispatch() {
        let c = ctx(json!({"name": "Bob"}));
        assert_eq!(resolve("{{ name }}", &c), ResolvedValue::Text("Bob".into()));
        assert_eq!(resolve(r#"[disabled]="true""#, &c), ResolvedValue::Bool(true));
        assert_eq!(resolve("plain", &c), ResolvedValue::Text("plain".into()));
    }

    #[test]
    fn test_insert_if_absent_keeps_first() {
        let mut c = BindingContext::new();
        assert!(c.insert_if_absent("label", "first"));
        assert!(!c.insert_if_absent("label", "second"));
        assert_eq!(c.get("label"), Some(&json!("first")));
    }
}
