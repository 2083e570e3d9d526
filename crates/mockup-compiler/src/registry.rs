use std::collections::HashMap;

use mockup_parser::{normalize_selector, parse_inputs, parse_outputs, parse_selector};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One reusable UI component (or the page itself) as handed over by upstream metadata.
///
/// Accepts both its own field names and the upstream metadata shape
/// (`id_name`, `html_code`, `scss_code`, `ts_code`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComponentRecord {
    /// Logical (class) name, e.g. `AppButtonComponent`.
    #[serde(alias = "component_name")]
    pub name: String,
    /// Tag name used in templates, e.g. `app-button`.
    #[serde(alias = "id_name", skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(alias = "html_code", alias = "template")]
    pub markup: String,
    #[serde(alias = "scss_code", alias = "style_sheet")]
    pub style_sheet: String,
    #[serde(alias = "ts_code", alias = "logic_source")]
    pub logic_source: String,
    /// Declared input fields. Parsed from `logic_source` when empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<String>,
    /// Declared output fields. Parsed from `logic_source` when empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,
    /// Marked as selected for the current page by upstream.
    pub required: bool,
}

impl ComponentRecord {
    pub fn new(selector: &str, markup: &str) -> Self {
        Self {
            selector: Some(selector.to_string()),
            markup: markup.to_string(),
            ..Self::default()
        }
    }

    /// The tag name this record answers to.
    ///
    /// Explicit selector, then the `selector:` entry in the logic source, then
    /// the normalized logical name.
    pub fn tag_name(&self) -> String {
        if let Some(selector) = self.selector.as_deref().map(str::trim) {
            if !selector.is_empty() {
                return selector.to_string();
            }
        }
        if let Some(selector) = parse_selector(&self.logic_source) {
            return selector;
        }
        normalize_selector(&self.name)
    }

    pub fn declared_inputs(&self) -> Vec<String> {
        if self.inputs.is_empty() {
            parse_inputs(&self.logic_source)
        } else {
            self.inputs.clone()
        }
    }

    pub fn declared_outputs(&self) -> Vec<String> {
        if self.outputs.is_empty() {
            parse_outputs(&self.logic_source)
        } else {
            self.outputs.clone()
        }
    }
}

/// Component records indexed by tag name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    components: HashMap<String, ComponentRecord>,
    order: Vec<String>,
}

impl Registry {
    /// Index records by tag name. The first record for a tag name wins.
    pub fn register(records: impl IntoIterator<Item = ComponentRecord>) -> Self {
        let mut registry = Self::default();
        for record in records {
            registry.insert(record);
        }
        registry
    }

    /// Add one record. Returns `false` if it had no usable tag name or the tag was taken.
    pub fn insert(&mut self, record: ComponentRecord) -> bool {
        let tag = record.tag_name();
        if tag.is_empty() {
            warn!(name = %record.name, "skipping component without a selector");
            return false;
        }
        if self.components.contains_key(&tag) {
            warn!(selector = %tag, "duplicate component selector ignored");
            return false;
        }
        self.order.push(tag.clone());
        self.components.insert(tag, record);
        true
    }

    pub fn lookup(&self, selector: &str) -> Option<&ComponentRecord> {
        self.components.get(selector)
    }

    pub fn contains(&self, selector: &str) -> bool {
        self.components.contains_key(selector)
    }

    /// Registered tag names in registration order.
    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_name_priority() {
        let explicit = ComponentRecord {
            name: "AppButtonComponent".into(),
            selector: Some("ui-button".into()),
            logic_source: "@Component({ selector: 'app-button' })".into(),
            ..Default::default()
        };
        assert_eq!(explicit.tag_name(), "ui-button");

        let from_logic = ComponentRecord {
            selector: None,
            ..explicit.clone()
        };
        assert_eq!(from_logic.tag_name(), "app-button");

        let from_name = ComponentRecord {
            name: "UserCardComponent".into(),
            ..Default::default()
        };
        assert_eq!(from_name.tag_name(), "user-card");
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = Registry::register(vec![
            ComponentRecord::new("app-header", "<header></header>"),
            ComponentRecord::new("app-footer", "<footer></footer>"),
        ]);
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.lookup("app-footer").map(|r| r.markup.as_str()),
            Some("<footer></footer>")
        );
        assert!(registry.lookup("app-sidebar").is_none());
        assert_eq!(registry.selectors().collect::<Vec<_>>(), vec!["app-header", "app-footer"]);
    }

    #[test]
    fn test_duplicate_selector_keeps_first() {
        let registry = Registry::register(vec![
            ComponentRecord::new("app-x", "first"),
            ComponentRecord::new("app-x", "second"),
        ]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("app-x").unwrap().markup, "first");
    }

    #[test]
    fn test_deserialize_upstream_metadata_shape() {
        let json = r#"{
            "name": "AppButtonComponent",
            "description": "A button",
            "id_name": "app-button",
            "html_code": "<button>{{ label }}</button>",
            "scss_code": "button { color: red; }",
            "ts_code": "export class AppButtonComponent { @Input() label: string; }",
            "required": true,
            "reasoning": ""
        }"#;
        let record: ComponentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.tag_name(), "app-button");
        assert_eq!(record.markup, "<button>{{ label }}</button>");
        assert_eq!(record.style_sheet, "button { color: red; }");
        assert!(record.required);
        assert_eq!(record.declared_inputs(), vec!["label"]);
    }

    #[test]
    fn test_deserialize_null_id_name() {
        let json = r#"{"name": "FooterComponent", "id_name": null}"#;
        let record: ComponentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.tag_name(), "footer");
    }

    #[test]
    fn test_explicit_inputs_win() {
        let record = ComponentRecord {
            inputs: vec!["text".into()],
            logic_source: "@Input() label: string;".into(),
            ..Default::default()
        };
        assert_eq!(record.declared_inputs(), vec!["text"]);
    }
}
