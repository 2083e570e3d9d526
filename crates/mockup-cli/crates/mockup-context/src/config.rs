use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File name of the project configuration.
pub const CONFIG_FILE: &str = "mockup.json";

/// Represents the `mockup.json` project configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MockupConfig {
    pub name: String,
    /// Component metadata JSON file, or a directory of `*.component.ts` sources.
    pub components: PathBuf,
    /// Page record JSON file (possibly model-wrapped) or a `*.component.ts` source.
    pub page: PathBuf,
    /// Where `mockup render` writes the preview document.
    pub out: PathBuf,
    /// Register only components upstream marked `required`.
    pub required_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Default for MockupConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            components: PathBuf::from("components.json"),
            page: PathBuf::from("page.json"),
            out: PathBuf::from("dist/preview.html"),
            required_only: false,
            title: None,
        }
    }
}

impl MockupConfig {
    /// Document title: explicit `title`, then `name`, then a generic fallback.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ if !self.name.is_empty() => self.name.as_str(),
            _ => "Mockup Preview",
        }
    }

    pub fn to_json_pretty(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: MockupConfig =
            serde_json::from_str(r#"{"name": "shop", "requiredOnly": true}"#).unwrap();
        assert_eq!(config.name, "shop");
        assert!(config.required_only);
        assert_eq!(config.components, PathBuf::from("components.json"));
        assert_eq!(config.out, PathBuf::from("dist/preview.html"));
        assert_eq!(config.display_title(), "shop");
    }

    #[test]
    fn test_display_title_fallbacks() {
        let mut config = MockupConfig::default();
        assert_eq!(config.display_title(), "Mockup Preview");
        config.title = Some("Checkout".into());
        assert_eq!(config.display_title(), "Checkout");
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = MockupConfig::default().to_json_pretty().unwrap();
        assert!(json.contains("\"requiredOnly\": false"));
        assert!(!json.contains("title"));
    }
}
