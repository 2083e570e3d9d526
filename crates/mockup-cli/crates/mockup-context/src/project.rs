use crate::config::{MockupConfig, CONFIG_FILE};
use anyhow::{bail, Context, Result};
use mockup_compiler::ComponentRecord;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A loaded mockup project: where its inputs live and how to read them.
#[derive(Debug, Clone)]
pub struct MockupProject {
    pub root: PathBuf,
    pub config: MockupConfig,
}

impl MockupProject {
    /// Load a project from the given directory.
    ///
    /// Without a `mockup.json` the default configuration applies.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        let config = if config_path.exists() {
            let raw = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            debug!(dir = %dir.display(), "no {CONFIG_FILE}; using defaults");
            MockupConfig::default()
        };
        Ok(Self {
            root: dir.to_path_buf(),
            config,
        })
    }

    /// Load a project from the current working directory.
    pub fn load_cwd() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::load(&cwd)
    }

    pub fn components_path(&self) -> PathBuf {
        self.root.join(&self.config.components)
    }

    pub fn page_path(&self) -> PathBuf {
        self.root.join(&self.config.page)
    }

    pub fn out_path(&self) -> PathBuf {
        self.root.join(&self.config.out)
    }

    /// Load the component library, honoring `requiredOnly`.
    ///
    /// The components path is either a metadata JSON file (an array of
    /// records, or an object with a `components` array) or a directory that
    /// is searched for `*.component.ts` sources.
    pub fn load_components(&self) -> Result<Vec<ComponentRecord>> {
        let path = self.components_path();
        let records = if path.is_dir() {
            discover_components(&path)?
        } else {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read components from {}", path.display()))?;
            parse_component_list(&raw)
                .with_context(|| format!("Failed to parse components in {}", path.display()))?
        };

        let total = records.len();
        let records: Vec<ComponentRecord> = if self.config.required_only {
            records.into_iter().filter(|r| r.required).collect()
        } else {
            records
        };
        debug!(total, kept = records.len(), "loaded component records");
        Ok(records)
    }

    /// Load the page record: a JSON record (possibly wrapped in a fenced block
    /// or prose) or an Angular `*.component.ts` source with sibling files.
    pub fn load_page(&self) -> Result<ComponentRecord> {
        let path = self.page_path();
        if is_component_source(&path) {
            return read_component_source(&path);
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read page from {}", path.display()))?;
        let Some(json) = extract_json_object(&raw) else {
            bail!("No JSON object found in {}", path.display());
        };
        serde_json::from_str(json)
            .with_context(|| format!("Failed to parse page record in {}", path.display()))
    }

    /// Files whose change should trigger a re-render.
    ///
    /// A page given as `x.component.ts` also brings its template and style siblings.
    pub fn watch_paths(&self) -> Vec<PathBuf> {
        let page = self.page_path();
        let mut paths = vec![self.components_path()];
        if is_component_source(&page) {
            let file_name = page.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            let base_name = file_name.trim_end_matches(".component.ts");
            for ext in ["html", "scss", "css"] {
                paths.push(page.with_file_name(format!("{base_name}.component.{ext}")));
            }
        }
        paths.push(page);
        let config_path = self.root.join(CONFIG_FILE);
        if config_path.exists() {
            paths.push(config_path);
        }
        paths
    }
}

/// Accepts `[record, ...]` or `{"components": [record, ...]}`.
fn parse_component_list(raw: &str) -> Result<Vec<ComponentRecord>> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let list = match value {
        serde_json::Value::Object(mut map) => match map.remove("components") {
            Some(list) => list,
            None => bail!("expected an array of component records or a `components` array"),
        },
        other => other,
    };
    Ok(serde_json::from_value(list)?)
}

/// Find the outermost JSON object in model output: a fenced block, or the
/// span from the first `{` to the last `}`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let fence_re = Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap();
    if let Some(cap) = fence_re.captures(text) {
        return cap.get(1).map(|m| m.as_str());
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Collect every `*.component.ts` under `dir` (spec files excluded), sorted by path.
pub fn discover_components(dir: &Path) -> Result<Vec<ComponentRecord>> {
    let mut sources = Vec::new();
    collect_component_sources(dir, &mut sources)?;
    sources.sort();
    sources.iter().map(|path| read_component_source(path)).collect()
}

fn collect_component_sources(dir: &Path, sources: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            if path.file_name().is_some_and(|n| n == "node_modules") {
                continue;
            }
            collect_component_sources(&path, sources)?;
        } else if is_component_source(&path) {
            sources.push(path);
        }
    }
    Ok(())
}

fn is_component_source(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".component.ts") && !n.contains(".spec."))
}

/// Build a record from `x.component.ts` plus optional `x.component.html` / `x.component.scss`.
fn read_component_source(ts_path: &Path) -> Result<ComponentRecord> {
    let file_name = ts_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let base_name = file_name.trim_end_matches(".component.ts");
    let logic_source = fs::read_to_string(ts_path)
        .with_context(|| format!("Failed to read {}", ts_path.display()))?;
    let sibling = |ext: &str| ts_path.with_file_name(format!("{base_name}.component.{ext}"));
    let markup = read_optional(&sibling("html"))?;
    let style_sheet = match read_optional(&sibling("scss"))? {
        s if s.is_empty() => read_optional(&sibling("css"))?,
        s => s,
    };

    Ok(ComponentRecord {
        name: base_name.to_string(),
        markup,
        style_sheet,
        logic_source,
        ..Default::default()
    })
}

fn read_optional(path: &Path) -> Result<String> {
    if !path.exists() {
        return Ok(String::new());
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
