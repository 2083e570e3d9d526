//! Which input field receives a component instance's plain inner text.
//!
//! `<app-button>Save</app-button>` has no attribute naming the field that
//! should hold "Save", so the field is guessed from the component's declared
//! inputs and the names its own template interpolates. The tiers run in
//! order and the first hit wins.

use mockup_parser::interpolation_refs;

use crate::registry::ComponentRecord;

/// Input names that conventionally carry a component's visible content.
pub const CONTENT_FIELD_NAMES: &[&str] = &["label", "text", "content", "title", "value", "name"];

/// Field used when a component declares no inputs at all.
pub const DEFAULT_CONTENT_FIELD: &str = "label";

/// What a strategy gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct FieldCandidates<'a> {
    /// Declared input fields, in declaration order.
    pub inputs: &'a [String],
    /// Root names interpolated by the component's own template.
    pub referenced: &'a [String],
}

pub type Strategy = fn(&FieldCandidates) -> Option<String>;

/// Strategy tiers, in priority order.
pub const STRATEGIES: [(&str, Strategy); 4] = [
    ("conventional-name", conventional_name),
    ("template-usage", template_usage),
    ("first-declared", first_declared),
    ("fixed-default", fixed_default),
];

/// Pick the field for inner text content.
pub fn infer_content_field(inputs: &[String], referenced: &[String]) -> String {
    let candidates = FieldCandidates { inputs, referenced };
    STRATEGIES
        .iter()
        .find_map(|(_, strategy)| strategy(&candidates))
        .unwrap_or_else(|| DEFAULT_CONTENT_FIELD.to_string())
}

/// Content field for a registered component.
pub fn content_field(record: &ComponentRecord) -> String {
    let inputs = record.declared_inputs();
    let referenced = interpolation_refs(&record.markup);
    infer_content_field(&inputs, &referenced)
}

/// First declared input with a conventional content name that the template also uses.
pub fn conventional_name(c: &FieldCandidates) -> Option<String> {
    c.inputs
        .iter()
        .find(|input| CONTENT_FIELD_NAMES.contains(&input.as_str()) && c.referenced.contains(input))
        .cloned()
}

/// First declared input the template uses.
pub fn template_usage(c: &FieldCandidates) -> Option<String> {
    c.inputs.iter().find(|input| c.referenced.contains(input)).cloned()
}

pub fn first_declared(c: &FieldCandidates) -> Option<String> {
    c.inputs.first().cloned()
}

pub fn fixed_default(_c: &FieldCandidates) -> Option<String> {
    Some(DEFAULT_CONTENT_FIELD.to_string())
}
