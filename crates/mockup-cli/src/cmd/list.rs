use anyhow::Result;
use mockup_compiler::{content_field, ComponentRecord, Registry};
use mockup_context::project::MockupProject;

pub fn run(project: &MockupProject) -> Result<()> {
    let registry = Registry::register(project.load_components()?);
    if registry.is_empty() {
        println!("No components found.");
        return Ok(());
    }

    println!("{} component(s):", registry.len());
    for selector in registry.selectors() {
        if let Some(record) = registry.lookup(selector) {
            println!("{}", describe(selector, record));
        }
    }
    Ok(())
}

/// One listing line: selector, declared inputs and outputs, and the field inner text maps to.
fn describe(selector: &str, record: &ComponentRecord) -> String {
    format!(
        "  {selector:<24} inputs: {}  outputs: {}  content: {}",
        join_or_dash(&record.declared_inputs()),
        join_or_dash(&record.declared_outputs()),
        content_field(record)
    )
}

fn join_or_dash(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let record = ComponentRecord {
            markup: "<b>{{ text }}</b>".into(),
            logic_source: "@Input() size: string;\n@Input() text: string;\n@Output() closed = new EventEmitter<void>();".into(),
            ..ComponentRecord::new("app-pill", "")
        };
        assert_eq!(
            describe("app-pill", &record),
            "  app-pill                 inputs: size, text  outputs: closed  content: text"
        );
        assert_eq!(
            describe("app-rule", &ComponentRecord::new("app-rule", "<hr>")),
            "  app-rule                 inputs: -  outputs: -  content: label"
        );
    }
}
