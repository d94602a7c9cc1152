//! Cross-stack import audit.
//!
//! Imports are resolved by the provisioning engine, not here; the audit only
//! reports which imports the permanent stack of the same build would satisfy.

use std::fmt;

use crate::core::value::Value;
use crate::functions::Trigger;
use crate::ops::document::Document;

/// One import found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportUse {
    /// Where the import appears, e.g. `environment.user_pool_id`
    pub location: String,
    pub export_name: String,
    /// Whether the permanent stack exports this name
    pub resolved: bool,
}

impl fmt::Display for ImportUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.resolved { "ok" } else { "unresolved" };
        write!(f, "{:<10} {} <- {}", status, self.export_name, self.location)
    }
}

/// Every import of a document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imports: Vec<ImportUse>,
}

impl ImportReport {
    pub fn unresolved(&self) -> impl Iterator<Item = &ImportUse> {
        self.imports.iter().filter(|i| !i.resolved)
    }
}

/// List every import in the environment, policy, and functions of `doc`.
pub fn audit_imports(doc: &Document) -> ImportReport {
    let mut report = ImportReport::default();
    let mut record = |location: String, value: &Value| {
        let mut names = Vec::new();
        collect_imports(value, &mut names);
        for name in names {
            report.imports.push(ImportUse {
                location: location.clone(),
                export_name: name.to_string(),
                resolved: doc.permanent_stack.export(name).is_some(),
            });
        }
    };

    for (name, value) in doc.environment.iter() {
        record(format!("environment.{}", name), value);
    }

    for (index, statement) in doc.iam.iter().enumerate() {
        for resource in &statement.resources {
            record(format!("iam[{}]", index), resource);
        }
    }

    for entry in doc.functions.iter() {
        for (key, value) in &entry.descriptor.environment {
            record(format!("functions.{}.environment.{}", entry.name, key), value);
        }
        for (index, event) in entry.descriptor.events.iter().enumerate() {
            if let Trigger::Stream(stream) = event {
                record(format!("functions.{}.events[{}]", entry.name, index), &stream.arn);
            }
        }
    }

    report
}

fn collect_imports<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::ImportRef(name) => out.push(name.as_str()),
        Value::Join(parts) => parts.iter().for_each(|p| collect_imports(p, out)),
        _ => {}
    }
}
