//! Stack descriptors.
//!
//! A [`Stack`] is an ordered collection of resources and exported outputs.
//! Resources reference each other structurally inside one stack; values
//! crossing a stack boundary always go through an output's export name.

pub mod exports;
pub mod permanent;
pub mod resource;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::core::error::{ComposeError, Result};
use crate::core::naming::Identifier;
use crate::core::value::Value;

pub use permanent::permanent_stack;
pub use resource::{ResourceDescriptor, ResourceKind};

/// An exported value of a stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    logical_id: String,
    description: String,
    value: Value,
    export_name: Identifier,
}

impl Output {
    pub fn new(
        logical_id: impl Into<String>,
        description: impl Into<String>,
        value: Value,
        export_name: Identifier,
    ) -> Self {
        Output {
            logical_id: logical_id.into(),
            description: description.into(),
            value,
            export_name,
        }
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn export_name(&self) -> &Identifier {
        &self.export_name
    }
}

impl Serialize for Output {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("Description", &self.description)?;
        map.serialize_entry("Value", &self.value)?;
        map.serialize_entry("Export", &ExportName(&self.export_name))?;
        map.end()
    }
}

struct ExportName<'a>(&'a Identifier);

impl Serialize for ExportName<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("Name", self.0)?;
        map.end()
    }
}

/// An ordered set of resources and outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Stack {
    name: String,
    resources: Vec<ResourceDescriptor>,
    outputs: Vec<Output>,
}

impl Stack {
    /// Create an empty stack.
    pub fn new(name: impl Into<String>) -> Self {
        Stack {
            name: name.into(),
            resources: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a resource. Logical ids are unique within the stack.
    pub fn add_resource(&mut self, resource: ResourceDescriptor) -> Result<()> {
        if self.resource(resource.logical_id()).is_some() {
            return Err(ComposeError::DuplicateResource {
                stack: self.name.clone(),
                logical_id: resource.logical_id().to_string(),
            });
        }
        self.resources.push(resource);
        Ok(())
    }

    /// Add an output. Export names are unique, since imports are a plain
    /// name lookup with no versioning.
    pub fn add_output(&mut self, output: Output) -> Result<()> {
        if let Some(existing) = self
            .outputs
            .iter()
            .find(|o| o.export_name == output.export_name)
        {
            return Err(ComposeError::DuplicateExportName {
                name: output.export_name.to_string(),
                first: existing.logical_id.clone(),
                second: output.logical_id,
            });
        }
        if self.outputs.iter().any(|o| o.logical_id == output.logical_id) {
            return Err(ComposeError::DuplicateResource {
                stack: self.name.clone(),
                logical_id: output.logical_id,
            });
        }
        self.outputs.push(output);
        Ok(())
    }

    /// Check that every structural reference targets a resource of this stack.
    pub fn validate(&self) -> Result<()> {
        for resource in &self.resources {
            for target in resource.references() {
                self.require_resource(resource.logical_id(), target)?;
            }
        }

        for output in &self.outputs {
            let mut targets = Vec::new();
            output.value.structural_targets(&mut targets);
            for target in targets {
                self.require_resource(&output.logical_id, target)?;
            }
        }

        Ok(())
    }

    fn require_resource(&self, from: &str, target: &str) -> Result<()> {
        if self.resource(target).is_none() {
            return Err(ComposeError::UnknownResource {
                stack: self.name.clone(),
                from: from.to_string(),
                target: target.to_string(),
            });
        }
        Ok(())
    }

    /// Find a resource by logical id.
    pub fn resource(&self, logical_id: &str) -> Option<&ResourceDescriptor> {
        self.resources.iter().find(|r| r.logical_id() == logical_id)
    }

    pub fn resources(&self) -> &[ResourceDescriptor] {
        &self.resources
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Find an output by export name.
    pub fn export(&self, export_name: &str) -> Option<&Output> {
        self.outputs
            .iter()
            .find(|o| o.export_name.as_str() == export_name)
    }
}

impl Serialize for Stack {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("Resources", &Entries(&self.resources, ResourceDescriptor::logical_id))?;
        map.serialize_entry("Outputs", &Entries(&self.outputs, Output::logical_id))?;
        map.end()
    }
}

/// Serializes a slice as a map keyed by logical id, keeping slice order.
struct Entries<'a, T>(&'a [T], fn(&T) -> &str);

impl<T: Serialize> Serialize for Entries<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for item in self.0 {
            map.serialize_entry((self.1)(item), item)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::naming::qualify;
    use serde_json::json;

    fn pool() -> ResourceDescriptor {
        ResourceDescriptor::new("CognitoUserPool", ResourceKind::IdentityPool, json!({}))
    }

    #[test]
    fn test_duplicate_export_name() {
        let mut stack = Stack::new("permanent");
        stack.add_resource(pool()).unwrap();

        let name = qualify("svc-dev", ["UserPoolId"]).unwrap();
        stack
            .add_output(Output::new("UserPoolId", "", Value::reference("CognitoUserPool"), name.clone()))
            .unwrap();

        let err = stack
            .add_output(Output::new("PoolAlias", "", Value::reference("CognitoUserPool"), name))
            .unwrap_err();
        assert_eq!(
            err,
            ComposeError::DuplicateExportName {
                name: "svc-dev-UserPoolId".to_string(),
                first: "UserPoolId".to_string(),
                second: "PoolAlias".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_resource() {
        let mut stack = Stack::new("permanent");
        stack.add_resource(pool()).unwrap();
        assert!(matches!(
            stack.add_resource(pool()),
            Err(ComposeError::DuplicateResource { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_dangling_reference() {
        let mut stack = Stack::new("permanent");
        stack
            .add_resource(ResourceDescriptor::new(
                "AdminUserGroup",
                ResourceKind::IdentityPoolGroup,
                json!({ "UserPoolId": Value::reference("CognitoUserPool") }),
            ))
            .unwrap();

        assert_eq!(
            stack.validate(),
            Err(ComposeError::UnknownResource {
                stack: "permanent".to_string(),
                from: "AdminUserGroup".to_string(),
                target: "CognitoUserPool".to_string(),
            })
        );

        stack.add_resource(pool()).unwrap();
        assert!(stack.validate().is_ok());
    }

    #[test]
    fn test_validate_checks_outputs() {
        let mut stack = Stack::new("permanent");
        stack
            .add_output(Output::new(
                "ProductsTableStreamArn",
                "",
                Value::attribute("ProductsTable", "StreamArn"),
                qualify("svc-dev", ["ProductsTableStreamArn"]).unwrap(),
            ))
            .unwrap();
        assert!(matches!(
            stack.validate(),
            Err(ComposeError::UnknownResource { .. })
        ));
    }

    #[test]
    fn test_serialize_keeps_insertion_order() {
        let mut stack = Stack::new("permanent");
        stack
            .add_resource(ResourceDescriptor::new("ZTable", ResourceKind::StorageTable, json!({})))
            .unwrap();
        stack
            .add_resource(ResourceDescriptor::new("ATable", ResourceKind::StorageTable, json!({})))
            .unwrap();

        let text = serde_json::to_string(&stack).unwrap();
        let z = text.find("ZTable").unwrap();
        let a = text.find("ATable").unwrap();
        assert!(z < a);
    }
}
