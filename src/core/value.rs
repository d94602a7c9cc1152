//! Typed reference values.
//!
//! A [`Value`] says how the provisioning engine obtains a string: inline, by
//! importing another stack's export, by pointing at a resource of the same
//! stack, or by reading a composed environment variable. Each kind is
//! serialized into the engine's native intrinsic so it is resolved
//! explicitly rather than by matching text conventions.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::core::naming::Identifier;

/// Intrinsic key for cross-stack imports.
pub const IMPORT_VALUE: &str = "Fn::ImportValue";
/// Intrinsic key for resource references.
pub const REF: &str = "Ref";
/// Intrinsic key for resource attribute references.
pub const GET_ATT: &str = "Fn::GetAtt";
/// Intrinsic key for pseudo-parameter substitution.
pub const SUB: &str = "Fn::Sub";
/// Intrinsic key for concatenation.
pub const JOIN: &str = "Fn::Join";

/// A value handed to the provisioning engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Inline text.
    Literal(String),
    /// Another stack's output, looked up by export name at deploy time.
    ImportRef(Identifier),
    /// A resource of the same stack, or one of its attributes.
    StructuralRef {
        resource: String,
        attribute: Option<String>,
    },
    /// An entry of the composed environment, substituted at deploy time.
    VariableRef(String),
    /// A template with provider pseudo-parameters such as `${AWS::Region}`.
    Sub(String),
    /// Concatenation of values.
    Join(Vec<Value>),
}

impl Value {
    pub fn literal(text: impl Into<String>) -> Self {
        Value::Literal(text.into())
    }

    pub fn import(export_name: Identifier) -> Self {
        Value::ImportRef(export_name)
    }

    /// Reference a resource of the same stack.
    pub fn reference(resource: impl Into<String>) -> Self {
        Value::StructuralRef {
            resource: resource.into(),
            attribute: None,
        }
    }

    /// Reference an attribute of a resource of the same stack.
    pub fn attribute(resource: impl Into<String>, attribute: impl Into<String>) -> Self {
        Value::StructuralRef {
            resource: resource.into(),
            attribute: Some(attribute.into()),
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Value::VariableRef(name.into())
    }

    pub fn sub(template: impl Into<String>) -> Self {
        Value::Sub(template.into())
    }

    pub fn join(parts: Vec<Value>) -> Self {
        Value::Join(parts)
    }

    /// Text of a literal or substitution template.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Literal(text) | Value::Sub(text) => Some(text),
            _ => None,
        }
    }

    /// Export name of an import.
    pub fn export_name(&self) -> Option<&str> {
        match self {
            Value::ImportRef(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Collect every in-stack resource this value points at.
    pub fn structural_targets<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Value::StructuralRef { resource, .. } => out.push(resource),
            Value::Join(parts) => parts.iter().for_each(|p| p.structural_targets(out)),
            _ => {}
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Literal(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Literal(text)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Literal(text) => serializer.serialize_str(text),
            Value::VariableRef(name) => {
                serializer.serialize_str(&format!("${{self:provider.environment.{}}}", name))
            }
            Value::ImportRef(name) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(IMPORT_VALUE, name)?;
                map.end()
            }
            Value::StructuralRef {
                resource,
                attribute: None,
            } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(REF, resource)?;
                map.end()
            }
            Value::StructuralRef {
                resource,
                attribute: Some(attribute),
            } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(GET_ATT, &[resource, attribute])?;
                map.end()
            }
            Value::Sub(template) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(SUB, template)?;
                map.end()
            }
            Value::Join(parts) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(JOIN, &JoinArgs(parts))?;
                map.end()
            }
        }
    }
}

/// `["", [parts...]]`
struct JoinArgs<'a>(&'a [Value]);

impl Serialize for JoinArgs<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element("")?;
        seq.serialize_element(self.0)?;
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::naming::qualify;
    use serde_json::json;

    #[test]
    fn test_serialize_each_kind() {
        let import = Value::import(qualify("svc-dev", ["UserPoolId"]).unwrap());
        assert_eq!(
            serde_json::to_value(&import).unwrap(),
            json!({ "Fn::ImportValue": "svc-dev-UserPoolId" })
        );

        assert_eq!(
            serde_json::to_value(Value::reference("CognitoUserPool")).unwrap(),
            json!({ "Ref": "CognitoUserPool" })
        );
        assert_eq!(
            serde_json::to_value(Value::attribute("ProductsTable", "StreamArn")).unwrap(),
            json!({ "Fn::GetAtt": ["ProductsTable", "StreamArn"] })
        );
        assert_eq!(
            serde_json::to_value(Value::variable("users_table_name")).unwrap(),
            json!("${self:provider.environment.users_table_name}")
        );
        assert_eq!(
            serde_json::to_value(Value::sub("arn:aws:s3:::svc-dev-*")).unwrap(),
            json!({ "Fn::Sub": "arn:aws:s3:::svc-dev-*" })
        );
    }

    #[test]
    fn test_join_collects_structural_targets() {
        let value = Value::join(vec![
            Value::attribute("PublicContentBucket", "Arn"),
            Value::literal("/*"),
        ]);
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({ "Fn::Join": ["", [{ "Fn::GetAtt": ["PublicContentBucket", "Arn"] }, "/*"]] })
        );

        let mut targets = Vec::new();
        value.structural_targets(&mut targets);
        assert_eq!(targets, vec!["PublicContentBucket"]);
    }
}
