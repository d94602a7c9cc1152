//! Resource descriptors.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value as Json;

use crate::core::value::{GET_ATT, REF};

/// The kind of infrastructure resource a descriptor declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    StorageTable,
    IdentityPool,
    IdentityPoolGroup,
    IdentityPoolClient,
    ObjectStore,
    ObjectStorePolicy,
    CachePolicy,
    Distribution,
}

impl ResourceKind {
    /// Resource type understood by the provisioning engine.
    pub fn type_name(self) -> &'static str {
        match self {
            ResourceKind::StorageTable => "AWS::DynamoDB::Table",
            ResourceKind::IdentityPool => "AWS::Cognito::UserPool",
            ResourceKind::IdentityPoolGroup => "AWS::Cognito::UserPoolGroup",
            ResourceKind::IdentityPoolClient => "AWS::Cognito::UserPoolClient",
            ResourceKind::ObjectStore => "AWS::S3::Bucket",
            ResourceKind::ObjectStorePolicy => "AWS::S3::BucketPolicy",
            ResourceKind::CachePolicy => "AWS::CloudFront::CachePolicy",
            ResourceKind::Distribution => "AWS::CloudFront::Distribution",
        }
    }
}

/// A named resource with a kind and a property bag.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDescriptor {
    logical_id: String,
    kind: ResourceKind,
    properties: Json,
}

impl ResourceDescriptor {
    pub fn new(logical_id: impl Into<String>, kind: ResourceKind, properties: Json) -> Self {
        ResourceDescriptor {
            logical_id: logical_id.into(),
            kind,
            properties,
        }
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn properties(&self) -> &Json {
        &self.properties
    }

    /// Resources of the same stack this descriptor points at.
    ///
    /// Provider pseudo-parameters (`AWS::Region` and friends) are skipped.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_references(&self.properties, &mut out);
        out
    }
}

fn collect_references<'a>(json: &'a Json, out: &mut Vec<&'a str>) {
    match json {
        Json::Object(map) => {
            if map.len() == 1 {
                if let Some(Json::String(target)) = map.get(REF) {
                    if !target.starts_with("AWS::") {
                        out.push(target);
                    }
                    return;
                }
                if let Some(Json::Array(args)) = map.get(GET_ATT) {
                    if let Some(Json::String(target)) = args.first() {
                        out.push(target);
                    }
                    return;
                }
            }
            map.values().for_each(|v| collect_references(v, out));
        }
        Json::Array(items) => items.iter().for_each(|v| collect_references(v, out)),
        _ => {}
    }
}

impl Serialize for ResourceDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("Type", self.kind.type_name())?;
        map.serialize_entry("Properties", &self.properties)?;
        map.end()
    }
}
