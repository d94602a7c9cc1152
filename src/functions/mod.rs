//! Compute unit descriptors and their registries.
//!
//! Descriptors are opaque to the merge: it only guarantees that every
//! function name is owned by exactly one registry.

pub mod loader;
pub mod registry;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::value::Value;

pub use loader::{parse_registry, LoadContext};
pub use registry::{merge, FunctionRegistry, MergedFunctions};

/// A named compute unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Build context of `image`; collected into the container image list
    #[serde(skip)]
    pub image_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    /// Overrides layered over the composed environment by the provisioning engine
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, Value>,
    pub events: Vec<Trigger>,
}

/// An event binding of a compute unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Trigger {
    HttpApi(HttpRoute),
    Stream(StreamTrigger),
}

/// An HTTP route, either `"GET /path"` or a method/path pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HttpRoute {
    Shorthand(String),
    Detailed { method: String, path: String },
}

impl HttpRoute {
    /// The route path.
    pub fn path(&self) -> Option<&str> {
        match self {
            HttpRoute::Shorthand(route) => route.split_once(' ').map(|(_, path)| path),
            HttpRoute::Detailed { path, .. } => Some(path),
        }
    }
}

/// A change-stream binding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamTrigger {
    #[serde(rename = "type")]
    pub kind: String,
    pub arn: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filter_patterns: Vec<serde_json::Value>,
}
