//! The document handed to the provisioning engine.

use serde::Serialize;

use crate::core::stage::Stage;
use crate::functions::MergedFunctions;
use crate::iam::PolicyStatement;
use crate::ops::provider::{ContainerImages, HttpApi};
use crate::stack::Stack;
use crate::util::hash::sha256_str;
use crate::vars::Environment;

/// Everything one build produces, keyed exactly as produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub service: String,
    pub stage: Stage,
    pub region: String,
    pub environment: Environment,
    pub iam: Vec<PolicyStatement>,
    pub http_api: HttpApi,
    #[serde(skip_serializing_if = "ContainerImages::is_empty")]
    pub ecr: ContainerImages,
    pub permanent_stack: Stack,
    pub functions: MergedFunctions,
}

impl Document {
    /// Render as JSON.
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    /// SHA-256 of the compact rendering. Identical inputs give identical
    /// fingerprints, so successive builds can be diffed cheaply.
    pub fn fingerprint(&self) -> serde_json::Result<String> {
        Ok(sha256_str(&self.to_json(false)?))
    }
}
