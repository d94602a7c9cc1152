//! Stagecraft - stage-qualified configuration composer for serverless stacks
//!
//! This crate derives deterministic resource names for one service and
//! stage, composes the environment handed to compute units, describes the
//! permanent stack and its exports, builds least-privilege policy
//! statements, and merges function registries into one document for the
//! provisioning engine.

pub mod core;
pub mod functions;
pub mod iam;
pub mod ops;
pub mod stack;
pub mod util;
pub mod vars;

/// Fixture manifests and registries for unit tests.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    error::ComposeError, manifest::Manifest, naming::Prefix, stage::Stage, value::Value,
};
pub use ops::{build, compose, Document};
pub use util::context::GlobalContext;
