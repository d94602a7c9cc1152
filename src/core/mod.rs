//! Core data structures for Stagecraft.
//!
//! This module contains the foundational types used throughout Stagecraft:
//! - Stages and stage-qualified names
//! - Typed reference values
//! - The project manifest
//! - Build errors

pub mod error;
pub mod manifest;
pub mod naming;
pub mod stage;
pub mod value;

pub use error::ComposeError;
pub use manifest::{find_manifest, Manifest, MANIFEST_NAME};
pub use naming::{qualify, Identifier, Prefix};
pub use stage::Stage;
pub use value::Value;
