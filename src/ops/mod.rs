//! High-level operations.
//!
//! This module contains the implementation of Stagecraft commands.

pub mod audit;
pub mod document;
pub mod provider;
pub mod stagecraft_build;
pub mod stagecraft_init;

pub use audit::{audit_imports, ImportReport, ImportUse};
pub use document::Document;
pub use stagecraft_build::{build, compose, RegistrySource};
pub use stagecraft_init::init_project;
