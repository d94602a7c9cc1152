//! Variable composition.
//!
//! - [`static_set`]: values derived from the naming convention
//! - [`stage_set`]: values that differ by stage
//! - [`environment`]: the merged environment handed to compute units

pub mod environment;
pub mod stage_set;
pub mod static_set;

pub use environment::{merge, resolve_environment, Environment};
pub use stage_set::{StageVariable, StageVariables};
pub use static_set::{StackConstants, StaticVariables};
