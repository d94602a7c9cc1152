//! Deployment stage names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{ComposeError, Result};

/// A deployment environment identifier such as `dev` or `prod`.
///
/// Stage names are free-form but never blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stage(String);

impl Stage {
    /// Create a stage, rejecting blank names with `MissingStage`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ComposeError::MissingStage);
        }
        Ok(Stage(name))
    }

    /// Resolve the stage supplied by an external caller.
    ///
    /// Absence is a fatal configuration error raised before any component runs.
    pub fn require(name: Option<&str>) -> Result<Self> {
        match name {
            Some(name) => Stage::new(name),
            None => Err(ComposeError::MissingStage),
        }
    }

    /// Get the stage name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Stage {
    type Err = ComposeError;

    fn from_str(s: &str) -> Result<Self> {
        Stage::new(s)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Stage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_missing_stage() {
        assert_eq!(Stage::require(None), Err(ComposeError::MissingStage));
        assert_eq!(Stage::require(Some("  ")), Err(ComposeError::MissingStage));
    }

    #[test]
    fn test_require_present_stage() {
        let stage = Stage::require(Some("prod")).unwrap();
        assert_eq!(stage.as_str(), "prod");
        assert_eq!("prod".parse::<Stage>().unwrap(), stage);
    }
}
