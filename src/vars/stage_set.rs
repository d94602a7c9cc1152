//! Stage-dependent variables.
//!
//! Each variable carries one value per stage. Coverage is checked against the
//! declared stages when the manifest is loaded, so a missing entry surfaces
//! before any build runs instead of as a partial environment.

use std::collections::BTreeMap;

use crate::core::error::{ComposeError, Result};
use crate::core::stage::Stage;
use crate::core::value::Value;

/// A variable whose value differs by deployment stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageVariable {
    name: String,
    values: BTreeMap<Stage, String>,
}

impl StageVariable {
    /// Create a variable from `(stage, value)` pairs.
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = (Stage, String)>) -> Self {
        StageVariable {
            name: name.into(),
            values: values.into_iter().collect(),
        }
    }

    /// The variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value for `stage`, if one is declared.
    pub fn value_for(&self, stage: &Stage) -> Option<&str> {
        self.values.get(stage).map(String::as_str)
    }

    /// Stages this variable has entries for.
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.values.keys()
    }
}

/// The table of stage-dependent variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageVariables {
    variables: Vec<StageVariable>,
}

impl StageVariables {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable. Names must be unique.
    pub fn declare(&mut self, variable: StageVariable) -> Result<()> {
        if self.variables.iter().any(|v| v.name == variable.name) {
            return Err(ComposeError::invalid_manifest(format!(
                "stage variable `{}` is declared twice",
                variable.name
            )));
        }
        self.variables.push(variable);
        Ok(())
    }

    /// Check that every variable has a value for every stage in `stages`.
    pub fn validate(&self, stages: &[Stage]) -> Result<()> {
        for stage in stages {
            for variable in &self.variables {
                if variable.value_for(stage).is_none() {
                    return Err(ComposeError::UnknownStage {
                        stage: stage.to_string(),
                        variable: Some(variable.name.clone()),
                    });
                }
            }
        }
        Ok(())
    }

    /// Look up every variable's value for `stage`.
    ///
    /// Fails with `UnknownStage` on the first variable lacking an entry;
    /// partial results are never returned.
    pub fn resolve(&self, stage: &Stage) -> Result<Vec<(String, Value)>> {
        self.variables
            .iter()
            .map(|variable| match variable.value_for(stage) {
                Some(value) => Ok((variable.name.clone(), Value::literal(value))),
                None => Err(ComposeError::UnknownStage {
                    stage: stage.to_string(),
                    variable: Some(variable.name.clone()),
                }),
            })
            .collect()
    }

    /// Iterate over the declared variables.
    pub fn iter(&self) -> impl Iterator<Item = &StageVariable> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
