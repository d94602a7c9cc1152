//! Environment composition.
//!
//! Stage-dependent values are applied first and static values second, so a
//! name present in both resolves to the static value. Per-function overrides
//! are layered on top later by the provisioning engine.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::error::Result;
use crate::core::stage::Stage;
use crate::core::value::Value;
use crate::vars::stage_set::StageVariables;
use crate::vars::static_set::StaticVariables;

/// The flat environment exposed to every compute unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Environment(BTreeMap<String, Value>);

impl Environment {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Merge resolved stage values with the static set. Static values win.
pub fn merge(stage_values: Vec<(String, Value)>, statics: &StaticVariables) -> Environment {
    let mut env: BTreeMap<String, Value> = stage_values.into_iter().collect();

    for (name, value) in statics.iter() {
        if env.insert(name.to_string(), value.clone()).is_some() {
            tracing::warn!(
                variable = name,
                "stage variable `{}` is shadowed by its static value",
                name
            );
        }
    }

    Environment(env)
}

/// Resolve the environment for one stage.
pub fn resolve_environment(
    stage_vars: &StageVariables,
    statics: &StaticVariables,
    stage: &Stage,
) -> Result<Environment> {
    let stage_values = stage_vars.resolve(stage)?;
    tracing::debug!(stage = %stage, count = stage_values.len(), "resolved stage variables");
    Ok(merge(stage_values, statics))
}
