//! Function registry merging.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::core::error::{ComposeError, Result};
use crate::functions::FunctionDescriptor;

/// Descriptors authored together in one registry file.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionRegistry {
    source: String,
    entries: Vec<(String, FunctionDescriptor)>,
}

impl FunctionRegistry {
    /// Create an empty registry named after where it was authored.
    pub fn new(source: impl Into<String>) -> Self {
        FunctionRegistry {
            source: source.into(),
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, descriptor: FunctionDescriptor) -> Result<()> {
        let name = name.into();
        if self.entries.iter().any(|(existing, _)| *existing == name) {
            return Err(ComposeError::DuplicateFunctionName {
                name,
                first: self.source.clone(),
                second: self.source.clone(),
            });
        }
        self.entries.push((name, descriptor));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FunctionDescriptor)> {
        self.entries.iter().map(|(name, d)| (name.as_str(), d))
    }
}

/// One function of the merged registry.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedEntry {
    pub name: String,
    pub source: String,
    pub descriptor: FunctionDescriptor,
}

/// The merged registry, in merge order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedFunctions {
    entries: Vec<MergedEntry>,
}

impl MergedFunctions {
    pub fn get(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.descriptor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MergedEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }
}

impl Serialize for MergedFunctions {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.name, &entry.descriptor)?;
        }
        map.end()
    }
}

/// Merge registries in the given order.
///
/// A name owned by two registries is an error; the later one is never
/// allowed to silently replace the earlier one's triggers.
pub fn merge(registries: Vec<FunctionRegistry>) -> Result<MergedFunctions> {
    let mut merged = MergedFunctions::default();

    for registry in registries {
        tracing::debug!(source = %registry.source, count = registry.len(), "merging registry");
        for (name, descriptor) in registry.entries {
            if let Some(existing) = merged.entries.iter().find(|e| e.name == name) {
                return Err(ComposeError::DuplicateFunctionName {
                    name,
                    first: existing.source.clone(),
                    second: registry.source,
                });
            }
            merged.entries.push(MergedEntry {
                name,
                source: registry.source.clone(),
                descriptor,
            });
        }
    }

    Ok(merged)
}
