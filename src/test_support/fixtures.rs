//! Fixture manifests and registries.

use std::path::Path;

use crate::core::manifest::{generate_manifest, Manifest};
use crate::ops::stagecraft_build::RegistrySource;
use crate::ops::stagecraft_init::REGISTRY_TEMPLATES;

/// Service name used by the fixtures.
pub const SAMPLE_SERVICE: &str = "juomaranking-api";

/// The starter manifest for [`SAMPLE_SERVICE`].
pub fn sample_manifest() -> Manifest {
    Manifest::parse(
        &generate_manifest(SAMPLE_SERVICE),
        Path::new("/project/Stagecraft.toml"),
    )
    .expect("starter manifest parses")
}

/// The starter registries, in manifest order.
pub fn sample_registries() -> Vec<RegistrySource> {
    REGISTRY_TEMPLATES
        .iter()
        .map(|(name, text)| RegistrySource::new(format!("functions/{}", name), *text))
        .collect()
}
