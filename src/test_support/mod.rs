//! Test fixtures shared by unit tests.

pub mod fixtures;

pub use fixtures::{sample_manifest, sample_registries, SAMPLE_SERVICE};
