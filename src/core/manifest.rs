//! Stagecraft.toml manifest parsing and schema.
//!
//! The manifest holds every literal input of a build: service name, region,
//! account, the stages the service deploys to, stage-dependent variables,
//! the storage entities, and the function registries to merge.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::error::ComposeError;
use crate::core::naming::SEPARATOR;
use crate::core::stage::Stage;
use crate::vars::{StackConstants, StageVariable, StageVariables};

/// Manifest file name.
pub const MANIFEST_NAME: &str = "Stagecraft.toml";

/// Directory searched for registry files when none are listed.
pub const DEFAULT_FUNCTIONS_DIR: &str = "functions";

/// Error locating a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("could not find `{}` in `{}` or any parent directory", MANIFEST_NAME, .dir.display())]
    NotFound { dir: PathBuf },
}

/// Find `Stagecraft.toml` in `start` or the nearest parent directory.
pub fn find_manifest(start: &Path) -> std::result::Result<PathBuf, ManifestError> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(MANIFEST_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(ManifestError::NotFound {
                dir: start.to_path_buf(),
            });
        }
    }
}

/// The [service] section.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Service name, the first half of every prefix
    pub name: String,
    /// Deployment region
    pub region: String,
    /// Account id, literal or a provider placeholder
    pub account_id: String,
    /// Every stage this service deploys to
    pub stages: Vec<Stage>,
}

/// Change stream view of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StreamView {
    NewImage,
    OldImage,
    NewAndOldImages,
    KeysOnly,
}

impl StreamView {
    pub fn as_str(self) -> &'static str {
        match self {
            StreamView::NewImage => "NEW_IMAGE",
            StreamView::OldImage => "OLD_IMAGE",
            StreamView::NewAndOldImages => "NEW_AND_OLD_IMAGES",
            StreamView::KeysOnly => "KEYS_ONLY",
        }
    }
}

/// Provisioned throughput. Tables without it are billed per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Capacity {
    pub read: u32,
    pub write: u32,
}

/// One storage table per logical entity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TableSpec {
    /// Entity name, qualified into the table name
    pub entity: String,
    pub hash_key: String,
    #[serde(default)]
    pub range_key: Option<String>,
    #[serde(default)]
    pub capacity: Option<Capacity>,
    /// Change stream; streamed tables export their stream ARN
    #[serde(default)]
    pub stream: Option<StreamView>,
}

/// An identity pool group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// The [identity] section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Client name fragment
    pub client: String,
    pub groups: Vec<GroupSpec>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        IdentityConfig {
            client: "mobile".to_string(),
            groups: Vec::new(),
        }
    }
}

/// The [content] section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Bucket name fragment
    pub bucket: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        ContentConfig {
            bucket: "public-content".to_string(),
        }
    }
}

/// The [functions] section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FunctionsConfig {
    /// Registry files, relative to the manifest, merged in this order
    pub registries: Vec<PathBuf>,
}

/// The parsed Stagecraft.toml manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub service: ServiceConfig,
    pub variables: StageVariables,
    pub tables: Vec<TableSpec>,
    pub identity: IdentityConfig,
    pub content: ContentConfig,
    pub functions: FunctionsConfig,
    /// The directory containing this manifest
    pub manifest_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    service: RawService,

    #[serde(default)]
    variables: BTreeMap<String, BTreeMap<String, String>>,

    #[serde(default)]
    tables: Vec<TableSpec>,

    #[serde(default)]
    identity: IdentityConfig,

    #[serde(default)]
    content: ContentConfig,

    #[serde(default)]
    functions: FunctionsConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawService {
    name: String,
    region: String,
    #[serde(default = "default_account_id")]
    account_id: String,
    stages: Vec<String>,
}

fn default_account_id() -> String {
    "${aws:accountId}".to_string()
}

impl Manifest {
    /// Load a manifest from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&content, path)
    }

    /// Parse manifest content.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let raw: RawManifest = toml::from_str(content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        let manifest_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        let manifest = Self::from_raw(raw, manifest_dir)?;
        Ok(manifest)
    }

    fn from_raw(raw: RawManifest, manifest_dir: PathBuf) -> std::result::Result<Self, ComposeError> {
        if raw.service.name.is_empty() {
            return Err(ComposeError::invalid_manifest("service.name must not be empty"));
        }
        if raw.service.region.is_empty() {
            return Err(ComposeError::invalid_manifest("service.region must not be empty"));
        }
        if raw.service.stages.is_empty() {
            return Err(ComposeError::invalid_manifest(
                "service.stages must list at least one stage",
            ));
        }

        let mut stages = Vec::with_capacity(raw.service.stages.len());
        for name in raw.service.stages {
            let stage = Stage::new(name)?;
            if stages.contains(&stage) {
                return Err(ComposeError::invalid_manifest(format!(
                    "stage `{}` is listed twice",
                    stage
                )));
            }
            if let Some(other) = stages.iter().find(|other| overlaps(other, &stage)) {
                return Err(ComposeError::invalid_manifest(format!(
                    "stages `{}` and `{}` overlap: every name of one would match the other's `{}*` pattern",
                    other, stage, SEPARATOR
                )));
            }
            stages.push(stage);
        }

        let mut variables = StageVariables::new();
        for (name, values) in raw.variables {
            let mut entries = Vec::with_capacity(values.len());
            for (stage, value) in values {
                let stage = Stage::new(stage)?;
                if !stages.contains(&stage) {
                    tracing::warn!(
                        variable = %name,
                        stage = %stage,
                        "variable has a value for an undeclared stage"
                    );
                }
                entries.push((stage, value));
            }
            variables.declare(StageVariable::new(name, entries))?;
        }
        variables.validate(&stages)?;

        let mut entities = HashSet::new();
        for table in &raw.tables {
            if table.entity.is_empty() || table.hash_key.is_empty() {
                return Err(ComposeError::invalid_manifest(
                    "tables need a non-empty `entity` and `hash-key`",
                ));
            }
            if !entities.insert(table.entity.as_str()) {
                return Err(ComposeError::invalid_manifest(format!(
                    "table entity `{}` is declared twice",
                    table.entity
                )));
            }
        }

        let mut groups = HashSet::new();
        for group in &raw.identity.groups {
            if group.name.is_empty() || !group.name.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(ComposeError::invalid_manifest(format!(
                    "identity group `{}` must be non-empty and alphanumeric",
                    group.name
                )));
            }
            if !groups.insert(group.name.as_str()) {
                return Err(ComposeError::invalid_manifest(format!(
                    "identity group `{}` is declared twice",
                    group.name
                )));
            }
        }

        if raw.identity.client.is_empty() || raw.content.bucket.is_empty() {
            return Err(ComposeError::invalid_manifest(
                "identity.client and content.bucket must not be empty",
            ));
        }

        Ok(Manifest {
            service: ServiceConfig {
                name: raw.service.name,
                region: raw.service.region,
                account_id: raw.service.account_id,
                stages,
            },
            variables,
            tables: raw.tables,
            identity: raw.identity,
            content: raw.content,
            functions: raw.functions,
            manifest_dir,
        })
    }

    /// Fail with `UnknownStage` unless `stage` is declared.
    pub fn check_stage(&self, stage: &Stage) -> std::result::Result<(), ComposeError> {
        if self.service.stages.contains(stage) {
            Ok(())
        } else {
            Err(ComposeError::UnknownStage {
                stage: stage.to_string(),
                variable: None,
            })
        }
    }

    /// Stack-scoped constants for the static variable set.
    pub fn constants(&self) -> StackConstants {
        StackConstants {
            account_id: self.service.account_id.clone(),
            region: self.service.region.clone(),
        }
    }

    /// Entity names in declaration order.
    pub fn entities(&self) -> impl Iterator<Item = &str> + Clone {
        self.tables.iter().map(|t| t.entity.as_str())
    }

    /// Registry files in merge order.
    ///
    /// Listed registries keep their listed order. Without a list, every
    /// `functions/*.toml` is used, sorted by path.
    pub fn registry_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.functions.registries.is_empty() {
            return Ok(self
                .functions
                .registries
                .iter()
                .map(|p| self.manifest_dir.join(p))
                .collect());
        }

        let pattern = self
            .manifest_dir
            .join(DEFAULT_FUNCTIONS_DIR)
            .join("*.toml");
        let pattern = pattern.to_string_lossy();

        let mut paths = Vec::new();
        for entry in glob::glob(&pattern)
            .with_context(|| format!("invalid registry pattern: {}", pattern))?
        {
            paths.push(entry?);
        }
        paths.sort();
        Ok(paths)
    }
}

/// Whether one stage's scope is a prefix of the other's, e.g. `dev` and `dev-eu`.
fn overlaps(a: &Stage, b: &Stage) -> bool {
    let starts = |long: &str, short: &str| {
        long.strip_prefix(short)
            .map_or(false, |rest| rest.starts_with(SEPARATOR))
    };
    starts(a.as_str(), b.as_str()) || starts(b.as_str(), a.as_str())
}

/// Generate a starter manifest for `service`.
pub fn generate_manifest(service: &str) -> String {
    format!(
        r#"[service]
name = "{service}"
region = "eu-north-1"
account-id = "${{aws:accountId}}"
stages = ["dev", "prod"]

# Values that differ by stage, e.g. external API URLs.
[variables.environmentVariable1]
dev = "development environment value"
prod = "production environment value"

[[tables]]
entity = "products"
hash-key = "ean"
stream = "new-image"

[[tables]]
entity = "ratings"
hash-key = "ean"
range-key = "userId"
capacity = {{ read = 1, write = 1 }}

[[tables]]
entity = "pricehistory"
hash-key = "ean"
range-key = "sk"

[[tables]]
entity = "users"
hash-key = "userId"

[identity]
client = "mobile"
groups = [
    {{ name = "Admin", description = "Group for app administrators" }},
    {{ name = "Moderator", description = "Group for app moderators" }},
]

[content]
bucket = "public-content"

[functions]
registries = [
    "functions/app.toml",
    "functions/heartbeat.toml",
    "functions/image-download-handler.toml",
]
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(content: &str) -> Result<Manifest> {
        Manifest::parse(content, Path::new("/project/Stagecraft.toml"))
    }

    fn compose_error(err: anyhow::Error) -> ComposeError {
        err.downcast::<ComposeError>().unwrap()
    }

    #[test]
    fn test_parse_generated_manifest() {
        let manifest = parse(&generate_manifest("juomaranking-api")).unwrap();

        assert_eq!(manifest.service.name, "juomaranking-api");
        assert_eq!(manifest.service.stages.len(), 2);
        assert_eq!(manifest.variables.len(), 1);
        assert_eq!(
            manifest.entities().collect::<Vec<_>>(),
            vec!["products", "ratings", "pricehistory", "users"]
        );
        assert_eq!(manifest.tables[0].stream, Some(StreamView::NewImage));
        assert_eq!(manifest.tables[1].capacity, Some(Capacity { read: 1, write: 1 }));
        assert_eq!(manifest.identity.groups.len(), 2);
        assert_eq!(manifest.manifest_dir, PathBuf::from("/project"));
    }

    #[test]
    fn test_variable_missing_stage_fails_on_load() {
        let err = parse(
            r#"
[service]
name = "svc"
region = "eu-north-1"
stages = ["dev", "prod"]

[variables.apiUrl]
dev = "https://dev.example.com"
"#,
        )
        .unwrap_err();

        assert_eq!(
            compose_error(err),
            ComposeError::UnknownStage {
                stage: "prod".to_string(),
                variable: Some("apiUrl".to_string()),
            }
        );
    }

    #[test]
    fn test_duplicate_entity_rejected() {
        let err = parse(
            r#"
[service]
name = "svc"
region = "eu-north-1"
stages = ["dev"]

[[tables]]
entity = "users"
hash-key = "userId"

[[tables]]
entity = "users"
hash-key = "id"
"#,
        )
        .unwrap_err();

        assert!(matches!(
            compose_error(err),
            ComposeError::InvalidManifest { .. }
        ));
    }

    #[test]
    fn test_empty_stages_rejected() {
        let err = parse("[service]\nname = \"svc\"\nregion = \"r\"\nstages = []\n").unwrap_err();
        assert!(matches!(
            compose_error(err),
            ComposeError::InvalidManifest { .. }
        ));
    }

    #[test]
    fn test_overlapping_stages_rejected() {
        let err = parse(
            "[service]\nname = \"svc\"\nregion = \"r\"\nstages = [\"dev\", \"dev-eu\"]\n",
        )
        .unwrap_err();
        match compose_error(err) {
            ComposeError::InvalidManifest { message } => {
                assert!(message.contains("`dev`") && message.contains("`dev-eu`"), "{}", message)
            }
            other => panic!("unexpected error {:?}", other),
        }

        let err = parse(
            "[service]\nname = \"svc\"\nregion = \"r\"\nstages = [\"prod-eu\", \"prod\"]\n",
        )
        .unwrap_err();
        assert!(matches!(compose_error(err), ComposeError::InvalidManifest { .. }));

        let manifest = parse(
            "[service]\nname = \"svc\"\nregion = \"r\"\nstages = [\"dev\", \"devel\"]\n",
        )
        .unwrap();
        assert_eq!(manifest.service.stages.len(), 2);
    }

    #[test]
    fn test_group_names_must_be_alphanumeric() {
        let err = parse(
            r#"
[service]
name = "svc"
region = "r"
stages = ["dev"]

[identity]
groups = [{ name = "Power Users" }]
"#,
        )
        .unwrap_err();
        assert!(matches!(compose_error(err), ComposeError::InvalidManifest { .. }));
    }

    #[test]
    fn test_check_stage() {
        let manifest = parse(&generate_manifest("svc")).unwrap();
        assert!(manifest.check_stage(&Stage::new("dev").unwrap()).is_ok());
        assert!(matches!(
            manifest.check_stage(&Stage::new("staging").unwrap()),
            Err(ComposeError::UnknownStage { variable: None, .. })
        ));
    }

    #[test]
    fn test_registry_paths_discovered_sorted() {
        let tmp = TempDir::new().unwrap();
        let functions = tmp.path().join("functions");
        std::fs::create_dir_all(&functions).unwrap();
        std::fs::write(functions.join("b.toml"), "").unwrap();
        std::fs::write(functions.join("a.toml"), "").unwrap();

        let manifest_path = tmp.path().join(MANIFEST_NAME);
        std::fs::write(
            &manifest_path,
            "[service]\nname = \"svc\"\nregion = \"r\"\nstages = [\"dev\"]\n",
        )
        .unwrap();

        let manifest = Manifest::load(&manifest_path).unwrap();
        let paths = manifest.registry_paths().unwrap();
        assert_eq!(paths, vec![functions.join("a.toml"), functions.join("b.toml")]);
    }

    #[test]
    fn test_find_manifest_not_found() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            find_manifest(tmp.path()),
            Err(ManifestError::NotFound { .. })
        ));
    }
}
