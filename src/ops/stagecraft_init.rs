//! Implementation of `stagecraft init`.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::core::manifest::{generate_manifest, DEFAULT_FUNCTIONS_DIR, MANIFEST_NAME};

/// Starter registries written next to the manifest.
pub const REGISTRY_TEMPLATES: &[(&str, &str)] = &[
    (
        "app.toml",
        r#"[api]
image = "juomaranking-api"
image-path = "./src/functions/app"
timeout = 30
environment = { STAGE = { builtin = "stage" } }
events = [{ http-api = { method = "any", path = "/{proxy+}" } }]
"#,
    ),
    (
        "heartbeat.toml",
        r#"[heartbeat]
handler = "src/functions/heartbeat/handler.main"
runtime = "nodejs16.x"
events = [{ http-api = "GET /heartbeat" }]
"#,
    ),
    (
        "image-download-handler.toml",
        r#"[imageDownloadHandler]
image = "image-download-handler"
runtime = "python3.8"
timeout = 30

[[imageDownloadHandler.events]]
stream = { type = "dynamodb", arn = { import = "ProductsTableStreamArn" }, filter-patterns = [{ eventName = ["INSERT"] }] }
"#,
    ),
];

/// Write a starter project into `path`.
///
/// `service` defaults to the directory name.
pub fn init_project(path: &Path, service: Option<&str>) -> Result<()> {
    let manifest_path = path.join(MANIFEST_NAME);
    if manifest_path.exists() {
        bail!("`{}` already exists in `{}`", MANIFEST_NAME, path.display());
    }

    let service = match service {
        Some(name) => name.to_string(),
        None => match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => bail!(
                "cannot infer a service name from `{}`\n\
                 \n\
                 Pass one with `--service <NAME>`.",
                path.display()
            ),
        },
    };

    let functions_dir = path.join(DEFAULT_FUNCTIONS_DIR);
    fs::create_dir_all(&functions_dir)
        .with_context(|| format!("failed to create directory: {}", functions_dir.display()))?;

    for (name, _) in REGISTRY_TEMPLATES {
        let registry = functions_dir.join(name);
        if registry.exists() {
            bail!("`{}` already exists", registry.display());
        }
    }

    fs::write(&manifest_path, generate_manifest(&service))
        .with_context(|| format!("failed to write {}", MANIFEST_NAME))?;

    for (name, content) in REGISTRY_TEMPLATES {
        let registry = functions_dir.join(name);
        fs::write(&registry, content)
            .with_context(|| format!("failed to write {}", registry.display()))?;
    }

    tracing::info!(service = %service, path = %path.display(), "created project");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::Manifest;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_loadable_project() {
        let tmp = TempDir::new().unwrap();
        init_project(tmp.path(), Some("svc")).unwrap();

        let manifest = Manifest::load(&tmp.path().join(MANIFEST_NAME)).unwrap();
        assert_eq!(manifest.service.name, "svc");
        assert_eq!(manifest.registry_paths().unwrap().len(), REGISTRY_TEMPLATES.len());
        for path in manifest.registry_paths().unwrap() {
            assert!(path.is_file(), "{} missing", path.display());
        }
    }

    #[test]
    fn test_app_registry_builds_the_service_image() {
        let (_, app) = REGISTRY_TEMPLATES
            .iter()
            .find(|(name, _)| *name == "app.toml")
            .unwrap();
        assert!(app.contains("image = \"juomaranking-api\""));
        assert!(app.contains("image-path = \"./src/functions/app\""));
    }

    #[test]
    fn test_init_refuses_existing_manifest() {
        let tmp = TempDir::new().unwrap();
        init_project(tmp.path(), Some("svc")).unwrap();
        assert!(init_project(tmp.path(), Some("svc")).is_err());
    }

    #[test]
    fn test_service_defaults_to_directory_name() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("ranking-api");
        std::fs::create_dir(&dir).unwrap();

        init_project(&dir, None).unwrap();
        let manifest = Manifest::load(&dir.join(MANIFEST_NAME)).unwrap();
        assert_eq!(manifest.service.name, "ranking-api");
    }
}
