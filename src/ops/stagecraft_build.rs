//! Implementation of `stagecraft build`.
//!
//! The pipeline runs once, in order, and stops at the first error:
//! prefix, static variables, environment, permanent stack, policy,
//! function registries, provider settings.

use std::path::PathBuf;

use anyhow::Context;

use crate::core::error::{ComposeError, Result};
use crate::core::manifest::Manifest;
use crate::core::naming::Prefix;
use crate::core::stage::Stage;
use crate::functions::{self, parse_registry, LoadContext};
use crate::iam::{audit_policy, build_policy_statements, required_access};
use crate::ops::audit::audit_imports;
use crate::ops::document::Document;
use crate::ops::provider::{container_images, http_api};
use crate::stack::permanent_stack;
use crate::vars::static_set::bucket_variable;
use crate::vars::{resolve_environment, StaticVariables};

/// Registry text and the name it is reported under.
#[derive(Debug, Clone)]
pub struct RegistrySource {
    pub name: String,
    pub text: String,
}

impl RegistrySource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        RegistrySource {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Compose the document for `stage` from in-memory inputs.
pub fn compose(manifest: &Manifest, stage: &Stage, sources: &[RegistrySource]) -> Result<Document> {
    manifest.check_stage(stage)?;

    let prefix = Prefix::new(&manifest.service.name, stage)?;
    tracing::debug!(prefix = %prefix, "composing document");

    let statics = StaticVariables::build(
        &prefix,
        &manifest.constants(),
        manifest.entities(),
        &manifest.content.bucket,
    )?;
    let environment = resolve_environment(&manifest.variables, &statics, stage)?;

    let permanent = permanent_stack(&prefix, manifest)?;

    let iam = build_policy_statements(&prefix)?;
    let bucket_name = statics
        .get(&bucket_variable(&manifest.content.bucket))
        .and_then(|v| v.as_text())
        .ok_or_else(|| ComposeError::invalid_argument("object store name was not derived"))?;
    let required = required_access(&prefix, manifest.entities(), bucket_name)?;
    for access in audit_policy(&iam, &required) {
        tracing::warn!(action = access.action, "no policy statement grants a compute action");
    }

    let ctx = LoadContext {
        prefix: &prefix,
        region: &manifest.service.region,
    };
    let registries = sources
        .iter()
        .map(|source| parse_registry(&source.name, &source.text, &ctx))
        .collect::<Result<Vec<_>>>()?;
    let functions = functions::merge(registries)?;
    let ecr = container_images(&functions)?;

    let document = Document {
        service: manifest.service.name.clone(),
        stage: stage.clone(),
        region: manifest.service.region.clone(),
        environment,
        iam,
        http_api: http_api(&manifest.service.region),
        ecr,
        permanent_stack: permanent,
        functions,
    };

    for import in audit_imports(&document).unresolved() {
        tracing::warn!(
            export = %import.export_name,
            location = %import.location,
            "import does not match any permanent stack export"
        );
    }

    Ok(document)
}

/// Read the manifest's registries from disk and compose the document.
pub fn build(manifest: &Manifest, stage: &Stage) -> anyhow::Result<Document> {
    manifest.check_stage(stage)?;

    let paths: Vec<PathBuf> = manifest.registry_paths()?;
    let mut sources = Vec::with_capacity(paths.len());
    for path in &paths {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read registry: {}", path.display()))?;
        let name = path
            .strip_prefix(&manifest.manifest_dir)
            .unwrap_or(path)
            .display()
            .to_string();
        sources.push(RegistrySource::new(name, text));
    }

    tracing::debug!(registries = sources.len(), stage = %stage, "building");
    Ok(compose(manifest, stage, &sources)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Value;
    use crate::test_support::{sample_manifest, sample_registries};
    use serde_json::json;

    fn stage(name: &str) -> Stage {
        Stage::new(name).unwrap()
    }

    #[test]
    fn test_compose_dev() {
        let manifest = sample_manifest();
        let doc = compose(&manifest, &stage("dev"), &sample_registries()).unwrap();

        assert_eq!(doc.environment.len(), 1 + 8);
        assert_eq!(
            doc.environment.get("environmentVariable1"),
            Some(&Value::literal("development environment value"))
        );
        assert_eq!(
            doc.environment.get("products_table_name"),
            Some(&Value::literal("juomaranking-api-dev-products"))
        );
        assert_eq!(
            doc.environment.get("public_content_bucket_name"),
            Some(&Value::literal("juomaranking-api-dev-public-content-${aws:accountId}"))
        );
        assert_eq!(
            doc.functions.names().collect::<Vec<_>>(),
            vec!["api", "heartbeat", "imageDownloadHandler"]
        );
        assert!(audit_imports(&doc).unresolved().next().is_none());
    }

    #[test]
    fn test_every_stage_resolves_every_key_once() {
        let manifest = sample_manifest();
        for name in ["dev", "prod"] {
            let doc = compose(&manifest, &stage(name), &sample_registries()).unwrap();
            for variable in manifest.variables.iter() {
                assert!(doc.environment.contains_key(variable.name()));
            }
            assert_eq!(doc.environment.len(), manifest.variables.len() + 8);
        }
    }

    #[test]
    fn test_unknown_stage_fails_before_output() {
        let manifest = sample_manifest();
        let err = compose(&manifest, &stage("staging"), &sample_registries()).unwrap_err();
        assert_eq!(
            err,
            ComposeError::UnknownStage {
                stage: "staging".to_string(),
                variable: None,
            }
        );
    }

    #[test]
    fn test_duplicate_function_across_registries() {
        let manifest = sample_manifest();
        let mut sources = sample_registries();
        sources.push(RegistrySource::new(
            "functions/extra.toml",
            "[heartbeat]\nhandler = \"extra.main\"\n",
        ));

        let err = compose(&manifest, &stage("dev"), &sources).unwrap_err();
        assert_eq!(
            err,
            ComposeError::DuplicateFunctionName {
                name: "heartbeat".to_string(),
                first: "functions/heartbeat.toml".to_string(),
                second: "functions/extra.toml".to_string(),
            }
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let manifest = sample_manifest();
        let a = compose(&manifest, &stage("prod"), &sample_registries()).unwrap();
        let b = compose(&manifest, &stage("prod"), &sample_registries()).unwrap();

        assert_eq!(a.to_json(true).unwrap(), b.to_json(true).unwrap());
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());

        let dev = compose(&manifest, &stage("dev"), &sample_registries()).unwrap();
        assert_ne!(a.fingerprint().unwrap(), dev.fingerprint().unwrap());
    }

    #[test]
    fn test_document_shape() {
        let manifest = sample_manifest();
        let doc = compose(&manifest, &stage("dev"), &sample_registries()).unwrap();
        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json["stage"], json!("dev"));
        assert_eq!(
            json["environment"]["user_pool_id"],
            json!({ "Fn::ImportValue": "juomaranking-api-dev-UserPoolId" })
        );
        assert_eq!(
            json["functions"]["api"]["environment"]["STAGE"],
            json!("dev")
        );
        assert_eq!(
            json["permanentStack"]["Outputs"]["UserPoolId"]["Export"]["Name"],
            json!("juomaranking-api-dev-UserPoolId")
        );
        assert_eq!(json["iam"].as_array().unwrap().len(), 3);

        let authorizer = &json["httpApi"]["authorizers"]["serviceAuthorizer"];
        assert_eq!(json["httpApi"]["cors"], json!(true));
        assert_eq!(
            authorizer["issuerUrl"],
            json!({ "Fn::Join": ["", [
                "https://cognito-idp.",
                "eu-north-1",
                ".amazonaws.com/",
                "${self:provider.environment.user_pool_id}"
            ]] })
        );
        assert_eq!(
            authorizer["audience"],
            json!(["${self:provider.environment.user_pool_client_id}"])
        );
        for variable in ["user_pool_id", "user_pool_client_id"] {
            assert!(doc.environment.contains_key(variable));
        }

        assert_eq!(
            json["ecr"]["images"],
            json!({
                "image-download-handler": { "path": "./src/functions/image-download-handler" },
                "juomaranking-api": { "path": "./src/functions/app" }
            })
        );
        assert!(json["functions"]["api"].get("imagePath").is_none());
    }

    #[test]
    fn test_build_reads_registries_from_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        crate::ops::stagecraft_init::init_project(tmp.path(), Some("juomaranking-api")).unwrap();

        let manifest = Manifest::load(&tmp.path().join("Stagecraft.toml")).unwrap();
        let doc = build(&manifest, &stage("dev")).unwrap();
        assert_eq!(doc.functions.len(), 3);
    }
}
