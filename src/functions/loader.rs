//! Registry file parsing.
//!
//! A registry file is a TOML table of function name to descriptor:
//!
//! ```toml
//! [imageDownloadHandler]
//! image = "image-download-handler"
//! runtime = "python3.8"
//! timeout = 30
//!
//! [[imageDownloadHandler.events]]
//! stream = { type = "dynamodb", arn = { import = "ProductsTableStreamArn" } }
//! ```
//!
//! Import fragments are qualified with the build prefix while loading, so
//! the registry text stays stage-agnostic.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::core::error::{ComposeError, Result};
use crate::core::naming::Prefix;
use crate::core::value::Value;
use crate::functions::{FunctionDescriptor, FunctionRegistry, HttpRoute, StreamTrigger, Trigger};

/// What registry values may refer to while loading.
#[derive(Debug, Clone, Copy)]
pub struct LoadContext<'a> {
    pub prefix: &'a Prefix,
    pub region: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawFunction {
    handler: Option<String>,
    image: Option<String>,
    image_path: Option<String>,
    runtime: Option<String>,
    timeout: Option<u32>,
    #[serde(default)]
    environment: BTreeMap<String, ValueSpec>,
    #[serde(default)]
    events: Vec<RawTrigger>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum RawTrigger {
    HttpApi(HttpRoute),
    Stream(RawStream),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawStream {
    #[serde(rename = "type")]
    kind: String,
    arn: ValueSpec,
    #[serde(default)]
    filter_patterns: Vec<toml::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ValueSpec {
    Literal(String),
    Import { import: String },
    Builtin { builtin: Builtin },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Builtin {
    Stage,
    Service,
    Region,
}

impl ValueSpec {
    fn resolve(self, ctx: &LoadContext<'_>) -> Result<Value> {
        Ok(match self {
            ValueSpec::Literal(text) => Value::Literal(text),
            ValueSpec::Import { import } => Value::import(ctx.prefix.qualify(&import)?),
            ValueSpec::Builtin { builtin } => Value::literal(match builtin {
                Builtin::Stage => ctx.prefix.stage().as_str(),
                Builtin::Service => ctx.prefix.service(),
                Builtin::Region => ctx.region,
            }),
        })
    }
}

/// Parse registry text. `source` names the registry in errors.
pub fn parse_registry(source: &str, text: &str, ctx: &LoadContext<'_>) -> Result<FunctionRegistry> {
    let raw: BTreeMap<String, RawFunction> = toml::from_str(text).map_err(|e| {
        ComposeError::invalid_manifest(format!("failed to parse registry `{}`: {}", source, e.message()))
    })?;

    let mut registry = FunctionRegistry::new(source);
    for (name, function) in raw {
        let descriptor = convert(source, &name, function, ctx)?;
        registry.insert(name, descriptor)?;
    }

    tracing::debug!(source, count = registry.len(), "parsed function registry");
    Ok(registry)
}

fn convert(
    source: &str,
    name: &str,
    raw: RawFunction,
    ctx: &LoadContext<'_>,
) -> Result<FunctionDescriptor> {
    if name.is_empty() {
        return Err(ComposeError::invalid_manifest(format!(
            "registry `{}` declares a function with an empty name",
            source
        )));
    }
    if raw.handler.is_some() == raw.image.is_some() {
        return Err(ComposeError::invalid_manifest(format!(
            "function `{}` in `{}` needs exactly one of `handler` or `image`",
            name, source
        )));
    }
    if raw.image_path.is_some() && raw.image.is_none() {
        return Err(ComposeError::invalid_manifest(format!(
            "function `{}` in `{}` sets `image-path` without an `image`",
            name, source
        )));
    }

    let mut environment = BTreeMap::new();
    for (key, spec) in raw.environment {
        environment.insert(key, spec.resolve(ctx)?);
    }

    let mut events = Vec::with_capacity(raw.events.len());
    for event in raw.events {
        events.push(match event {
            RawTrigger::HttpApi(route) => {
                check_route(source, name, &route)?;
                Trigger::HttpApi(route)
            }
            RawTrigger::Stream(stream) => Trigger::Stream(StreamTrigger {
                kind: stream.kind,
                arn: stream.arn.resolve(ctx)?,
                filter_patterns: stream
                    .filter_patterns
                    .into_iter()
                    .map(serde_json::to_value)
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|e| {
                        ComposeError::invalid_manifest(format!(
                            "function `{}` in `{}` has an invalid filter pattern: {}",
                            name, source, e
                        ))
                    })?,
            }),
        });
    }

    Ok(FunctionDescriptor {
        handler: raw.handler,
        image: raw.image,
        image_path: raw.image_path,
        runtime: raw.runtime,
        timeout: raw.timeout,
        environment,
        events,
    })
}

fn check_route(source: &str, name: &str, route: &HttpRoute) -> Result<()> {
    match route.path() {
        Some(path) if path.starts_with('/') => Ok(()),
        _ => Err(ComposeError::invalid_manifest(format!(
            "function `{}` in `{}` has an http route without a `/path`",
            name, source
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stage::Stage;
    use serde_json::json;

    fn prefix() -> Prefix {
        Prefix::new("svc", &Stage::new("dev").unwrap()).unwrap()
    }

    fn parse(text: &str) -> Result<FunctionRegistry> {
        let prefix = prefix();
        let ctx = LoadContext {
            prefix: &prefix,
            region: "eu-north-1",
        };
        parse_registry("test.toml", text, &ctx)
    }

    #[test]
    fn test_parse_stream_trigger_import() {
        let registry = parse(
            r#"
[imageDownloadHandler]
image = "image-download-handler"
runtime = "python3.8"
timeout = 30

[[imageDownloadHandler.events]]
stream = { type = "dynamodb", arn = { import = "ProductsTableStreamArn" }, filter-patterns = [{ eventName = ["INSERT"] }] }
"#,
        )
        .unwrap();

        let (name, descriptor) = registry.iter().next().unwrap();
        assert_eq!(name, "imageDownloadHandler");
        match &descriptor.events[0] {
            Trigger::Stream(stream) => {
                assert_eq!(stream.arn.export_name(), Some("svc-dev-ProductsTableStreamArn"));
                assert_eq!(stream.filter_patterns, vec![json!({ "eventName": ["INSERT"] })]);
            }
            other => panic!("unexpected trigger {:?}", other),
        }
    }

    #[test]
    fn test_environment_builtins() {
        let registry = parse(
            r#"
[api]
image = "juomaranking-api"
environment = { STAGE = { builtin = "stage" }, REGION = { builtin = "region" }, MODE = "fast", POOL = { import = "UserPoolId" } }
events = [{ http-api = { method = "any", path = "/{proxy+}" } }]
"#,
        )
        .unwrap();

        let (_, api) = registry.iter().next().unwrap();
        assert_eq!(api.environment["STAGE"], Value::literal("dev"));
        assert_eq!(api.environment["REGION"], Value::literal("eu-north-1"));
        assert_eq!(api.environment["MODE"], Value::literal("fast"));
        assert_eq!(api.environment["POOL"].export_name(), Some("svc-dev-UserPoolId"));
    }

    #[test]
    fn test_names_ordered_by_name() {
        let registry = parse(
            r#"
[zeta]
handler = "z.main"

[alpha]
handler = "a.main"
"#,
        )
        .unwrap();
        let names: Vec<_> = registry.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_handler_and_image_exclusive() {
        let err = parse("[f]\nhandler = \"a.main\"\nimage = \"img\"\n").unwrap_err();
        assert!(matches!(err, ComposeError::InvalidManifest { .. }));

        let err = parse("[f]\nruntime = \"nodejs16.x\"\n").unwrap_err();
        assert!(matches!(err, ComposeError::InvalidManifest { .. }));
    }

    #[test]
    fn test_image_path_needs_image() {
        let registry = parse("[api]\nimage = \"juomaranking-api\"\nimage-path = \"./src/functions/app\"\n").unwrap();
        let (_, api) = registry.iter().next().unwrap();
        assert_eq!(api.image_path.as_deref(), Some("./src/functions/app"));

        let err = parse("[f]\nhandler = \"a.main\"\nimage-path = \"./f\"\n").unwrap_err();
        assert!(matches!(err, ComposeError::InvalidManifest { .. }));
    }

    #[test]
    fn test_bad_route_rejected() {
        let err = parse("[f]\nhandler = \"a.main\"\nevents = [{ http-api = \"heartbeat\" }]\n").unwrap_err();
        assert!(matches!(err, ComposeError::InvalidManifest { .. }));
    }

    #[test]
    fn test_invalid_toml() {
        let err = parse("[f\n").unwrap_err();
        assert!(matches!(err, ComposeError::InvalidManifest { .. }));
    }

    #[test]
    fn test_empty_import_fragment() {
        let err = parse(
            "[f]\nhandler = \"a.main\"\n[[f.events]]\nstream = { type = \"dynamodb\", arn = { import = \"\" } }\n",
        )
        .unwrap_err();
        assert!(matches!(err, ComposeError::InvalidArgument { .. }));
    }
}
