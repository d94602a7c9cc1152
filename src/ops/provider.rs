//! Provider-level settings that consume the composed environment.
//!
//! The HTTP API authorizer trusts tokens issued by this deployment's
//! identity pool, read through the `user_pool_id` and `user_pool_client_id`
//! environment entries. Container images are collected from the merged
//! registries.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::error::{ComposeError, Result};
use crate::core::value::Value;
use crate::functions::MergedFunctions;
use crate::vars::static_set::{USER_POOL_CLIENT_ID, USER_POOL_ID};

/// Authorizer every protected route refers to.
pub const SERVICE_AUTHORIZER: &str = "serviceAuthorizer";

/// Where the API reads the bearer token from.
pub const IDENTITY_SOURCE: &str = "$request.header.Authorization";

/// Directory images are built from when a registry gives no `image-path`.
pub const DEFAULT_IMAGE_ROOT: &str = "./src/functions";

/// The `httpApi` provider block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpApi {
    pub cors: bool,
    pub authorizers: BTreeMap<String, JwtAuthorizer>,
}

/// A JWT authorizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtAuthorizer {
    pub identity_source: String,
    pub issuer_url: Value,
    pub audience: Vec<Value>,
}

/// The HTTP API of a deployment in `region`.
pub fn http_api(region: &str) -> HttpApi {
    let issuer_url = Value::join(vec![
        Value::literal("https://cognito-idp."),
        Value::literal(region),
        Value::literal(".amazonaws.com/"),
        Value::variable(USER_POOL_ID),
    ]);

    let mut authorizers = BTreeMap::new();
    authorizers.insert(
        SERVICE_AUTHORIZER.to_string(),
        JwtAuthorizer {
            identity_source: IDENTITY_SOURCE.to_string(),
            issuer_url,
            audience: vec![Value::variable(USER_POOL_CLIENT_ID)],
        },
    );

    HttpApi {
        cors: true,
        authorizers,
    }
}

/// A container image and its build context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSpec {
    pub path: String,
}

/// The `ecr` provider block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContainerImages {
    pub images: BTreeMap<String, ImageSpec>,
}

impl ContainerImages {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Collect every image the merged functions run.
///
/// Functions may share an image, but not with different build paths.
pub fn container_images(functions: &MergedFunctions) -> Result<ContainerImages> {
    let mut images: BTreeMap<String, (ImageSpec, &str)> = BTreeMap::new();

    for entry in functions.iter() {
        let Some(ref image) = entry.descriptor.image else {
            continue;
        };
        let path = entry
            .descriptor
            .image_path
            .clone()
            .unwrap_or_else(|| format!("{}/{}", DEFAULT_IMAGE_ROOT, image));

        match images.get(image) {
            Some((existing, owner)) if existing.path != path => {
                return Err(ComposeError::invalid_manifest(format!(
                    "image `{}` is built from `{}` by `{}` but from `{}` by `{}`",
                    image, existing.path, owner, path, entry.name
                )));
            }
            Some(_) => {}
            None => {
                images.insert(image.clone(), (ImageSpec { path }, entry.name.as_str()));
            }
        }
    }

    Ok(ContainerImages {
        images: images
            .into_iter()
            .map(|(name, (spec, _))| (name, spec))
            .collect(),
    })
}
