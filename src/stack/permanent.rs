//! The permanent stack: long-lived storage, identity, and content delivery.
//!
//! Table and bucket names point at composed environment variables so the
//! topology text stays stage-agnostic; the provisioning engine substitutes
//! them at deploy time.

use serde_json::{json, Value as Json};

use crate::core::error::Result;
use crate::core::manifest::{Manifest, TableSpec};
use crate::core::naming::Prefix;
use crate::core::value::Value;
use crate::stack::exports::{self, pascal_case};
use crate::stack::{Output, ResourceDescriptor, ResourceKind, Stack};
use crate::vars::static_set::{bucket_variable, table_variable};

/// Name of the permanent stack.
pub const PERMANENT_STACK: &str = "permanent";

/// Logical id of the identity pool.
pub const USER_POOL: &str = "CognitoUserPool";

/// Logical id of the identity pool client.
pub const USER_POOL_CLIENT: &str = "UserPoolClient";

/// Logical id of the distribution cache policy.
pub const CACHE_POLICY: &str = "DistributionCachePolicy";

const SIX_MONTHS_SECS: u64 = 15_778_463;
const ONE_YEAR_SECS: u64 = 31_536_000;

/// Build the permanent stack for one deployment prefix.
pub fn permanent_stack(prefix: &Prefix, manifest: &Manifest) -> Result<Stack> {
    let mut stack = Stack::new(PERMANENT_STACK);

    for table in &manifest.tables {
        stack.add_resource(table_resource(table))?;
    }

    add_identity(&mut stack, prefix, manifest)?;
    add_content(&mut stack, prefix, &manifest.content.bucket)?;

    stack.add_output(Output::new(
        exports::USER_POOL_ID,
        "ID of the User Pool",
        Value::reference(USER_POOL),
        prefix.qualify(exports::USER_POOL_ID)?,
    ))?;
    stack.add_output(Output::new(
        exports::USER_POOL_CLIENT_ID,
        "ID of the User Pool Client",
        Value::reference(USER_POOL_CLIENT),
        prefix.qualify(exports::USER_POOL_CLIENT_ID)?,
    ))?;
    stack.add_output(Output::new(
        exports::USER_POOL_ARN,
        "ARN of the User Pool",
        Value::attribute(USER_POOL, "Arn"),
        prefix.qualify(exports::USER_POOL_ARN)?,
    ))?;

    for table in manifest.tables.iter().filter(|t| t.stream.is_some()) {
        let fragment = exports::table_stream_arn(&table.entity);
        stack.add_output(Output::new(
            fragment.clone(),
            format!("{} table stream arn", pascal_case(&table.entity)),
            Value::attribute(exports::table_logical_id(&table.entity), "StreamArn"),
            prefix.qualify(&fragment)?,
        ))?;
    }

    stack.validate()?;

    tracing::debug!(
        resources = stack.resources().len(),
        outputs = stack.outputs().len(),
        "built permanent stack"
    );
    Ok(stack)
}

fn table_resource(table: &TableSpec) -> ResourceDescriptor {
    let mut attributes = vec![json!({ "AttributeName": table.hash_key, "AttributeType": "S" })];
    let mut key_schema = vec![json!({ "AttributeName": table.hash_key, "KeyType": "HASH" })];

    if let Some(ref range_key) = table.range_key {
        attributes.push(json!({ "AttributeName": range_key, "AttributeType": "S" }));
        key_schema.push(json!({ "AttributeName": range_key, "KeyType": "RANGE" }));
    }

    let mut properties = json!({
        "TableName": Value::variable(table_variable(&table.entity)),
        "AttributeDefinitions": attributes,
        "KeySchema": key_schema,
    });

    match table.capacity {
        Some(capacity) => {
            properties["ProvisionedThroughput"] = json!({
                "ReadCapacityUnits": capacity.read,
                "WriteCapacityUnits": capacity.write,
            });
        }
        None => properties["BillingMode"] = Json::from("PAY_PER_REQUEST"),
    }

    if let Some(view) = table.stream {
        properties["StreamSpecification"] = json!({ "StreamViewType": view.as_str() });
    }

    ResourceDescriptor::new(
        exports::table_logical_id(&table.entity),
        ResourceKind::StorageTable,
        properties,
    )
}

fn add_identity(stack: &mut Stack, prefix: &Prefix, manifest: &Manifest) -> Result<()> {
    stack.add_resource(ResourceDescriptor::new(
        USER_POOL,
        ResourceKind::IdentityPool,
        json!({
            "UserPoolName": prefix.as_str(),
            "UsernameConfiguration": { "CaseSensitive": false },
            "Schema": [{ "Name": "email", "Required": true, "Mutable": true }],
            "Policies": {
                "PasswordPolicy": {
                    "MinimumLength": 6,
                    "RequireLowercase": false,
                    "RequireUppercase": false,
                    "RequireNumbers": false,
                    "RequireSymbols": false,
                }
            },
            "AutoVerifiedAttributes": ["email"],
            "MfaConfiguration": "OFF",
        }),
    ))?;

    for group in &manifest.identity.groups {
        let mut properties = json!({
            "GroupName": group.name,
            "UserPoolId": Value::reference(USER_POOL),
        });
        if let Some(ref description) = group.description {
            properties["Description"] = Json::from(description.as_str());
        }
        stack.add_resource(ResourceDescriptor::new(
            format!("{}UserGroup", pascal_case(&group.name)),
            ResourceKind::IdentityPoolGroup,
            properties,
        ))?;
    }

    stack.add_resource(ResourceDescriptor::new(
        USER_POOL_CLIENT,
        ResourceKind::IdentityPoolClient,
        json!({
            "ClientName": prefix.qualify(&manifest.identity.client)?,
            "UserPoolId": Value::reference(USER_POOL),
            "ExplicitAuthFlows": ["ALLOW_ADMIN_USER_PASSWORD_AUTH", "ALLOW_REFRESH_TOKEN_AUTH"],
        }),
    ))
}

fn add_content(stack: &mut Stack, prefix: &Prefix, bucket: &str) -> Result<()> {
    let bucket_id = format!("{}Bucket", pascal_case(bucket));

    stack.add_resource(ResourceDescriptor::new(
        bucket_id.clone(),
        ResourceKind::ObjectStore,
        json!({
            "BucketName": Value::variable(bucket_variable(bucket)),
            "AccessControl": "PublicRead",
            "OwnershipControls": { "Rules": [{ "ObjectOwnership": "BucketOwnerPreferred" }] },
        }),
    ))?;

    stack.add_resource(ResourceDescriptor::new(
        format!("{}Policy", bucket_id),
        ResourceKind::ObjectStorePolicy,
        json!({
            "Bucket": Value::reference(&bucket_id),
            "PolicyDocument": {
                "Version": "2012-10-17",
                "Statement": [{
                    "Sid": "AddPerm",
                    "Effect": "Allow",
                    "Principal": "*",
                    "Action": ["s3:GetObject"],
                    "Resource": [Value::join(vec![
                        Value::attribute(&bucket_id, "Arn"),
                        Value::literal("/*"),
                    ])],
                }],
            },
        }),
    ))?;

    stack.add_resource(ResourceDescriptor::new(
        CACHE_POLICY,
        ResourceKind::CachePolicy,
        json!({
            "CachePolicyConfig": {
                "Name": prefix.qualify("cache-policy")?,
                "DefaultTTL": SIX_MONTHS_SECS,
                "MinTTL": SIX_MONTHS_SECS,
                "MaxTTL": ONE_YEAR_SECS,
                "ParametersInCacheKeyAndForwardedToOrigin": {
                    "CookiesConfig": { "CookieBehavior": "none" },
                    "EnableAcceptEncodingBrotli": "true",
                    "EnableAcceptEncodingGzip": "true",
                    "HeadersConfig": { "HeaderBehavior": "none" },
                    "QueryStringsConfig": { "QueryStringBehavior": "none" },
                },
            },
        }),
    ))?;

    stack.add_resource(ResourceDescriptor::new(
        format!("{}Distribution", pascal_case(bucket)),
        ResourceKind::Distribution,
        json!({
            "DistributionConfig": {
                "Origins": [{
                    "DomainName": Value::attribute(&bucket_id, "RegionalDomainName"),
                    "Id": bucket_id,
                    "CustomOriginConfig": {
                        "HTTPPort": 80,
                        "HTTPSPort": 443,
                        "OriginProtocolPolicy": "https-only",
                    },
                }],
                "Enabled": "true",
                "PriceClass": "PriceClass_100",
                "DefaultCacheBehavior": {
                    "AllowedMethods": ["GET", "HEAD", "OPTIONS"],
                    "TargetOriginId": bucket_id,
                    "CachePolicyId": Value::reference(CACHE_POLICY),
                    "ViewerProtocolPolicy": "https-only",
                },
            },
        }),
    ))
}
