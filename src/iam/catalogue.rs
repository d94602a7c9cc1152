//! Every action the compute layer performs, and where it performs it.
//!
//! Extending this list is how a new runtime call gets reviewed: the audit
//! below fails until a statement grants the new action.

use crate::core::error::Result;
use crate::core::naming::Prefix;
use crate::core::value::Value;
use crate::iam::{table_arn, PolicyStatement};
use crate::stack::exports;

/// Resource category an action is performed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// A storage table of this deployment
    Storage,
    /// An object in this deployment's bucket
    ObjectStore,
    /// This deployment's identity pool
    Identity,
}

/// Actions invoked by compute units, by category.
pub const COMPUTE_ACTIONS: &[(&str, Category)] = &[
    ("dynamodb:GetItem", Category::Storage),
    ("dynamodb:PutItem", Category::Storage),
    ("dynamodb:UpdateItem", Category::Storage),
    ("dynamodb:DeleteItem", Category::Storage),
    ("dynamodb:Query", Category::Storage),
    ("dynamodb:Scan", Category::Storage),
    ("dynamodb:DescribeTable", Category::Storage),
    ("dynamodb:BatchGetItem", Category::Storage),
    ("dynamodb:BatchWriteItem", Category::Storage),
    ("s3:PutObject", Category::ObjectStore),
    ("cognito-idp:AdminCreateUser", Category::Identity),
    ("cognito-idp:AdminDisableUser", Category::Identity),
    ("cognito-idp:AdminInitiateAuth", Category::Identity),
    ("cognito-idp:AdminSetUserPassword", Category::Identity),
];

/// A concrete action on a concrete resource.
#[derive(Debug, Clone, PartialEq)]
pub struct RequiredAccess {
    pub action: &'static str,
    pub resource: Value,
}

/// Expand the catalogue against one deployment.
///
/// Storage actions are required on every entity's table; object-store
/// actions on an object of `bucket_name`.
pub fn required_access<'a>(
    prefix: &Prefix,
    entities: impl IntoIterator<Item = &'a str> + Clone,
    bucket_name: &str,
) -> Result<Vec<RequiredAccess>> {
    let pool = Value::import(prefix.qualify(exports::USER_POOL_ARN)?);

    let mut required = Vec::new();
    for &(action, category) in COMPUTE_ACTIONS {
        match category {
            Category::Storage => {
                for entity in entities.clone() {
                    let table = prefix.qualify(entity)?;
                    required.push(RequiredAccess {
                        action,
                        resource: Value::sub(table_arn(table.as_str())),
                    });
                }
            }
            Category::ObjectStore => required.push(RequiredAccess {
                action,
                resource: Value::sub(format!("arn:aws:s3:::{}/uploads/object", bucket_name)),
            }),
            Category::Identity => required.push(RequiredAccess {
                action,
                resource: pool.clone(),
            }),
        }
    }
    Ok(required)
}

/// Required accesses no statement grants.
pub fn audit_policy<'a>(
    statements: &[PolicyStatement],
    required: &'a [RequiredAccess],
) -> Vec<&'a RequiredAccess> {
    required
        .iter()
        .filter(|access| !statements.iter().any(|s| s.covers(access.action, &access.resource)))
        .collect()
}
