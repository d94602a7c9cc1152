//! Least-privilege access policy composition.
//!
//! Statements are grouped per resource category with every resource
//! pattern scoped to the deployment prefix, so one stage can never touch
//! another stage's resources.

pub mod catalogue;

use serde::Serialize;

use crate::core::error::Result;
use crate::core::naming::Prefix;
use crate::core::value::Value;
use crate::stack::exports;

pub use catalogue::{audit_policy, required_access, Category, RequiredAccess, COMPUTE_ACTIONS};

/// Storage actions invoked by compute units.
pub const STORAGE_ACTIONS: &[&str] = &[
    "dynamodb:Query",
    "dynamodb:Scan",
    "dynamodb:GetItem",
    "dynamodb:UpdateItem",
    "dynamodb:DeleteItem",
    "dynamodb:PutItem",
    "dynamodb:DescribeTable",
    "dynamodb:BatchGetItem",
    "dynamodb:BatchWriteItem",
];

/// Object-store actions invoked by compute units.
pub const OBJECT_STORE_ACTIONS: &[&str] = &["s3:PutObject"];

/// The identity provider's admin API has no finer grouping than the service.
pub const IDENTITY_ACTIONS: &[&str] = &["cognito-idp:*"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// One access-control rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyStatement {
    #[serde(rename = "Effect")]
    pub effect: Effect,
    #[serde(rename = "Action")]
    pub actions: Vec<String>,
    #[serde(rename = "Resource")]
    pub resources: Vec<Value>,
}

impl PolicyStatement {
    pub fn allow(actions: &[&str], resources: Vec<Value>) -> Self {
        PolicyStatement {
            effect: Effect::Allow,
            actions: actions.iter().map(|a| a.to_string()).collect(),
            resources,
        }
    }

    /// Whether this statement grants `action` on `resource`.
    ///
    /// Actions and text resources match as glob patterns; imported
    /// resources match by export name.
    pub fn covers(&self, action: &str, resource: &Value) -> bool {
        self.effect == Effect::Allow
            && self.actions.iter().any(|pattern| matches(pattern, action))
            && self.resources.iter().any(|pattern| resource_matches(pattern, resource))
    }

    /// Whether every resource pattern names only `<service>-<stage>-` resources.
    ///
    /// The resource-name segment of each ARN must start with the scope, so
    /// neither another service's names nor a leading wildcard pass.
    pub fn is_scoped_to(&self, prefix: &Prefix) -> bool {
        let scope = prefix.scope();
        !self.resources.is_empty()
            && self.resources.iter().all(|resource| match resource {
                Value::ImportRef(name) => name.as_str().starts_with(&scope),
                Value::Literal(text) | Value::Sub(text) => {
                    resource_name(text).map_or(false, |name| name.starts_with(&scope))
                }
                _ => false,
            })
    }
}

/// Object-store ARNs name the bucket right after this.
const OBJECT_STORE_ARN: &str = "arn:aws:s3:::";

/// Table ARNs name the table right after this.
const TABLE_SEGMENT: &str = ":table/";

/// The resource name of a table or object-store ARN.
fn resource_name(arn: &str) -> Option<&str> {
    if let Some(name) = arn.strip_prefix(OBJECT_STORE_ARN) {
        return Some(name);
    }
    if !arn.starts_with("arn:aws:dynamodb:") {
        return None;
    }
    arn.find(TABLE_SEGMENT).map(|at| &arn[at + TABLE_SEGMENT.len()..])
}

fn matches(pattern: &str, text: &str) -> bool {
    glob::Pattern::new(pattern)
        .map(|p| p.matches(text))
        .unwrap_or(false)
}

fn resource_matches(pattern: &Value, resource: &Value) -> bool {
    match (pattern, resource) {
        (Value::ImportRef(a), Value::ImportRef(b)) => a == b,
        (pattern, resource) => match (pattern.as_text(), resource.as_text()) {
            (Some(pattern), Some(resource)) => matches(pattern, resource),
            _ => false,
        },
    }
}

/// Table ARN template for a table name or name pattern.
pub fn table_arn(table: &str) -> String {
    format!(
        "arn:aws:dynamodb:${{AWS::Region}}:${{AWS::AccountId}}{}{}",
        TABLE_SEGMENT, table
    )
}

/// Build the policy statements for one deployment prefix.
pub fn build_policy_statements(prefix: &Prefix) -> Result<Vec<PolicyStatement>> {
    let tables = table_arn(&prefix.wildcard());
    let statements = vec![
        PolicyStatement::allow(
            STORAGE_ACTIONS,
            vec![Value::sub(tables.clone()), Value::sub(format!("{}/index/*", tables))],
        ),
        PolicyStatement::allow(
            OBJECT_STORE_ACTIONS,
            vec![Value::sub(format!("arn:aws:s3:::{}", prefix.wildcard()))],
        ),
        PolicyStatement::allow(
            IDENTITY_ACTIONS,
            vec![Value::import(prefix.qualify(exports::USER_POOL_ARN)?)],
        ),
    ];

    tracing::debug!(prefix = %prefix, count = statements.len(), "built policy statements");
    Ok(statements)
}
