//! Static variables derived from the naming convention.
//!
//! Values are identical across stages apart from the stage fragment baked
//! into the prefix.

use crate::core::error::{ComposeError, Result};
use crate::core::naming::Prefix;
use crate::core::value::Value;
use crate::stack::exports;

/// Variable holding the identity pool id.
pub const USER_POOL_ID: &str = "user_pool_id";

/// Variable holding the identity pool client id.
pub const USER_POOL_CLIENT_ID: &str = "user_pool_client_id";

/// Variable holding the deployment region.
pub const REGION: &str = "region";

/// Stack-scoped constants passed through or folded into derived names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackConstants {
    /// Account identifier, literal or a provider placeholder such as `${aws:accountId}`
    pub account_id: String,
    /// Deployment region
    pub region: String,
}

/// Variable name of an entity's table, e.g. `products_table_name`.
pub fn table_variable(entity: &str) -> String {
    format!("{}_table_name", entity.replace('-', "_"))
}

/// Variable name of a bucket, e.g. `public_content_bucket_name`.
pub fn bucket_variable(bucket: &str) -> String {
    format!("{}_bucket_name", bucket.replace('-', "_"))
}

/// The fixed set of derived variables, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticVariables {
    entries: Vec<(String, Value)>,
}

impl StaticVariables {
    /// Build the set for one deployment prefix.
    ///
    /// - one `<entity>_table_name` per entity
    /// - the object-store name, with the account id appended because bucket
    ///   names share one namespace across all accounts
    /// - identity pool imports, resolved against the permanent stack's outputs
    /// - the region, passed through unchanged
    pub fn build<'a>(
        prefix: &Prefix,
        constants: &StackConstants,
        entities: impl IntoIterator<Item = &'a str>,
        bucket: &str,
    ) -> Result<Self> {
        let mut vars = StaticVariables::default();

        for entity in entities {
            vars.insert(table_variable(entity), Value::Literal(prefix.qualify(entity)?.into_string()))?;
        }

        let bucket_name = prefix.qualify_all([bucket, constants.account_id.as_str()])?;
        vars.insert(bucket_variable(bucket), Value::Literal(bucket_name.into_string()))?;

        vars.insert(USER_POOL_ID, Value::import(prefix.qualify(exports::USER_POOL_ID)?))?;
        vars.insert(
            USER_POOL_CLIENT_ID,
            Value::import(prefix.qualify(exports::USER_POOL_CLIENT_ID)?),
        )?;
        vars.insert(REGION, Value::literal(&constants.region))?;

        tracing::debug!(prefix = %prefix, count = vars.len(), "built static variables");
        Ok(vars)
    }

    fn insert(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(ComposeError::invalid_argument(format!(
                "static variable `{}` is derived twice",
                name
            )));
        }
        if let Some((existing, _)) = self.entries.iter().find(|(_, v)| *v == value) {
            return Err(ComposeError::invalid_argument(format!(
                "static variables `{}` and `{}` derive the same value",
                existing, name
            )));
        }
        self.entries.push((name, value));
        Ok(())
    }

    /// Look up a variable by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Iterate in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stage::Stage;
    use std::collections::HashSet;

    fn build() -> StaticVariables {
        let prefix = Prefix::new("svc", &Stage::new("dev").unwrap()).unwrap();
        let constants = StackConstants {
            account_id: "111122223333".to_string(),
            region: "eu-north-1".to_string(),
        };
        StaticVariables::build(
            &prefix,
            &constants,
            ["products", "ratings", "pricehistory", "users"],
            "public-content",
        )
        .unwrap()
    }

    #[test]
    fn test_table_names() {
        let vars = build();
        assert_eq!(
            vars.get("products_table_name"),
            Some(&Value::literal("svc-dev-products"))
        );
        assert_eq!(
            vars.get("users_table_name"),
            Some(&Value::literal("svc-dev-users"))
        );
    }

    #[test]
    fn test_bucket_name_carries_account() {
        let vars = build();
        assert_eq!(
            vars.get("public_content_bucket_name"),
            Some(&Value::literal("svc-dev-public-content-111122223333"))
        );
    }

    #[test]
    fn test_identity_values_are_imports() {
        let vars = build();
        assert_eq!(
            vars.get(USER_POOL_ID).and_then(Value::export_name),
            Some("svc-dev-UserPoolId")
        );
        assert_eq!(
            vars.get(USER_POOL_CLIENT_ID).and_then(Value::export_name),
            Some("svc-dev-UserPoolClientId")
        );
        assert_eq!(vars.get(REGION), Some(&Value::literal("eu-north-1")));
    }

    #[test]
    fn test_entries_are_unique() {
        let vars = build();
        assert_eq!(vars.len(), 8);

        let names: HashSet<_> = vars.iter().map(|(n, _)| n).collect();
        assert_eq!(names.len(), vars.len());

        let values: Vec<_> = vars.iter().map(|(_, v)| v).collect();
        for (i, a) in values.iter().enumerate() {
            for b in &values[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_duplicate_entity_is_rejected() {
        let prefix = Prefix::new("svc", &Stage::new("dev").unwrap()).unwrap();
        let constants = StackConstants {
            account_id: "1".to_string(),
            region: "r".to_string(),
        };
        let result = StaticVariables::build(&prefix, &constants, ["users", "users"], "b");
        assert!(matches!(result, Err(ComposeError::InvalidArgument { .. })));
    }

    #[test]
    fn test_table_named_like_bucket_is_rejected() {
        let prefix = Prefix::new("svc", &Stage::new("dev").unwrap()).unwrap();
        let constants = StackConstants {
            account_id: "111122223333".to_string(),
            region: "eu-north-1".to_string(),
        };
        let err = StaticVariables::build(
            &prefix,
            &constants,
            ["public-content-111122223333"],
            "public-content",
        )
        .unwrap_err();

        match err {
            ComposeError::InvalidArgument { message } => {
                assert!(message.contains("public_content_111122223333_table_name"), "{}", message);
                assert!(message.contains("public_content_bucket_name"), "{}", message);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
