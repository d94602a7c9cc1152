//! Export name fragments of the permanent stack.
//!
//! These fragments are qualified with the deployment prefix to form export
//! names. They must stay distinct from each other within one stack.

/// Identity pool id.
pub const USER_POOL_ID: &str = "UserPoolId";

/// Identity pool client id.
pub const USER_POOL_CLIENT_ID: &str = "UserPoolClientId";

/// Identity pool ARN, used to scope identity actions.
pub const USER_POOL_ARN: &str = "UserPoolArn";

/// Export fragment for a table's change stream, e.g. `ProductsTableStreamArn`.
pub fn table_stream_arn(entity: &str) -> String {
    format!("{}StreamArn", table_logical_id(entity))
}

/// Logical id of an entity's table, e.g. `price-history` -> `PriceHistoryTable`.
pub fn table_logical_id(entity: &str) -> String {
    format!("{}Table", pascal_case(entity))
}

pub(crate) fn pascal_case(name: &str) -> String {
    name.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
