//! Stage-qualified resource naming.
//!
//! Every derived name has the shape `<service>-<stage>-<fragment>[-<fragment>...]`.
//! Qualification is pure: the same prefix and fragments always produce the
//! same identifier.
//!
//! Fragments are not normalized. Callers supply names that already satisfy
//! the naming rules of the target resource kind (object-store names, for
//! instance, only allow lowercase letters, digits and hyphens). Fragments
//! containing the separator can make distinct tuples collide
//! (`["a-b"]` and `["a", "b"]`), so each caller keeps its fragments distinct.

use std::fmt;

use serde::Serialize;

use crate::core::error::{ComposeError, Result};
use crate::core::stage::Stage;

/// Separator placed between the prefix and each fragment.
pub const SEPARATOR: char = '-';

/// A derived, stage-qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the identifier, returning the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Join a `<service>-<stage>` prefix with one or more fragments.
///
/// Fragment order is preserved. Fails with `InvalidArgument` for an empty
/// prefix, an empty fragment list, or an empty fragment.
///
/// ```
/// use stagecraft::core::naming::qualify;
///
/// let id = qualify("svc-dev", ["public-content", "111122223333"]).unwrap();
/// assert_eq!(id.as_str(), "svc-dev-public-content-111122223333");
/// ```
pub fn qualify<I, S>(prefix: &str, fragments: I) -> Result<Identifier>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if prefix.is_empty() {
        return Err(ComposeError::invalid_argument("prefix must not be empty"));
    }

    let mut name = String::from(prefix);
    let mut count = 0usize;
    for fragment in fragments {
        let fragment = fragment.as_ref();
        if fragment.is_empty() {
            return Err(ComposeError::invalid_argument(format!(
                "fragment {} after `{}` is empty",
                count, prefix
            )));
        }
        name.push(SEPARATOR);
        name.push_str(fragment);
        count += 1;
    }

    if count == 0 {
        return Err(ComposeError::invalid_argument(format!(
            "no fragments given to qualify `{}`",
            prefix
        )));
    }

    Ok(Identifier(name))
}

/// The `<service>-<stage>` prefix shared by every name of one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Prefix {
    service: String,
    stage: Stage,
    joined: String,
}

impl Prefix {
    /// Build the prefix for a service deployed to `stage`.
    pub fn new(service: &str, stage: &Stage) -> Result<Self> {
        if service.is_empty() {
            return Err(ComposeError::invalid_argument("service name must not be empty"));
        }

        Ok(Prefix {
            service: service.to_string(),
            stage: stage.clone(),
            joined: format!("{}{}{}", service, SEPARATOR, stage),
        })
    }

    /// The joined `<service>-<stage>` text.
    pub fn as_str(&self) -> &str {
        &self.joined
    }

    /// The service name.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// The deployment stage.
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Qualify a single fragment.
    pub fn qualify(&self, fragment: &str) -> Result<Identifier> {
        qualify(&self.joined, [fragment])
    }

    /// Qualify an ordered list of fragments.
    pub fn qualify_all<I, S>(&self, fragments: I) -> Result<Identifier>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        qualify(&self.joined, fragments)
    }

    /// `<service>-<stage>-*`, matching every name of this deployment.
    pub fn wildcard(&self) -> String {
        format!("{}{}*", self.joined, SEPARATOR)
    }

    /// `<service>-<stage>-`, the text every scoped name starts with.
    pub fn scope(&self) -> String {
        format!("{}{}", self.joined, SEPARATOR)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualify_single_fragment() {
        let id = qualify("svc-dev", ["products"]).unwrap();
        assert_eq!(id.as_str(), "svc-dev-products");
    }

    #[test]
    fn test_qualify_preserves_fragment_order() {
        let id = qualify("svc-dev", ["public-content", "111122223333"]).unwrap();
        assert_eq!(id.as_str(), "svc-dev-public-content-111122223333");

        let reversed = qualify("svc-dev", ["111122223333", "public-content"]).unwrap();
        assert_ne!(id, reversed);
    }

    #[test]
    fn test_qualify_is_deterministic() {
        let fragments = vec!["UserPoolId".to_string()];
        let a = qualify("svc-dev", &fragments).unwrap();
        let b = qualify("svc-dev", &fragments).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_qualify_rejects_empty_input() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            qualify("svc-dev", empty),
            Err(ComposeError::InvalidArgument { .. })
        ));
        assert!(matches!(
            qualify("", ["products"]),
            Err(ComposeError::InvalidArgument { .. })
        ));
        assert!(matches!(
            qualify("svc-dev", ["products", ""]),
            Err(ComposeError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_prefix() {
        let stage = Stage::new("prod").unwrap();
        let prefix = Prefix::new("svc", &stage).unwrap();

        assert_eq!(prefix.as_str(), "svc-prod");
        assert_eq!(prefix.wildcard(), "svc-prod-*");
        assert_eq!(prefix.scope(), "svc-prod-");
        assert_eq!(prefix.qualify("users").unwrap().as_str(), "svc-prod-users");
        assert!(Prefix::new("", &stage).is_err());
    }
}
