//! Cache key layout
//!
//! All keys of one entity type live under a namespace:
//!
//! - `{ns}` - set of every cached id
//! - `{ns}:{id}` - encoded projection
//! - `{ns}:{attribute}:{value}` - ids carrying `value` for `attribute`
//! - `{ns}:{id}:idx` - index keys registered for `id`
//!
//! Ids are integers and attribute names are lowercase words, so the second
//! segment alone tells a data or registry key from an index key.

use crate::domain::DomainError;

const REGISTRY_SUFFIX: &str = "idx";

/// Builds the keys for one namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyspace {
    namespace: String,
}

impl Keyspace {
    /// Creates a keyspace; the namespace must be non-empty and free of `:`
    pub fn new(namespace: impl Into<String>) -> Result<Self, DomainError> {
        let namespace = namespace.into();

        if namespace.is_empty() || namespace.contains(':') || namespace.contains(char::is_whitespace)
        {
            return Err(DomainError::configuration(format!(
                "Invalid cache namespace '{}': must be non-empty without ':' or whitespace",
                namespace
            )));
        }

        Ok(Self { namespace })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Key of the set holding every cached id
    pub fn id_set_key(&self) -> String {
        self.namespace.clone()
    }

    /// Key of the projection for `id`
    pub fn primary_key(&self, id: i64) -> String {
        format!("{}:{}", self.namespace, id)
    }

    /// Key of the membership set for an attribute value
    pub fn index_key(&self, attribute: &str, value: &str) -> Result<String, DomainError> {
        validate_attribute(attribute)?;
        Ok(format!("{}:{}:{}", self.namespace, attribute, value))
    }

    /// Key of the reverse registry for `id`
    pub fn registry_key(&self, id: i64) -> String {
        format!("{}:{}:{}", self.namespace, id, REGISTRY_SUFFIX)
    }
}

/// Attribute names are lowercase ASCII words (`name`, `short_code`)
fn validate_attribute(attribute: &str) -> Result<(), DomainError> {
    let starts_with_letter = attribute
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase());
    let word = attribute
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if !starts_with_letter || !word {
        return Err(DomainError::validation(format!(
            "Invalid index attribute '{}': expected a lowercase word",
            attribute
        )));
    }

    Ok(())
}
