//! Namespace handling
//!
//! A [`NamespaceTable`] is owned by a schema root and binds prefixes to
//! URIs. Namespace-qualified tree keys are built with [`qualify`], which
//! combines prefix and local name as `prefix_localName`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::names::validate_ncname;

/// Namespace URI
pub type NamespaceUri = String;

/// Namespace prefix
pub type Prefix = String;

/// Separator placed between prefix and local name in qualified keys
pub const QUALIFIED_KEY_SEPARATOR: char = '_';

/// Prefix to URI bindings owned by a schema root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceTable {
    prefixes: IndexMap<Prefix, NamespaceUri>,
}

impl NamespaceTable {
    /// Create a new empty namespace table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a namespace prefix binding
    pub fn with_prefix(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.prefixes.insert(prefix.into(), uri.into());
        self
    }

    /// Resolve a prefix to its URI
    pub fn resolve(&self, prefix: &str) -> Result<&str> {
        self.prefixes
            .get(prefix)
            .map(|s| s.as_str())
            .ok_or_else(|| Error::namespace(format!("Unknown prefix: '{}'", prefix)))
    }

    /// Iterate over the prefix bindings in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// Returns true if the table has no bindings
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Check that every prefix is an NCName and every URI is non-empty
    pub fn check(&self) -> Result<()> {
        for (prefix, uri) in &self.prefixes {
            validate_ncname(prefix)?;
            if uri.trim().is_empty() {
                return Err(Error::Config(format!(
                    "Namespace prefix '{}' is bound to an empty URI",
                    prefix
                )));
            }
        }
        Ok(())
    }
}

/// Combine an optional prefix and a local name into a tree key.
///
/// Deterministic: the same pair always yields the same key.
pub fn qualify(local_name: &str, prefix: Option<&str>) -> String {
    match prefix {
        Some(p) => format!("{}{}{}", p, QUALIFIED_KEY_SEPARATOR, local_name),
        None => local_name.to_string(),
    }
}
