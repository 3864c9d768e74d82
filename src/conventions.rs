//! Tree key conventions
//!
//! A document codec turns XML into a tree by following a small set of
//! naming conventions. The mapper has to follow the same ones when it
//! looks up and builds keys:
//!
//! - Elements are keyed by their qualified name (`prefix_local` or `local`)
//! - Attributes are keyed by the attribute prefix plus their qualified name
//! - The text of a mixed-content element lives in a reserved slot key

use serde::{Deserialize, Serialize};

use crate::namespaces::qualify;
use crate::schema::SchemaNode;

/// Default prefix for attribute keys
pub const DEFAULT_ATTR_PREFIX: &str = "attr_";

/// Default key of the mixed-content element-value slot
pub const DEFAULT_ELEMENT_VALUE_KEY: &str = "_ELEMVAL";

/// Naming conventions shared by the codec and the mapper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeyConventions {
    /// Prefix for attribute keys
    attr_prefix: String,
    /// Key of the element-value slot
    element_value_key: String,
}

impl Default for KeyConventions {
    fn default() -> Self {
        Self {
            attr_prefix: DEFAULT_ATTR_PREFIX.to_string(),
            element_value_key: DEFAULT_ELEMENT_VALUE_KEY.to_string(),
        }
    }
}

impl KeyConventions {
    /// Create conventions with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the attribute prefix
    pub fn attr_prefix(&self) -> &str {
        &self.attr_prefix
    }

    /// Get the element-value slot key
    pub fn element_value_key(&self) -> &str {
        &self.element_value_key
    }

    /// Set attribute prefix
    pub fn with_attr_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.attr_prefix = prefix.into();
        self
    }

    /// Set element-value slot key
    pub fn with_element_value_key(mut self, key: impl Into<String>) -> Self {
        self.element_value_key = key.into();
        self
    }

    /// Key of an element child
    pub fn element_key(&self, local_name: &str, prefix: Option<&str>) -> String {
        qualify(local_name, prefix)
    }

    /// Key of an attribute child
    pub fn attribute_key(&self, local_name: &str, prefix: Option<&str>) -> String {
        format!("{}{}", self.attr_prefix, qualify(local_name, prefix))
    }

    /// Key of a schema node inside its parent object.
    ///
    /// The namespace prefix is used as-is; resolve it first with
    /// [`SchemaModel::key_for`](crate::schema::SchemaModel::key_for).
    pub fn key_for(&self, node: &SchemaNode) -> String {
        if node.is_attribute {
            self.attribute_key(&node.name, node.namespace.as_deref())
        } else {
            self.element_key(&node.name, node.namespace.as_deref())
        }
    }
}
