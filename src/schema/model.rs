//! Schema nodes and models

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::conventions::KeyConventions;
use crate::error::{Error, Result};
use crate::names::validate_ncname;
use crate::namespaces::{NamespaceTable, Prefix};

/// Shape of a schema node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    /// Single non-structured value
    Scalar,
    /// Nested object
    Object,
    /// Repeated element: array of objects
    Array,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Scalar => "scalar",
            NodeKind::Object => "object",
            NodeKind::Array => "array of objects",
        };
        f.write_str(s)
    }
}

/// Declared type of a scalar (or of a mixed-content slot)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalarType {
    /// Any scalar
    #[default]
    Any,
    /// String scalar
    String,
    /// Numeric scalar
    Number,
    /// Boolean scalar
    Boolean,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScalarType::Any => "scalar",
            ScalarType::String => "string",
            ScalarType::Number => "number",
            ScalarType::Boolean => "boolean",
        };
        f.write_str(s)
    }
}

fn default_required() -> bool {
    true
}

/// A node of a schema tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    /// Local name
    pub name: String,
    /// Namespace prefix, bound by the owning model's namespace table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<Prefix>,
    /// Node shape
    pub kind: NodeKind,
    /// Whether the node is an attribute
    #[serde(default)]
    pub is_attribute: bool,
    /// Whether the node carries an element-value slot alongside its attributes
    #[serde(default)]
    pub has_mixed_content: bool,
    /// Whether the node must be present
    #[serde(default = "default_required")]
    pub required: bool,
    /// Declared type of a scalar node or of the element-value slot
    #[serde(default)]
    pub scalar_type: ScalarType,
    /// Ordered children of object and array nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SchemaNode>,
}

impl SchemaNode {
    fn with_kind(name: impl Into<String>, kind: NodeKind, children: Vec<SchemaNode>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            kind,
            is_attribute: false,
            has_mixed_content: false,
            required: true,
            scalar_type: ScalarType::Any,
            children,
        }
    }

    /// Create a scalar node
    pub fn scalar(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Scalar, Vec::new())
    }

    /// Create an object node
    pub fn object(name: impl Into<String>, children: Vec<SchemaNode>) -> Self {
        Self::with_kind(name, NodeKind::Object, children)
    }

    /// Create an array-of-object node
    pub fn array(name: impl Into<String>, children: Vec<SchemaNode>) -> Self {
        Self::with_kind(name, NodeKind::Array, children)
    }

    /// Mark as an attribute
    pub fn attribute(mut self) -> Self {
        self.is_attribute = true;
        self
    }

    /// Mark as mixed content
    pub fn mixed(mut self) -> Self {
        self.has_mixed_content = true;
        self
    }

    /// Mark as optional
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set the namespace prefix
    pub fn in_namespace(mut self, prefix: impl Into<String>) -> Self {
        self.namespace = Some(prefix.into());
        self
    }

    /// Set the scalar type
    pub fn typed(mut self, scalar_type: ScalarType) -> Self {
        self.scalar_type = scalar_type;
        self
    }

    /// Find a child by local name, prefix and attribute flag
    pub fn find_child(&self, name: &str, prefix: Option<&str>, is_attribute: bool) -> Option<&SchemaNode> {
        self.children.iter().find(|c| {
            c.name == name && c.namespace.as_deref() == prefix && c.is_attribute == is_attribute
        })
    }

    /// Key of the directive driving this node in its parent's table
    pub fn directive_key(&self) -> String {
        if self.is_attribute {
            format!("@{}", self.name)
        } else {
            self.name.clone()
        }
    }

    /// Step label used in diagnostic paths
    pub fn label(&self) -> String {
        match (&self.namespace, self.is_attribute) {
            (Some(p), true) => format!("@{}:{}", p, self.name),
            (Some(p), false) => format!("{}:{}", p, self.name),
            (None, true) => format!("@{}", self.name),
            (None, false) => self.name.clone(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSchemaModel {
    #[serde(default)]
    namespaces: NamespaceTable,
    root: SchemaNode,
}

/// A checked schema: root node plus its namespace table.
///
/// Immutable once built; shared read-only across mapping calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSchemaModel")]
pub struct SchemaModel {
    namespaces: NamespaceTable,
    root: SchemaNode,
}

impl TryFrom<RawSchemaModel> for SchemaModel {
    type Error = Error;

    fn try_from(raw: RawSchemaModel) -> Result<Self> {
        SchemaModel::new(raw.root, raw.namespaces)
    }
}

impl SchemaModel {
    /// Build a model, checking names, sibling uniqueness and namespace bindings
    pub fn new(root: SchemaNode, namespaces: NamespaceTable) -> Result<Self> {
        namespaces.check()?;

        if root.kind != NodeKind::Object || root.is_attribute {
            return Err(Error::Config(format!(
                "Schema root '{}' must be an object element",
                root.name
            )));
        }

        let model = Self { namespaces, root };
        model.check_node(&model.root)?;
        Ok(model)
    }

    /// Get the root node
    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    /// Get the namespace table
    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    /// Key of a node, after resolving its namespace prefix
    pub fn key_for(&self, node: &SchemaNode, conventions: &KeyConventions) -> Result<String> {
        if let Some(prefix) = &node.namespace {
            self.namespaces.resolve(prefix)?;
        }
        Ok(conventions.key_for(node))
    }

    /// Number of nodes in the schema
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Check that no two siblings share a tree key under `conventions`.
    ///
    /// Distinct nodes can still collide once keyed, e.g. an element named
    /// `attr_x` next to an attribute `x`, or an element `a_b` next to an
    /// element `b` in namespace `a`.
    pub fn check_keys(&self, conventions: &KeyConventions) -> Result<()> {
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            let mut keys: HashMap<String, String> = HashMap::new();
            if node.has_mixed_content {
                keys.insert(conventions.element_value_key().to_string(), "$".to_string());
            }
            for child in &node.children {
                let key = conventions.key_for(child);
                if let Some(other) = keys.insert(key.clone(), child.label()) {
                    return Err(Error::Config(format!(
                        "'{}' and '{}' under '{}' both map to key '{}'",
                        other,
                        child.label(),
                        node.name,
                        key
                    )));
                }
                stack.push(child);
            }
        }
        Ok(())
    }

    fn check_node(&self, node: &SchemaNode) -> Result<()> {
        validate_ncname(&node.name)?;

        if let Some(prefix) = &node.namespace {
            self.namespaces.resolve(prefix).map_err(|_| {
                Error::namespace(format!(
                    "Prefix '{}' of node '{}' is not bound in the schema namespace table",
                    prefix, node.name
                ))
            })?;
        }

        match node.kind {
            NodeKind::Scalar => {
                if !node.children.is_empty() {
                    return Err(Error::Config(format!("Scalar node '{}' cannot have children", node.name)));
                }
                if node.has_mixed_content {
                    return Err(Error::Config(format!(
                        "Scalar node '{}' cannot have mixed content",
                        node.name
                    )));
                }
            }
            NodeKind::Object | NodeKind::Array => {
                if node.is_attribute {
                    return Err(Error::Config(format!("Attribute '{}' must be a scalar", node.name)));
                }
                if node.kind == NodeKind::Array && node.has_mixed_content {
                    return Err(Error::Config(format!(
                        "Array node '{}' cannot have mixed content",
                        node.name
                    )));
                }
            }
        }

        let mut seen = HashSet::new();
        for child in &node.children {
            if !seen.insert((child.is_attribute, child.name.as_str())) {
                return Err(Error::Config(format!(
                    "Duplicate {} '{}' under '{}'",
                    if child.is_attribute { "attribute" } else { "element" },
                    child.name,
                    node.name
                )));
            }
            self.check_node(child)?;
        }

        Ok(())
    }
}
