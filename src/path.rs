//! Path navigation and projection
//!
//! A [`Path`] is a sequence of child-name steps. Textual syntax:
//!
//! - `a/b/c` element steps, `ns:name` for a namespace-qualified element
//! - `@name` or `@ns:name` for an attribute
//! - `$` for the element-value slot of a mixed-content element (last step only)
//! - a leading `/` anchors the path at the document root instead of the
//!   current fan-out element; `.` or the empty string is the current root
//!
//! Projection walks the schema and the tree in lockstep. Arrays may only
//! be consumed through fan-out: a path that steps *through* an array
//! fails with a path resolution error, and a path that *ends* at an
//! array yields [`Target::List`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::conventions::KeyConventions;
use crate::error::{Error, Result};
use crate::names::{is_valid_ncname, split_qname};
use crate::schema::{NodeKind, SchemaModel, SchemaNode};
use crate::tree::Value;

/// What a path step selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Child element
    Element,
    /// Attribute
    Attribute,
    /// Mixed-content element-value slot
    ElementValue,
}

/// One path step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Local name (empty for the element-value slot)
    pub name: String,
    /// Namespace prefix
    pub prefix: Option<String>,
    /// Step kind
    pub kind: StepKind,
}

impl Step {
    /// Element step
    pub fn element(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            kind: StepKind::Element,
        }
    }

    /// Attribute step
    pub fn attribute(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            kind: StepKind::Attribute,
        }
    }

    /// Element-value slot step
    pub fn element_value() -> Self {
        Self {
            name: String::new(),
            prefix: None,
            kind: StepKind::ElementValue,
        }
    }

    /// Set the namespace prefix
    pub fn in_namespace(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    fn parse(segment: &str) -> Result<Self> {
        if segment == "$" {
            return Ok(Self::element_value());
        }

        let (kind, qname) = match segment.strip_prefix('@') {
            Some(rest) => (StepKind::Attribute, rest),
            None => (StepKind::Element, segment),
        };
        let (prefix, local) = split_qname(qname);

        if !is_valid_ncname(local) || prefix.map_or(false, |p| !is_valid_ncname(p)) {
            return Err(Error::path(format!("Invalid path step: '{}'", segment)));
        }

        Ok(Self {
            name: local.to_string(),
            prefix: prefix.map(str::to_string),
            kind,
        })
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            StepKind::ElementValue => return f.write_str("$"),
            StepKind::Attribute => f.write_str("@")?,
            StepKind::Element => {}
        }
        if let Some(prefix) = &self.prefix {
            write!(f, "{}:", prefix)?;
        }
        f.write_str(&self.name)
    }
}

/// A source path
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Path {
    absolute: bool,
    steps: Vec<Step>,
}

impl Path {
    /// Path relative to the current root
    pub fn relative(steps: Vec<Step>) -> Self {
        Self { absolute: false, steps }
    }

    /// Path anchored at the document root
    pub fn absolute(steps: Vec<Step>) -> Self {
        Self { absolute: true, steps }
    }

    /// Parse the textual syntax
    pub fn parse(text: &str) -> Result<Self> {
        let (absolute, body) = match text.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, text),
        };

        let mut steps = Vec::new();
        if !body.is_empty() && body != "." {
            for segment in body.split('/') {
                if segment.is_empty() {
                    return Err(Error::path(format!("Empty step in path '{}'", text)));
                }
                steps.push(Step::parse(segment)?);
            }
        }

        let path = Self { absolute, steps };
        path.check()?;
        Ok(path)
    }

    fn check(&self) -> Result<()> {
        let slot = self.steps.iter().position(|s| s.kind == StepKind::ElementValue);
        match slot {
            Some(i) if i + 1 != self.steps.len() => Err(Error::path(format!(
                "Element-value step must be the last step of '{}'",
                self
            ))),
            _ => Ok(()),
        }
    }

    /// Whether the path starts at the document root
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Path steps
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str("/")?;
        } else if self.steps.is_empty() {
            return f.write_str(".");
        }
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Path::parse(s)
    }
}

impl TryFrom<String> for Path {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Path::parse(&s)
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.to_string()
    }
}

/// A tree value together with the schema node describing it
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    /// The value
    pub value: &'a Value,
    /// Its schema node (for array elements: the array node)
    pub node: &'a SchemaNode,
}

impl<'a> Scope<'a> {
    /// Create a scope
    pub fn new(value: &'a Value, node: &'a SchemaNode) -> Self {
        Self { value, node }
    }
}

/// What a projection reached
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// A single value
    Value(&'a Value),
    /// The elements of a repeated node, in source order
    List(&'a [Value]),
}

/// Result of [`project`]
#[derive(Debug, Clone, Copy)]
pub struct Projection<'a> {
    /// Schema node of the reached value (the mixed element for `$`)
    pub node: &'a SchemaNode,
    /// The reached value(s)
    pub target: Target<'a>,
}

/// Schema node reached by [`resolve`]
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
    /// The reached node (the mixed element for `$`)
    pub node: &'a SchemaNode,
    /// True when the path ends at an element-value slot
    pub element_value: bool,
}

fn trail(path: &Path, upto: usize) -> String {
    Path::relative(path.steps[..upto].to_vec()).to_string()
}

fn resolve_step<'a>(node: &'a SchemaNode, step: &Step, model: &SchemaModel) -> Result<&'a SchemaNode> {
    if let Some(prefix) = &step.prefix {
        model.namespaces().resolve(prefix)?;
    }
    node.find_child(&step.name, step.prefix.as_deref(), step.kind == StepKind::Attribute)
        .ok_or_else(|| {
            Error::path(format!("'{}' is not declared under '{}'", step, node.label()))
        })
}

/// Resolve a path against a schema only, starting from `start`.
///
/// Used to check directive tables before any tree is seen.
pub fn resolve<'a>(start: &'a SchemaNode, path: &Path, model: &SchemaModel) -> Result<Resolved<'a>> {
    let mut node = start;

    for (i, step) in path.steps.iter().enumerate() {
        if i > 0 && node.kind == NodeKind::Array {
            return Err(Error::path(format!(
                "'{}' steps through array '{}' without a fan-out directive",
                path,
                node.label()
            )));
        }

        if step.kind == StepKind::ElementValue {
            if !node.has_mixed_content {
                return Err(Error::path(format!("'{}' has no element-value slot", node.label())));
            }
            return Ok(Resolved { node, element_value: true });
        }

        node = resolve_step(node, step, model)?;
    }

    Ok(Resolved { node, element_value: false })
}

/// Project a value (or list of values) out of `scope`.
///
/// The path is always applied to `scope`; callers pick the document root
/// scope for absolute paths.
pub fn project<'a>(
    scope: Scope<'a>,
    path: &Path,
    model: &SchemaModel,
    conventions: &KeyConventions,
) -> Result<Projection<'a>> {
    let mut node = scope.node;
    let mut value = scope.value;

    for (i, step) in path.steps.iter().enumerate() {
        if i > 0 && node.kind == NodeKind::Array {
            return Err(Error::path(format!(
                "'{}' steps through array '{}' without a fan-out directive",
                path,
                node.label()
            )));
        }

        let obj = match value {
            Value::Object(obj) => obj,
            Value::Null => return Err(Error::missing(format!("'{}' is null", trail(path, i)))),
            other => {
                return Err(Error::path(format!("cannot step into '{}'", trail(path, i)))
                    .with_shape("object", other.summary()))
            }
        };

        if step.kind == StepKind::ElementValue {
            if !node.has_mixed_content {
                return Err(Error::path(format!("'{}' has no element-value slot", node.label())));
            }
            let slot = obj
                .get(conventions.element_value_key())
                .ok_or_else(|| Error::missing(format!("'{}' has no element value", trail(path, i))))?;
            return Ok(Projection { node, target: Target::Value(slot) });
        }

        let child = resolve_step(node, step, model)?;
        let key = model.key_for(child, conventions)?;
        value = obj
            .get(&key)
            .ok_or_else(|| Error::missing(format!("'{}' is absent", trail(path, i + 1))))?;
        node = child;
    }

    let target = match (node.kind, value) {
        (NodeKind::Array, Value::Array(items)) if !path.steps.is_empty() => Target::List(items),
        (NodeKind::Array, Value::Null) if !path.steps.is_empty() => {
            return Err(Error::missing(format!("'{}' is null", path)))
        }
        (NodeKind::Array, other) if !path.steps.is_empty() => {
            return Err(Error::path(format!("'{}' is not an array", path))
                .with_shape("array of objects", other.summary()))
        }
        (_, v) => Target::Value(v),
    };

    Ok(Projection { node, target })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::NamespaceTable;
    use crate::tree::DocumentTree;
    use serde_json::json;

    fn model() -> SchemaModel {
        let root = SchemaNode::object(
            "employees",
            vec![SchemaNode::array(
                "employee",
                vec![
                    SchemaNode::scalar("firstname"),
                    SchemaNode::array(
                        "address",
                        vec![
                            SchemaNode::scalar("location").attribute(),
                            SchemaNode::object("city", vec![SchemaNode::scalar("postalcode").attribute()]).mixed(),
                        ],
                    ),
                ],
            )
            .in_namespace("emp")],
        );
        SchemaModel::new(root, NamespaceTable::new().with_prefix("emp", "http://wso2.org/employee")).unwrap()
    }

    fn tree() -> DocumentTree {
        DocumentTree::from_json(json!({"emp_employee": [{
            "firstname": "Ann",
            "address": [
                {"attr_location": "home", "city": {"attr_postalcode": 10100, "_ELEMVAL": "Colombo"}},
                {"attr_location": "work", "city": {"attr_postalcode": 20000, "_ELEMVAL": "Kandy"}}
            ]
        }]}))
    }

    #[test]
    fn test_parse_and_display() {
        for text in ["emp:employee/address", "@location", "city/$", "/emp:employee", ".", "@emp:id"] {
            let path: Path = text.parse().unwrap();
            assert_eq!(path.to_string(), text);
        }
        assert!(Path::parse("").unwrap().steps().is_empty());
        assert!(Path::parse("/a").unwrap().is_absolute());
    }

    #[test]
    fn test_parse_errors() {
        assert!(Path::parse("a//b").is_err());
        assert!(Path::parse("$/a").is_err());
        assert!(Path::parse("1abc").is_err());
        assert!(Path::parse("@").is_err());
        assert!(matches!(Path::parse("a:b:c"), Err(Error::PathResolution { .. })));
    }

    #[test]
    fn test_project_array_terminal() {
        let (model, tree) = (model(), tree());
        let scope = Scope::new(tree.root(), model.root());
        let conv = KeyConventions::default();

        let projection = project(scope, &"emp:employee".parse().unwrap(), &model, &conv).unwrap();
        match projection.target {
            Target::List(items) => assert_eq!(items.len(), 1),
            Target::Value(_) => panic!("expected a list"),
        }
        assert_eq!(projection.node.name, "employee");
    }

    #[test]
    fn test_project_through_array_fails() {
        let (model, tree) = (model(), tree());
        let scope = Scope::new(tree.root(), model.root());
        let err = project(scope, &"emp:employee/firstname".parse().unwrap(), &model, &KeyConventions::default())
            .unwrap_err();
        assert!(matches!(err, Error::PathResolution { missing: false, .. }));
        assert!(err.to_string().contains("without a fan-out directive"));
    }

    #[test]
    fn test_project_within_element_scope() {
        let (model, tree) = (model(), tree());
        let conv = KeyConventions::default();
        let employee_node = &model.root().children[0];
        let address_node = &employee_node.children[1];
        let address = &tree.root().get("emp_employee").unwrap().as_array().unwrap()[0]
            .get("address")
            .unwrap()
            .as_array()
            .unwrap()[1];
        let scope = Scope::new(address, address_node);

        let location = project(scope, &"@location".parse().unwrap(), &model, &conv).unwrap();
        assert!(matches!(location.target, Target::Value(Value::String(s)) if s == "work"));

        let city = project(scope, &"city/$".parse().unwrap(), &model, &conv).unwrap();
        assert!(matches!(city.target, Target::Value(Value::String(s)) if s == "Kandy"));

        let postal = project(scope, &"city/@postalcode".parse().unwrap(), &model, &conv).unwrap();
        assert!(matches!(postal.target, Target::Value(Value::Number(n)) if *n == 20000.0));
    }

    #[test]
    fn test_project_missing_and_undeclared() {
        let model = model();
        let conv = KeyConventions::default();
        let tree = DocumentTree::from_json(json!({"emp_employee": [{"address": []}]}));
        let employee = &tree.root().get("emp_employee").unwrap().as_array().unwrap()[0];
        let scope = Scope::new(employee, &model.root().children[0]);

        let missing = project(scope, &"firstname".parse().unwrap(), &model, &conv).unwrap_err();
        assert!(missing.is_missing_source());

        let undeclared = project(scope, &"lastname".parse().unwrap(), &model, &conv).unwrap_err();
        assert!(!undeclared.is_missing_source());

        let unbound = project(scope, &"x:firstname".parse().unwrap(), &model, &conv).unwrap_err();
        assert!(matches!(unbound, Error::NamespaceResolution(_)));
    }

    #[test]
    fn test_resolve_schema_only() {
        let model = model();
        let resolved = resolve(model.root(), &"emp:employee".parse().unwrap(), &model).unwrap();
        assert_eq!(resolved.node.kind, NodeKind::Array);

        let address = &model.root().children[0].children[1];
        let slot = resolve(address, &"city/$".parse().unwrap(), &model).unwrap();
        assert!(slot.element_value);

        assert!(resolve(model.root(), &"emp:employee/address".parse().unwrap(), &model).is_err());
        assert!(resolve(address, &"@location/$".parse().unwrap(), &model).is_err());
    }

    #[test]
    fn test_serde_path() {
        let path: Path = serde_json::from_str(r#""city/@postalcode""#).unwrap();
        assert_eq!(path.steps().len(), 2);
        assert_eq!(serde_json::to_string(&path).unwrap(), r#""city/@postalcode""#);
    }
}
