//! Shape validation
//!
//! Purely structural checks of a tree against a schema model. Nothing is
//! coerced: a numeric string under a `number` scalar is a violation.

use std::collections::HashSet;

use crate::conventions::KeyConventions;
use crate::error::{Diagnostic, Error, Result};
use crate::tree::{Object, Value};

use super::model::{NodeKind, ScalarType, SchemaModel, SchemaNode};

/// Check a tree against a schema, collecting every violation
pub fn validate_shape(
    tree: &Value,
    model: &SchemaModel,
    conventions: &KeyConventions,
) -> std::result::Result<(), Vec<Diagnostic>> {
    let mut validator = ShapeValidator {
        conventions,
        violations: Vec::new(),
    };
    let root = model.root();
    validator.check_value(root, tree, &mut vec![root.name.clone()]);

    if validator.violations.is_empty() {
        Ok(())
    } else {
        Err(validator.violations)
    }
}

/// Check a tree against a schema, failing with the first violation
pub fn first_violation(tree: &Value, model: &SchemaModel, conventions: &KeyConventions) -> Result<()> {
    validate_shape(tree, model, conventions).map_err(|mut violations| {
        Error::SchemaViolation(violations.swap_remove(0))
    })
}

struct ShapeValidator<'c> {
    conventions: &'c KeyConventions,
    violations: Vec<Diagnostic>,
}

impl ShapeValidator<'_> {
    fn report(&mut self, message: impl Into<String>, path: &[String], expected: impl Into<String>, actual: impl Into<String>) {
        self.violations.push(
            Diagnostic::new(message)
                .with_path(path.to_vec())
                .with_expected(expected)
                .with_actual(actual),
        );
    }

    fn check_value(&mut self, node: &SchemaNode, value: &Value, path: &mut Vec<String>) {
        match node.kind {
            NodeKind::Scalar => self.check_scalar(node.scalar_type, value, path),
            NodeKind::Object => match value {
                Value::Object(obj) => self.check_object(node, obj, path),
                other => self.report("object node holds a non-object value", path, "object", other.summary()),
            },
            NodeKind::Array => match value {
                Value::Array(items) => {
                    for (i, item) in items.iter().enumerate() {
                        path.push(i.to_string());
                        match item {
                            Value::Object(obj) => self.check_object(node, obj, path),
                            other => self.report("array element is not an object", path, "object", other.summary()),
                        }
                        path.pop();
                    }
                }
                other => self.report("array node does not hold an array", path, "array of objects", other.summary()),
            },
        }
    }

    fn check_scalar(&mut self, scalar_type: ScalarType, value: &Value, path: &[String]) {
        if !value.is_scalar() {
            self.report("scalar node holds a structured value", path, scalar_type.to_string(), value.summary());
            return;
        }

        let ok = match scalar_type {
            ScalarType::Any => true,
            ScalarType::String => matches!(value, Value::String(_)),
            ScalarType::Number => matches!(value, Value::Number(_)),
            ScalarType::Boolean => matches!(value, Value::Bool(_)),
        };
        if !ok {
            self.report("scalar has the wrong type", path, scalar_type.to_string(), value.summary());
        } else if matches!(value, Value::Number(n) if !n.is_finite()) {
            self.report("number is not finite", path, "finite number", value.summary());
        }
    }

    fn check_object(&mut self, node: &SchemaNode, obj: &Object, path: &mut Vec<String>) {
        let mut declared = HashSet::new();

        for child in &node.children {
            let key = self.conventions.key_for(child);
            path.push(child.label());
            match obj.get(&key) {
                None if child.required => {
                    self.report("required field is missing", path, child.kind.to_string(), "nothing")
                }
                Some(Value::Null) if child.required => {
                    self.report("required field is null", path, child.kind.to_string(), "null")
                }
                None | Some(Value::Null) => {}
                Some(value) => self.check_value(child, value, path),
            }
            path.pop();
            declared.insert(key);
        }

        if node.has_mixed_content {
            let slot = self.conventions.element_value_key();
            if let Some(value) = obj.get(slot) {
                path.push("$".to_string());
                if !value.is_null() {
                    self.check_scalar(node.scalar_type, value, path);
                }
                path.pop();
            }
            declared.insert(slot.to_string());
        }

        for key in obj.keys().filter(|k| !declared.contains(k.as_str())) {
            let message = self.undeclared_message(node, key);
            path.push(key.clone());
            self.report(message, path, "no such field", obj[key].summary());
            path.pop();
        }
    }

    fn undeclared_message(&self, node: &SchemaNode, key: &str) -> String {
        let attr_prefix = self.conventions.attr_prefix();
        let element_match = key
            .strip_prefix(attr_prefix)
            .filter(|_| !attr_prefix.is_empty())
            .and_then(|rest| {
                node.children
                    .iter()
                    .find(|c| !c.is_attribute && self.conventions.key_for(c) == rest)
            });
        if let Some(element) = element_match {
            return format!("'{}' is declared as an element, not an attribute", element.name);
        }

        let attribute_match = node.children.iter().find(|c| {
            c.is_attribute && self.conventions.element_key(&c.name, c.namespace.as_deref()) == key
        });
        if let Some(attribute) = attribute_match {
            return format!("'{}' is declared as an attribute, not an element", attribute.name);
        }

        format!("undeclared field '{}'", key)
    }
}
