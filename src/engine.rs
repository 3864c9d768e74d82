//! Mapping engine
//!
//! [`Mapper`] holds one mapping pair (input schema, output schema,
//! directive table) and turns schema-conformant input trees into output
//! trees. Construction checks the directive table against both schemas;
//! [`Mapper::map`] then builds the output depth-first following the
//! output schema:
//!
//! 1. the input tree depth is checked against [`Limits`]
//! 2. the input is validated against the input schema (optional)
//! 3. every output node is derived from its directive
//! 4. the output is validated against the output schema (optional)
//!
//! Fan-out and object nesting carry an explicit depth counter that is
//! checked on every descent, and fanned-out arrays are checked against
//! the configured maximum length.
//!
//! A `Mapper` holds no mutable state and is `Send + Sync`; any number of
//! `map()` calls may run concurrently on shared references.

use std::fmt;

use tracing::{debug, trace, warn};

use crate::conventions::KeyConventions;
use crate::directives::{ChainStep, Directive, DirectiveKind, DirectiveTable, Operand};
use crate::error::{Diagnostic, Error, Result};
use crate::limits::Limits;
use crate::operators::OperatorLibrary;
use crate::path::{project, resolve, Path, Projection, Scope, Target};
use crate::schema::{first_violation, validate_shape, NodeKind, SchemaModel, SchemaNode};
use crate::tree::{DocumentTree, Object, Value};

/// Directive key of the element-value slot
pub const ELEMENT_VALUE_DIRECTIVE: &str = "$";

/// One compiled mapping pair
#[derive(Debug, Clone)]
pub struct Mapper {
    input: SchemaModel,
    output: SchemaModel,
    directives: DirectiveTable,
    operators: OperatorLibrary,
    limits: Limits,
    conventions: KeyConventions,
    validate_input: bool,
    validate_output: bool,
}

impl Mapper {
    /// Create a mapper with the standard operator library and default limits
    pub fn new(input: SchemaModel, output: SchemaModel, directives: DirectiveTable) -> Result<Self> {
        Self::with_parts(input, output, directives, Limits::default(), KeyConventions::default())
    }

    /// Create a mapper with the given limits and key conventions.
    ///
    /// The directive table is checked once, against `limits`, so a table
    /// that only fits relaxed limits is accepted here.
    pub fn with_parts(
        input: SchemaModel,
        output: SchemaModel,
        directives: DirectiveTable,
        limits: Limits,
        conventions: KeyConventions,
    ) -> Result<Self> {
        let mapper = Self {
            input,
            output,
            directives,
            operators: OperatorLibrary::standard(),
            limits,
            conventions,
            validate_input: true,
            validate_output: true,
        };
        mapper.check()?;
        Ok(mapper)
    }

    /// Replace the limits, re-checking the directive table
    pub fn with_limits(mut self, limits: Limits) -> Result<Self> {
        self.limits = limits;
        self.check()?;
        Ok(self)
    }

    /// Replace the operator library, re-checking operator names
    pub fn with_operators(mut self, operators: OperatorLibrary) -> Result<Self> {
        self.operators = operators;
        self.check()?;
        Ok(self)
    }

    /// Replace the key conventions, re-checking sibling keys
    pub fn with_conventions(mut self, conventions: KeyConventions) -> Result<Self> {
        self.conventions = conventions;
        self.check()?;
        Ok(self)
    }

    /// Enable or disable input validation
    pub fn with_input_validation(mut self, enabled: bool) -> Self {
        self.validate_input = enabled;
        self
    }

    /// Enable or disable the final output validation
    pub fn with_output_validation(mut self, enabled: bool) -> Self {
        self.validate_output = enabled;
        self
    }

    /// Input schema
    pub fn input_schema(&self) -> &SchemaModel {
        &self.input
    }

    /// Output schema
    pub fn output_schema(&self) -> &SchemaModel {
        &self.output
    }

    /// Directive table
    pub fn directives(&self) -> &DirectiveTable {
        &self.directives
    }

    /// Limits
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Map an input tree to an output tree
    pub fn map(&self, input: &DocumentTree) -> Result<DocumentTree> {
        let root_name = &self.output.root().name;
        debug!(input = %self.input.root().name, output = %root_name, "mapping started");

        self.limits.check_tree_depth(input.root().depth())?;

        if self.validate_input {
            first_violation(input.root(), &self.input, &self.conventions)?;
        }

        let root_scope = Scope::new(input.root(), self.input.root());
        let run = Run { mapper: self, root: root_scope };
        let mut path = vec![root_name.clone()];
        let output = run.build_object(self.output.root(), &self.directives, root_scope, &mut path, 0)?;

        if self.validate_output {
            if let Err(mut violations) = validate_shape(&output, &self.output, &self.conventions) {
                let mut first = violations.swap_remove(0);
                first.directive = self.directives.kind_at(&first.path);
                return Err(Error::SchemaViolation(first));
            }
        }

        debug!(output = %root_name, "mapping finished");
        Ok(DocumentTree::new(output))
    }

    /// Static consistency checks of the directive table
    fn check(&self) -> Result<()> {
        self.limits.check_directives(self.directives.total_count())?;
        self.input.check_keys(&self.conventions)?;
        self.output.check_keys(&self.conventions)?;
        let mut path = vec![self.output.root().name.clone()];
        self.check_table(self.output.root(), &self.directives, self.input.root(), &mut path, 0)
    }

    fn check_table(
        &self,
        out: &SchemaNode,
        table: &DirectiveTable,
        scope: &SchemaNode,
        path: &mut Vec<String>,
        depth: usize,
    ) -> Result<()> {
        self.limits.check_fanout_depth(depth)?;

        for (key, _) in table.iter() {
            let known = (key == ELEMENT_VALUE_DIRECTIVE && out.has_mixed_content)
                || out.children.iter().any(|c| c.directive_key() == key);
            if !known {
                return Err(Error::Config(format!(
                    "Directive '{}' under '/{}' does not target a declared output node",
                    key,
                    path.join("/")
                )));
            }
        }

        for child in &out.children {
            path.push(child.label());
            match table.get(&child.directive_key()) {
                Some(directive) => self.check_directive(child, directive, scope, path, depth)?,
                None if child.required => {
                    return Err(Error::Config(format!(
                        "Required output node '/{}' has no directive",
                        path.join("/")
                    )))
                }
                None => {}
            }
            path.pop();
        }

        if let Some(directive) = table.get(ELEMENT_VALUE_DIRECTIVE) {
            path.push(ELEMENT_VALUE_DIRECTIVE.to_string());
            let slot = SchemaNode::scalar("value").typed(out.scalar_type);
            self.check_directive(&slot, directive, scope, path, depth)?;
            path.pop();
        }

        Ok(())
    }

    fn check_directive(
        &self,
        node: &SchemaNode,
        directive: &Directive,
        scope: &SchemaNode,
        path: &mut Vec<String>,
        depth: usize,
    ) -> Result<()> {
        match directive {
            Directive::Constant { value } => {
                if node.kind != NodeKind::Scalar || !value.is_scalar() {
                    return Err(config_error(path, format!("constant cannot produce a {}", node.kind)));
                }
            }
            Directive::Copy { source, .. } => {
                if node.kind == NodeKind::Array {
                    return Err(config_error(path, "arrays can only be produced by fan-out"));
                }
                let resolved = self.resolve_source(scope, source).map_err(|e| e.at(path, directive.kind()))?;
                if resolved.node.kind == NodeKind::Array && !resolved.element_value && !source.steps().is_empty() {
                    return Err(config_error(path, format!("copy source '{}' is an array; use fan-out", source)));
                }
            }
            Directive::FanOut { source, directives } => {
                if node.kind != NodeKind::Array {
                    return Err(config_error(path, format!("fan-out cannot produce a {}", node.kind)));
                }
                let resolved = self.resolve_source(scope, source).map_err(|e| e.at(path, directive.kind()))?;
                if resolved.node.kind != NodeKind::Array || resolved.element_value || source.steps().is_empty() {
                    return Err(config_error(path, format!("fan-out source '{}' is not an array", source)));
                }
                self.check_table(node, directives, resolved.node, path, depth + 1)?;
            }
            Directive::Object { source, directives } => {
                if node.kind != NodeKind::Object {
                    return Err(config_error(path, format!("object directive cannot produce a {}", node.kind)));
                }
                let inner = match source {
                    Some(source) => {
                        let resolved = self.resolve_source(scope, source).map_err(|e| e.at(path, directive.kind()))?;
                        if resolved.node.kind != NodeKind::Object || resolved.element_value {
                            return Err(config_error(path, format!("object source '{}' is not an object", source)));
                        }
                        resolved.node
                    }
                    None => scope,
                };
                self.check_table(node, directives, inner, path, depth + 1)?;
            }
            Directive::OperatorChain { operator, operands, then, .. } => {
                if node.kind != NodeKind::Scalar {
                    return Err(config_error(path, format!("operator cannot produce a {}", node.kind)));
                }
                let names = std::iter::once(operator.as_str()).chain(then.iter().map(|s| s.operator.as_str()));
                for name in names {
                    if !self.operators.contains(name) {
                        return Err(config_error(path, format!("unknown operator '{}'", name)));
                    }
                }
                let all_operands = operands.iter().chain(then.iter().flat_map(|s| s.operands.iter()));
                for operand in all_operands {
                    if let Operand::Path(source) = operand {
                        let resolved = self.resolve_source(scope, source).map_err(|e| e.at(path, directive.kind()))?;
                        if resolved.node.kind != NodeKind::Scalar && !resolved.element_value {
                            return Err(config_error(path, format!("operand '{}' is not a scalar", source)));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn resolve_source<'s>(&'s self, scope: &'s SchemaNode, source: &Path) -> Result<crate::path::Resolved<'s>> {
        let start = if source.is_absolute() { self.input.root() } else { scope };
        resolve(start, source, &self.input)
    }
}

fn config_error(path: &[String], message: impl fmt::Display) -> Error {
    Error::Config(format!("{} at '/{}'", message, path.join("/")))
}

/// State of a single `map()` call
struct Run<'a> {
    mapper: &'a Mapper,
    root: Scope<'a>,
}

/// Outcome of reading a source value
enum Sourced<T> {
    Found(T),
    Absent(Error),
}

impl<'a> Run<'a> {
    fn project(&self, scope: Scope<'a>, path: &Path) -> Result<Projection<'a>> {
        let start = if path.is_absolute() { self.root } else { scope };
        project(start, path, &self.mapper.input, &self.mapper.conventions)
    }

    /// Project a single value; arrays are rejected and null counts as absent
    fn single(&self, scope: Scope<'a>, path: &Path) -> Result<Sourced<&'a Value>> {
        match self.project(scope, path) {
            Ok(Projection { target: Target::Value(Value::Null), .. }) => {
                Ok(Sourced::Absent(Error::missing(format!("'{}' is null", path))))
            }
            Ok(Projection { target: Target::Value(v), .. }) => Ok(Sourced::Found(v)),
            Ok(Projection { target: Target::List(_), .. }) => Err(Error::path(format!(
                "'{}' is an array; arrays may only be consumed through fan-out",
                path
            ))),
            Err(e) if e.is_missing_source() => Ok(Sourced::Absent(e)),
            Err(e) => Err(e),
        }
    }

    fn build_object(
        &self,
        node: &SchemaNode,
        table: &DirectiveTable,
        scope: Scope<'a>,
        path: &mut Vec<String>,
        depth: usize,
    ) -> Result<Value> {
        self.mapper.limits.check_fanout_depth(depth)?;
        let mut obj = Object::new();

        for child in &node.children {
            path.push(child.label());
            let key = self.mapper.output.key_for(child, &self.mapper.conventions)?;

            let value = match table.get(&child.directive_key()) {
                Some(directive) => self.eval(child, directive, scope, path, depth)?,
                None => None,
            };

            match value {
                Some(v) => {
                    obj.insert(key, v);
                }
                None if child.required => {
                    return Err(Error::SchemaViolation(
                        Diagnostic::new("required output field has no value")
                            .with_path(path.clone())
                            .with_expected(child.kind.to_string())
                            .with_actual("nothing"),
                    ))
                }
                None => trace!(path = %path.join("/"), "optional output field omitted"),
            }
            path.pop();
        }

        if node.has_mixed_content {
            if let Some(directive) = table.get(ELEMENT_VALUE_DIRECTIVE) {
                path.push(ELEMENT_VALUE_DIRECTIVE.to_string());
                let slot = SchemaNode::scalar("value").optional();
                if let Some(v) = self.eval(&slot, directive, scope, path, depth)? {
                    obj.insert(self.mapper.conventions.element_value_key().to_string(), v);
                }
                path.pop();
            }
        }

        Ok(Value::Object(obj))
    }

    /// Evaluate one directive; `None` means the field is omitted
    fn eval(
        &self,
        node: &SchemaNode,
        directive: &Directive,
        scope: Scope<'a>,
        path: &mut Vec<String>,
        depth: usize,
    ) -> Result<Option<Value>> {
        let kind = directive.kind();

        match directive {
            Directive::Constant { value } => Ok(Some(value.clone())),

            Directive::Copy { source, optional } => match self.single(scope, source).map_err(|e| e.at(path, kind))? {
                Sourced::Found(v) => Ok(Some(v.clone())),
                Sourced::Absent(e) => self.absent(node, *optional, e, path, kind),
            },

            Directive::FanOut { source, directives } => {
                let projection = match self.project(scope, source) {
                    Ok(p) => p,
                    Err(e) if e.is_missing_source() => return self.absent(node, false, e, path, kind),
                    Err(e) => return Err(e.at(path, kind)),
                };
                let items = match projection.target {
                    Target::List(items) => items,
                    Target::Value(v) => {
                        return Err(Error::path(format!("fan-out source '{}' is not an array", source))
                            .with_shape("array of objects", v.summary())
                            .at(path, kind))
                    }
                };

                self.mapper.limits.check_array_len(items.len()).map_err(|e| e.at(path, kind))?;
                self.mapper.limits.check_fanout_depth(depth + 1).map_err(|e| e.at(path, kind))?;

                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    trace!(source = %source, index = i, "fan-out element");
                    path.push(i.to_string());
                    let element = Scope::new(item, projection.node);
                    out.push(self.build_object(node, directives, element, path, depth + 1)?);
                    path.pop();
                }
                Ok(Some(Value::Array(out)))
            }

            Directive::Object { source, directives } => {
                let inner = match source {
                    None => scope,
                    Some(source) => match self.project(scope, source) {
                        Ok(Projection { target: Target::Value(Value::Null), .. }) => {
                            let cause = Error::missing(format!("'{}' is null", source));
                            return self.absent(node, false, cause, path, kind);
                        }
                        Ok(Projection { node: inner, target: Target::Value(v) }) => Scope::new(v, inner),
                        Ok(Projection { target: Target::List(_), .. }) => {
                            return Err(Error::path(format!("object source '{}' is an array", source)).at(path, kind))
                        }
                        Err(e) if e.is_missing_source() => return self.absent(node, false, e, path, kind),
                        Err(e) => return Err(e.at(path, kind)),
                    },
                };
                self.mapper.limits.check_fanout_depth(depth + 1).map_err(|e| e.at(path, kind))?;
                self.build_object(node, directives, inner, path, depth + 1).map(Some)
            }

            Directive::OperatorChain { operator, operands, then, optional } => {
                let Some(mut args) = self.operands(scope, operands, node, *optional, path, kind)? else {
                    return Ok(None);
                };
                let mut result = self.call(operator, &args, path, kind)?;

                for ChainStep { operator, operands } in then {
                    let Some(rest) = self.operands(scope, operands, node, *optional, path, kind)? else {
                        return Ok(None);
                    };
                    args = Vec::with_capacity(rest.len() + 1);
                    args.push(result);
                    args.extend(rest);
                    result = self.call(operator, &args, path, kind)?;
                }

                if !result.is_scalar() {
                    let last = then.last().map_or(operator, |step| &step.operator);
                    return Err(Error::operator(format!("'{}' produced a structured value", last))
                        .with_shape("scalar", result.summary())
                        .at(path, kind));
                }
                Ok(Some(result))
            }
        }
    }

    /// Resolve operands; `None` when an absent source downgrades to omission
    fn operands(
        &self,
        scope: Scope<'a>,
        operands: &[Operand],
        node: &SchemaNode,
        optional: bool,
        path: &[String],
        kind: DirectiveKind,
    ) -> Result<Option<Vec<Value>>> {
        let mut args = Vec::with_capacity(operands.len());
        for operand in operands {
            match operand {
                Operand::Literal(v) => args.push(v.clone()),
                Operand::Path(source) => match self.single(scope, source).map_err(|e| e.at(path, kind))? {
                    Sourced::Found(v) => args.push(v.clone()),
                    Sourced::Absent(e) => {
                        self.absent(node, optional, e, path, kind)?;
                        return Ok(None);
                    }
                },
            }
        }
        Ok(Some(args))
    }

    fn call(&self, operator: &str, args: &[Value], path: &[String], kind: DirectiveKind) -> Result<Value> {
        self.mapper
            .operators
            .call(operator, args)
            .map_err(|e| e.at(path, kind))
    }

    /// An absent source omits optional targets and fails required ones
    fn absent(
        &self,
        node: &SchemaNode,
        optional: bool,
        cause: Error,
        path: &[String],
        kind: DirectiveKind,
    ) -> Result<Option<Value>> {
        if optional || !node.required {
            warn!(path = %path.join("/"), reason = %cause, "source absent, optional field omitted");
            return Ok(None);
        }

        let reason = cause
            .diagnostic()
            .map(|d| d.message.clone())
            .unwrap_or_else(|| cause.to_string());
        Err(Error::SchemaViolation(
            Diagnostic::new(format!("required field is missing: {}", reason))
                .with_path(path.to_vec())
                .with_expected(node.kind.to_string())
                .with_actual("nothing")
                .with_directive(kind),
        ))
    }
}

/// Map `input` with a one-off [`Mapper`] built from the given pair.
///
/// Prefer building a `Mapper` once and reusing it when mapping many trees.
pub fn map(
    input: &DocumentTree,
    directives: &DirectiveTable,
    input_schema: &SchemaModel,
    output_schema: &SchemaModel,
) -> Result<DocumentTree> {
    Mapper::new(input_schema.clone(), output_schema.clone(), directives.clone())?.map(input)
}
