//! Directives
//!
//! A [`DirectiveTable`] maps each output child of an object scope to the
//! [`Directive`] that derives it. Tables are keyed by the child's local
//! name, `@name` for attributes and `$` for the element-value slot of a
//! mixed-content node. Tables are static configuration: loaded once per
//! mapping pair and shared read-only.
//!
//! JSON form (tagged by `kind`):
//!
//! ```json
//! {
//!   "leadConverts": {"kind": "fanOut", "source": "lead", "directives": {
//!     "convertedStatus": {"kind": "constant", "value": "true"},
//!     "leadId": {"kind": "copy", "source": "ID"}
//!   }},
//!   "sendNotificationEmail": {"kind": "operatorChain", "operator": "toBoolean",
//!     "operands": [{"path": "sendNotificationEmail"}]}
//! }
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::path::Path;
use crate::tree::Value;

/// Directive variant, used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// Literal value
    Constant,
    /// Single-path projection
    Copy,
    /// Per-element mapping over a source array
    FanOut,
    /// Nested object construction
    Object,
    /// Operator invocation
    OperatorChain,
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DirectiveKind::Constant => "constant",
            DirectiveKind::Copy => "copy",
            DirectiveKind::FanOut => "fanOut",
            DirectiveKind::Object => "object",
            DirectiveKind::OperatorChain => "operatorChain",
        };
        f.write_str(s)
    }
}

/// An operator argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operand {
    /// Value projected from the source tree
    Path(Path),
    /// Literal value
    Literal(Value),
}

impl Operand {
    /// Path operand
    pub fn path(path: Path) -> Self {
        Operand::Path(path)
    }

    /// Literal operand
    pub fn literal(value: impl Into<Value>) -> Self {
        Operand::Literal(value.into())
    }
}

/// A follow-up operator in a chain; receives the previous result first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainStep {
    /// Operator name
    pub operator: String,
    /// Operands after the previous result
    #[serde(default)]
    pub operands: Vec<Operand>,
}

impl ChainStep {
    /// Create a chain step
    pub fn new(operator: impl Into<String>, operands: Vec<Operand>) -> Self {
        Self {
            operator: operator.into(),
            operands,
        }
    }
}

/// Field-level rule deriving one output node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Directive {
    /// Assign a literal value
    Constant {
        /// The value
        value: Value,
    },
    /// Project a single source path
    Copy {
        /// Source path
        source: Path,
        /// Omit the field instead of failing when the source is absent
        #[serde(default)]
        optional: bool,
    },
    /// Map every element of a source array to one destination object
    #[serde(rename_all = "camelCase")]
    FanOut {
        /// Source array path
        source: Path,
        /// Per-element directives, evaluated with the element as root
        directives: DirectiveTable,
    },
    /// Build a nested object, optionally re-rooted at a source object
    Object {
        /// Source object path; the current root when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<Path>,
        /// Directives for the object's children
        directives: DirectiveTable,
    },
    /// Apply a named operator, then any chained operators
    #[serde(rename_all = "camelCase")]
    OperatorChain {
        /// Operator name
        operator: String,
        /// Positional operands
        #[serde(default)]
        operands: Vec<Operand>,
        /// Further operators applied to the result
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        then: Vec<ChainStep>,
        /// Omit the field instead of failing when a source is absent
        #[serde(default)]
        optional: bool,
    },
}

impl Directive {
    /// Constant directive
    pub fn constant(value: impl Into<Value>) -> Self {
        Directive::Constant { value: value.into() }
    }

    /// Copy directive
    pub fn copy(source: Path) -> Self {
        Directive::Copy { source, optional: false }
    }

    /// Copy directive that omits its target when the source is absent
    pub fn copy_optional(source: Path) -> Self {
        Directive::Copy { source, optional: true }
    }

    /// Fan-out directive
    pub fn fan_out(source: Path, directives: DirectiveTable) -> Self {
        Directive::FanOut { source, directives }
    }

    /// Nested object directive over the current root
    pub fn object(directives: DirectiveTable) -> Self {
        Directive::Object { source: None, directives }
    }

    /// Nested object directive re-rooted at a source object
    pub fn object_at(source: Path, directives: DirectiveTable) -> Self {
        Directive::Object {
            source: Some(source),
            directives,
        }
    }

    /// Operator directive
    pub fn operator(operator: impl Into<String>, operands: Vec<Operand>) -> Self {
        Directive::OperatorChain {
            operator: operator.into(),
            operands,
            then: Vec::new(),
            optional: false,
        }
    }

    /// Append a chained operator (no-op for other variants)
    pub fn then(mut self, step: ChainStep) -> Self {
        if let Directive::OperatorChain { then, .. } = &mut self {
            then.push(step);
        }
        self
    }

    /// Mark a copy or operator directive optional (no-op for other variants)
    pub fn optional(mut self) -> Self {
        match &mut self {
            Directive::Copy { optional, .. } | Directive::OperatorChain { optional, .. } => *optional = true,
            _ => {}
        }
        self
    }

    /// Variant of this directive
    pub fn kind(&self) -> DirectiveKind {
        match self {
            Directive::Constant { .. } => DirectiveKind::Constant,
            Directive::Copy { .. } => DirectiveKind::Copy,
            Directive::FanOut { .. } => DirectiveKind::FanOut,
            Directive::Object { .. } => DirectiveKind::Object,
            Directive::OperatorChain { .. } => DirectiveKind::OperatorChain,
        }
    }

    /// Nested table of fan-out and object directives
    pub fn nested(&self) -> Option<&DirectiveTable> {
        match self {
            Directive::FanOut { directives, .. } | Directive::Object { directives, .. } => Some(directives),
            _ => None,
        }
    }
}

/// Ordered directives of one object scope
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectiveTable {
    entries: IndexMap<String, Directive>,
}

impl DirectiveTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directive for an output child
    pub fn with(mut self, key: impl Into<String>, directive: Directive) -> Self {
        self.entries.insert(key.into(), directive);
        self
    }

    /// Add a directive in place
    pub fn insert(&mut self, key: impl Into<String>, directive: Directive) {
        self.entries.insert(key.into(), directive);
    }

    /// Look up the directive of an output child
    pub fn get(&self, key: &str) -> Option<&Directive> {
        self.entries.get(key)
    }

    /// Iterate entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Directive)> {
        self.entries.iter().map(|(k, d)| (k.as_str(), d))
    }

    /// Number of entries in this scope
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if this scope has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of directives including nested tables
    pub fn total_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(table) = stack.pop() {
            count += table.len();
            stack.extend(table.entries.values().filter_map(Directive::nested));
        }
        count
    }

    /// Variant of the directive that produced the value at a diagnostic path.
    ///
    /// `path` starts with the root name; array indexes and unknown steps
    /// are skipped.
    pub fn kind_at(&self, path: &[String]) -> Option<DirectiveKind> {
        let mut table = self;
        let mut found = None;

        for step in path.iter().skip(1) {
            if step.parse::<usize>().is_ok() {
                continue;
            }
            let local = local_key(step);
            let Some(directive) = table.get(&local) else {
                break;
            };
            found = Some(directive.kind());
            match directive.nested() {
                Some(nested) => table = nested,
                None => break,
            }
        }

        found
    }
}

/// Directive key of a diagnostic step label (`emp:city` -> `city`, `@p:id` -> `@id`)
fn local_key(label: &str) -> String {
    let (attribute, qname) = match label.strip_prefix('@') {
        Some(rest) => (true, rest),
        None => (false, label),
    };
    let local = qname.rsplit(':').next().unwrap_or(qname);
    if attribute {
        format!("@{}", local)
    } else {
        local.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(text: &str) -> Path {
        text.parse().unwrap()
    }

    fn lead_table() -> DirectiveTable {
        DirectiveTable::new()
            .with(
                "leadConverts",
                Directive::fan_out(
                    p("lead"),
                    DirectiveTable::new()
                        .with("convertedStatus", Directive::constant("true"))
                        .with("leadId", Directive::copy(p("ID"))),
                ),
            )
            .with(
                "sendNotificationEmail",
                Directive::operator("toBoolean", vec![Operand::path(p("sendNotificationEmail"))]),
            )
    }

    #[test]
    fn test_total_count() {
        assert_eq!(lead_table().total_count(), 4);
    }

    #[test]
    fn test_kind_at() {
        let table = lead_table();
        let path: Vec<String> = ["convertLead", "urn:leadConverts", "0", "leadId"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(table.kind_at(&path), Some(DirectiveKind::Copy));
        assert_eq!(table.kind_at(&path[..2]), Some(DirectiveKind::FanOut));
        assert_eq!(table.kind_at(&["root".to_string(), "nope".to_string()]), None);
    }

    #[test]
    fn test_builders() {
        let d = Directive::operator("trim", vec![Operand::path(p("name"))])
            .then(ChainStep::new("toUppercase", vec![]))
            .optional();
        match d {
            Directive::OperatorChain { then, optional, .. } => {
                assert_eq!(then.len(), 1);
                assert!(optional);
            }
            _ => panic!("expected operator chain"),
        }
        assert_eq!(Directive::constant(1.0).optional().kind(), DirectiveKind::Constant);
    }

    #[test]
    fn test_deserialize_table() {
        let json = r#"{
            "leadConverts": {"kind": "fanOut", "source": "lead", "directives": {
                "convertedStatus": {"kind": "constant", "value": "true"},
                "leadId": {"kind": "copy", "source": "ID"}
            }},
            "fullname": {"kind": "operatorChain", "operator": "concat", "operands": [
                {"path": "firstname"}, {"literal": " "}, {"path": "lastname"}
            ], "then": [{"operator": "trim"}]},
            "city": {"kind": "object", "source": "city", "directives": {
                "name": {"kind": "copy", "source": "$", "optional": true}
            }}
        }"#;
        let table: DirectiveTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.total_count(), 6);

        match table.get("fullname").unwrap() {
            Directive::OperatorChain { operands, then, .. } => {
                assert_eq!(operands[1], Operand::literal(" "));
                assert_eq!(then[0].operator, "trim");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(table.get("city").unwrap().kind(), DirectiveKind::Object);
    }

    #[test]
    fn test_deserialize_rejects_bad_path() {
        let json = r#"{"x": {"kind": "copy", "source": "a//b"}}"#;
        assert!(serde_json::from_str::<DirectiveTable>(json).is_err());
    }
}
