//! Operator library
//!
//! Pure, deterministic scalar functions usable from `operatorChain`
//! directives. Every operator takes its positional arguments as a slice
//! of [`Value`]s and either returns a value or an [`Error::Operator`].
//! Operators never touch schema or namespace state.
//!
//! Operators are grouped by domain:
//! - [`arithmetic`]: `sum`, `subtract`, `multiply`, `divide`, `max`, `min`,
//!   `average`, `ceiling`, `floor`, `round`, `absolute`
//! - [`conversion`]: `toNumber`, `toBoolean`, `numberToString`,
//!   `booleanToString`, `toString`
//! - [`string`]: `concat`, `split`, `toUppercase`, `toLowercase`,
//!   `stringLength`, `startsWith`, `endsWith`, `substring`, `trim`,
//!   `replaceFirst`, `match`, `contains`

pub mod arithmetic;
pub mod conversion;
pub mod string;

use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::tree::{format_number, Value};

/// Signature shared by all operators
pub type OperatorFn = fn(&[Value]) -> Result<Value>;

/// Named set of operators
#[derive(Clone)]
pub struct OperatorLibrary {
    operators: HashMap<String, OperatorFn>,
}

impl fmt::Debug for OperatorLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorLibrary")
            .field("operators", &self.names())
            .finish()
    }
}

impl Default for OperatorLibrary {
    fn default() -> Self {
        Self::standard()
    }
}

impl OperatorLibrary {
    /// Library without any operator
    pub fn empty() -> Self {
        Self {
            operators: HashMap::new(),
        }
    }

    /// Library with every built-in operator
    pub fn standard() -> Self {
        let builtins: [(&str, OperatorFn); 28] = [
            ("sum", arithmetic::sum),
            ("subtract", arithmetic::subtract),
            ("multiply", arithmetic::multiply),
            ("divide", arithmetic::divide),
            ("max", arithmetic::max),
            ("min", arithmetic::min),
            ("average", arithmetic::average),
            ("ceiling", arithmetic::ceiling),
            ("floor", arithmetic::floor),
            ("round", arithmetic::round),
            ("absolute", arithmetic::absolute),
            ("toNumber", conversion::to_number),
            ("toBoolean", conversion::to_boolean),
            ("numberToString", conversion::number_to_string),
            ("booleanToString", conversion::boolean_to_string),
            ("toString", conversion::to_string),
            ("concat", string::concat),
            ("split", string::split),
            ("toUppercase", string::to_uppercase),
            ("toLowercase", string::to_lowercase),
            ("stringLength", string::string_length),
            ("startsWith", string::starts_with),
            ("endsWith", string::ends_with),
            ("substring", string::substring),
            ("trim", string::trim),
            ("replaceFirst", string::replace_first),
            ("match", string::matches),
            ("contains", string::contains),
        ];

        let mut library = Self::empty();
        for (name, op) in builtins {
            library.register(name, op);
        }
        library
    }

    /// Register (or replace) an operator
    pub fn register(&mut self, name: impl Into<String>, op: OperatorFn) {
        self.operators.insert(name.into(), op);
    }

    /// Whether an operator exists
    pub fn contains(&self, name: &str) -> bool {
        self.operators.contains_key(name)
    }

    /// Operator names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Invoke an operator by name
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let op = self
            .operators
            .get(name)
            .ok_or_else(|| Error::operator(format!("Unknown operator '{}'", name)))?;
        op(args)
    }
}

/// Check the argument count of an operator
pub(crate) fn arity(name: &str, args: &[Value], min: usize, max: Option<usize>) -> Result<()> {
    let n = args.len();
    let too_many = max.map_or(false, |m| n > m);
    if n < min || too_many {
        let expected = match max {
            Some(m) if m == min => format!("{}", min),
            Some(m) => format!("{} to {}", min, m),
            None => format!("at least {}", min),
        };
        return Err(Error::operator(format!(
            "'{}' takes {} argument(s), got {}",
            name, expected, n
        )));
    }
    Ok(())
}

/// Parse a numeric literal strictly: no NaN, no infinities
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let lower = trimmed.to_ascii_lowercase();
    if trimmed.is_empty() || lower.contains("nan") || lower.contains("inf") {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Numeric argument: a number or a numeric string
pub(crate) fn number_arg(name: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) if n.is_finite() => Ok(*n),
        Value::String(s) => parse_number(s).ok_or_else(|| {
            Error::operator(format!("'{}' expects a number, got non-numeric text", name))
                .with_shape("number", value.summary())
        }),
        other => Err(Error::operator(format!("'{}' expects a number", name))
            .with_shape("number", other.summary())),
    }
}

/// String argument: any scalar except null, rendered as text
pub(crate) fn string_arg(name: &str, value: &Value) -> Result<String> {
    render_scalar(value).ok_or_else(|| {
        Error::operator(format!("'{}' expects a string", name)).with_shape("string", value.summary())
    })
}

/// Text rendering of a non-null scalar
pub(crate) fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(format_number(*n)),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
