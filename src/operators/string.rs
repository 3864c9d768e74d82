//! String operators
//!
//! Scalar arguments are rendered as text; null and structured values are
//! rejected. Positions count Unicode scalar values.

use regex::Regex;

use crate::error::{Error, Result};
use crate::tree::Value;

use super::{arity, number_arg, string_arg};

fn unary_text(name: &str, args: &[Value], f: fn(&str) -> String) -> Result<Value> {
    arity(name, args, 1, Some(1))?;
    Ok(Value::String(f(&string_arg(name, &args[0])?)))
}

/// Index argument clamped to `0..=len`; non-integers are truncated
fn index_arg(name: &str, value: &Value, len: usize) -> Result<usize> {
    let n = number_arg(name, value)?.trunc();
    Ok(if n <= 0.0 {
        0
    } else if n >= len as f64 {
        len
    } else {
        n as usize
    })
}

/// Ordered concatenation of all arguments
pub fn concat(args: &[Value]) -> Result<Value> {
    arity("concat", args, 1, None)?;
    let mut out = String::new();
    for arg in args {
        out.push_str(&string_arg("concat", arg)?);
    }
    Ok(Value::String(out))
}

/// Split by a non-empty separator.
///
/// Returns the list of parts, or the part at the optional third argument
/// (empty string when out of range).
pub fn split(args: &[Value]) -> Result<Value> {
    arity("split", args, 2, Some(3))?;
    let text = string_arg("split", &args[0])?;
    let sep = string_arg("split", &args[1])?;
    if sep.is_empty() {
        return Err(Error::operator("'split' separator must not be empty"));
    }

    let parts: Vec<&str> = text.split(sep.as_str()).collect();
    match args.get(2) {
        Some(index) => {
            let i = number_arg("split", index)?;
            let part = if i >= 0.0 { parts.get(i as usize) } else { None };
            Ok(Value::from(part.copied().unwrap_or_default()))
        }
        None => Ok(Value::Array(parts.into_iter().map(Value::from).collect())),
    }
}

/// Upper-case
pub fn to_uppercase(args: &[Value]) -> Result<Value> {
    unary_text("toUppercase", args, str::to_uppercase)
}

/// Lower-case
pub fn to_lowercase(args: &[Value]) -> Result<Value> {
    unary_text("toLowercase", args, str::to_lowercase)
}

/// Trim surrounding whitespace
pub fn trim(args: &[Value]) -> Result<Value> {
    unary_text("trim", args, |s| s.trim().to_string())
}

/// Number of characters
pub fn string_length(args: &[Value]) -> Result<Value> {
    arity("stringLength", args, 1, Some(1))?;
    let text = string_arg("stringLength", &args[0])?;
    Ok(Value::Number(text.chars().count() as f64))
}

/// Prefix test
pub fn starts_with(args: &[Value]) -> Result<Value> {
    arity("startsWith", args, 2, Some(2))?;
    let text = string_arg("startsWith", &args[0])?;
    let prefix = string_arg("startsWith", &args[1])?;
    Ok(Value::Bool(text.starts_with(&prefix)))
}

/// Suffix test
pub fn ends_with(args: &[Value]) -> Result<Value> {
    arity("endsWith", args, 2, Some(2))?;
    let text = string_arg("endsWith", &args[0])?;
    let suffix = string_arg("endsWith", &args[1])?;
    Ok(Value::Bool(text.ends_with(&suffix)))
}

/// Substring test
pub fn contains(args: &[Value]) -> Result<Value> {
    arity("contains", args, 2, Some(2))?;
    let text = string_arg("contains", &args[0])?;
    let needle = string_arg("contains", &args[1])?;
    Ok(Value::Bool(text.contains(&needle)))
}

/// Characters from `start` up to, not including, `end` (default: the end).
///
/// Out-of-range indexes are clamped and reversed bounds are swapped.
pub fn substring(args: &[Value]) -> Result<Value> {
    arity("substring", args, 2, Some(3))?;
    let chars: Vec<char> = string_arg("substring", &args[0])?.chars().collect();
    let len = chars.len();
    let start = index_arg("substring", &args[1], len)?;
    let end = match args.get(2) {
        Some(end) => index_arg("substring", end, len)?,
        None => len,
    };
    let (from, to) = if start <= end { (start, end) } else { (end, start) };
    Ok(Value::String(chars[from..to].iter().collect()))
}

/// Replace the first literal occurrence of `target`
pub fn replace_first(args: &[Value]) -> Result<Value> {
    arity("replaceFirst", args, 3, Some(3))?;
    let text = string_arg("replaceFirst", &args[0])?;
    let target = string_arg("replaceFirst", &args[1])?;
    let replacement = string_arg("replaceFirst", &args[2])?;
    if target.is_empty() {
        return Ok(Value::String(format!("{}{}", replacement, text)));
    }
    Ok(Value::String(text.replacen(&target, &replacement, 1)))
}

/// Regular expression test
pub fn matches(args: &[Value]) -> Result<Value> {
    arity("match", args, 2, Some(2))?;
    let text = string_arg("match", &args[0])?;
    let pattern = string_arg("match", &args[1])?;
    let regex = Regex::new(&pattern)
        .map_err(|e| Error::operator(format!("'match' got an invalid pattern: {}", e)))?;
    Ok(Value::Bool(regex.is_match(&text)))
}
