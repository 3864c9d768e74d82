//! Type conversion operators

use crate::error::{Error, Result};
use crate::tree::{format_number, Value};

use super::{arity, number_arg, parse_number, render_scalar};

/// Parse a numeric literal; non-numeric input is an error, never NaN
pub fn to_number(args: &[Value]) -> Result<Value> {
    arity("toNumber", args, 1, Some(1))?;
    match &args[0] {
        Value::Number(n) if n.is_finite() => Ok(Value::Number(*n)),
        Value::String(s) => parse_number(s).map(Value::Number).ok_or_else(|| {
            Error::operator("'toNumber' got non-numeric text").with_shape("numeric literal", args[0].summary())
        }),
        other => Err(Error::operator("'toNumber' expects a numeric literal")
            .with_shape("numeric literal", other.summary())),
    }
}

/// True iff the trimmed input equals `"true"`, ignoring case. Never fails
/// on its argument.
pub fn to_boolean(args: &[Value]) -> Result<Value> {
    arity("toBoolean", args, 1, Some(1))?;
    let truthy = render_scalar(&args[0])
        .map(|s| s.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    Ok(Value::Bool(truthy))
}

/// Render a number as text
pub fn number_to_string(args: &[Value]) -> Result<Value> {
    arity("numberToString", args, 1, Some(1))?;
    let n = number_arg("numberToString", &args[0])?;
    Ok(Value::String(format_number(n)))
}

/// Render a boolean as `"true"` or `"false"`
pub fn boolean_to_string(args: &[Value]) -> Result<Value> {
    arity("booleanToString", args, 1, Some(1))?;
    let b = match &args[0] {
        Value::Bool(b) => *b,
        other => to_boolean(std::slice::from_ref(other))?.as_bool().unwrap_or(false),
    };
    Ok(Value::String(b.to_string()))
}

/// Render any scalar as text; null becomes the empty string
pub fn to_string(args: &[Value]) -> Result<Value> {
    arity("toString", args, 1, Some(1))?;
    match &args[0] {
        Value::Null => Ok(Value::String(String::new())),
        other => render_scalar(other).map(Value::String).ok_or_else(|| {
            Error::operator("'toString' expects a scalar").with_shape("scalar", other.summary())
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn call(f: fn(&[Value]) -> Result<Value>, arg: impl Into<Value>) -> Result<Value> {
        f(&[arg.into()])
    }

    #[test]
    fn test_to_boolean() {
        assert_eq!(call(to_boolean, "true").unwrap(), Value::Bool(true));
        assert_eq!(call(to_boolean, "TRUE").unwrap(), Value::Bool(true));
        assert_eq!(call(to_boolean, "  True ").unwrap(), Value::Bool(true));
        assert_eq!(call(to_boolean, "yes").unwrap(), Value::Bool(false));
        assert_eq!(call(to_boolean, "").unwrap(), Value::Bool(false));
        assert_eq!(call(to_boolean, Value::Null).unwrap(), Value::Bool(false));
        assert_eq!(call(to_boolean, true).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_to_number() {
        assert_eq!(call(to_number, "42").unwrap(), Value::Number(42.0));
        assert_eq!(call(to_number, " -0.5 ").unwrap(), Value::Number(-0.5));
        assert_eq!(call(to_number, 7.0).unwrap(), Value::Number(7.0));

        let err = call(to_number, "forty-two").unwrap_err();
        assert!(matches!(err, Error::Operator(_)));
        assert!(call(to_number, "NaN").is_err());
        assert!(call(to_number, true).is_err());
    }

    #[test]
    fn test_to_string_conversions() {
        assert_eq!(call(number_to_string, 3.0).unwrap(), Value::from("3"));
        assert_eq!(call(number_to_string, 2.5).unwrap(), Value::from("2.5"));
        assert_eq!(call(boolean_to_string, false).unwrap(), Value::from("false"));
        assert_eq!(call(boolean_to_string, "TRUE").unwrap(), Value::from("true"));
        assert_eq!(call(to_string, 10100.0).unwrap(), Value::from("10100"));
        assert_eq!(call(to_string, Value::Null).unwrap(), Value::from(""));
        assert!(call(to_string, Value::Array(vec![])).is_err());
    }

    proptest! {
        #[test]
        fn prop_to_boolean_is_total(text in ".{0,16}") {
            let expected = text.trim().eq_ignore_ascii_case("true");
            prop_assert_eq!(to_boolean(&[Value::from(text.as_str())]).unwrap(), Value::Bool(expected));
        }

        #[test]
        fn prop_to_number_accepts_rendered_numbers(n in -1.0e12f64..1.0e12) {
            let text = format_number(n);
            prop_assert_eq!(to_number(&[Value::from(text)]).unwrap(), Value::Number(n));
        }
    }
}
