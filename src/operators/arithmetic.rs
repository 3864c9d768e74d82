//! Arithmetic operators
//!
//! Arguments may be numbers or numeric strings. Variadic operators need
//! at least one argument.

use crate::error::{Error, Result};
use crate::tree::Value;

use super::{arity, number_arg};

fn numbers(name: &str, args: &[Value]) -> Result<Vec<f64>> {
    args.iter().map(|v| number_arg(name, v)).collect()
}

/// Results must stay finite; NaN and infinities have no tree representation
fn finite(name: &str, n: f64) -> Result<Value> {
    if n.is_finite() {
        Ok(Value::Number(n))
    } else {
        Err(Error::operator(format!("'{}' result is out of range", name)))
    }
}

fn unary(name: &str, args: &[Value], f: fn(f64) -> f64) -> Result<Value> {
    arity(name, args, 1, Some(1))?;
    finite(name, f(number_arg(name, &args[0])?))
}

/// Sum of all arguments
pub fn sum(args: &[Value]) -> Result<Value> {
    arity("sum", args, 1, None)?;
    finite("sum", numbers("sum", args)?.iter().sum())
}

/// First argument minus the rest
pub fn subtract(args: &[Value]) -> Result<Value> {
    arity("subtract", args, 2, None)?;
    let nums = numbers("subtract", args)?;
    finite("subtract", nums[1..].iter().fold(nums[0], |acc, n| acc - n))
}

/// Product of all arguments
pub fn multiply(args: &[Value]) -> Result<Value> {
    arity("multiply", args, 1, None)?;
    finite("multiply", numbers("multiply", args)?.iter().product())
}

/// First argument divided by the second
pub fn divide(args: &[Value]) -> Result<Value> {
    arity("divide", args, 2, Some(2))?;
    let dividend = number_arg("divide", &args[0])?;
    let divisor = number_arg("divide", &args[1])?;
    if divisor == 0.0 {
        return Err(Error::operator("'divide' by zero"));
    }
    finite("divide", dividend / divisor)
}

/// Largest argument
pub fn max(args: &[Value]) -> Result<Value> {
    arity("max", args, 1, None)?;
    let nums = numbers("max", args)?;
    Ok(Value::Number(nums.into_iter().fold(f64::NEG_INFINITY, f64::max)))
}

/// Smallest argument
pub fn min(args: &[Value]) -> Result<Value> {
    arity("min", args, 1, None)?;
    let nums = numbers("min", args)?;
    Ok(Value::Number(nums.into_iter().fold(f64::INFINITY, f64::min)))
}

/// Arithmetic mean: sum divided by argument count
pub fn average(args: &[Value]) -> Result<Value> {
    arity("average", args, 1, None)?;
    let nums = numbers("average", args)?;
    finite("average", nums.iter().sum::<f64>() / nums.len() as f64)
}

/// Smallest integer not below the argument
pub fn ceiling(args: &[Value]) -> Result<Value> {
    unary("ceiling", args, f64::ceil)
}

/// Largest integer not above the argument
pub fn floor(args: &[Value]) -> Result<Value> {
    unary("floor", args, f64::floor)
}

/// Nearest integer, ties away from zero
pub fn round(args: &[Value]) -> Result<Value> {
    unary("round", args, f64::round)
}

/// Absolute value
pub fn absolute(args: &[Value]) -> Result<Value> {
    unary("absolute", args, f64::abs)
}
