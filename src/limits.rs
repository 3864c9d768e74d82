//! Limits and constraints for mapping
//!
//! This module defines the guards that keep a mapping bounded: nested
//! fan-out depth, source array size, input tree depth and directive
//! table size. Malformed or adversarial inputs fail fast with
//! [`Error::DepthLimitExceeded`] instead of exhausting the stack.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Global limits configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Limits {
    /// Maximum nesting of fan-out and object directives
    pub max_fanout_depth: usize,

    /// Maximum number of elements in a single fanned-out source array
    pub max_array_len: usize,

    /// Maximum depth of an input tree
    pub max_tree_depth: usize,

    /// Maximum number of directives in a mapping configuration
    pub max_directives: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_fanout_depth: 32,
            max_array_len: 100_000,
            max_tree_depth: 256,
            max_directives: 10_000,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_fanout_depth: 8,
            max_array_len: 10_000,
            max_tree_depth: 64,
            max_directives: 1_000,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_fanout_depth: 256,
            max_array_len: 10_000_000,
            max_tree_depth: 4096,
            max_directives: 1_000_000,
        }
    }

    /// Check if fan-out nesting is within limits
    pub fn check_fanout_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_fanout_depth {
            Err(Error::depth(format!(
                "fan-out depth {} exceeds maximum {}",
                depth, self.max_fanout_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if a source array is within limits
    pub fn check_array_len(&self, len: usize) -> Result<()> {
        if len > self.max_array_len {
            Err(Error::depth(format!(
                "array length {} exceeds maximum {}",
                len, self.max_array_len
            )))
        } else {
            Ok(())
        }
    }

    /// Check if an input tree depth is within limits
    pub fn check_tree_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_tree_depth {
            Err(Error::depth(format!(
                "tree depth {} exceeds maximum {}",
                depth, self.max_tree_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if the directive count is within limits
    pub fn check_directives(&self, count: usize) -> Result<()> {
        if count > self.max_directives {
            Err(Error::depth(format!(
                "directive count {} exceeds maximum {}",
                count, self.max_directives
            )))
        } else {
            Ok(())
        }
    }
}
