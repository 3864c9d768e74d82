//! Error types for datamapper
//!
//! This module defines all error types used throughout the library.
//! Every failure of a `map()` call is terminal and returned as a
//! structured value carrying a [`Diagnostic`].

use std::fmt;
use thiserror::Error;

use crate::directives::DirectiveKind;

/// Result type alias using datamapper Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for datamapper operations
#[derive(Error, Debug)]
pub enum Error {
    /// Required field missing, wrong shape/type or cardinality mismatch
    #[error("schema violation: {0}")]
    SchemaViolation(Diagnostic),

    /// Unqualified or unknown namespace prefix
    #[error("namespace resolution error: {0}")]
    NamespaceResolution(Diagnostic),

    /// A path is absent from, or structurally incompatible with, the source tree
    #[error("path resolution error: {diagnostic}")]
    PathResolution {
        /// Error details
        diagnostic: Diagnostic,
        /// True when the path is well-formed but the source value is absent
        missing: bool,
    },

    /// Operator called with out-of-domain input
    #[error("operator error: {0}")]
    Operator(Diagnostic),

    /// Fan-out recursion, array size or tree depth guard tripped
    #[error("depth limit exceeded: {0}")]
    DepthLimitExceeded(Diagnostic),

    /// Invalid mapping configuration (schema or directive table)
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Namespace resolution failure with a message
    pub fn namespace(message: impl Into<String>) -> Self {
        Error::NamespaceResolution(Diagnostic::new(message))
    }

    /// Path resolution failure for a structurally incompatible path
    pub fn path(message: impl Into<String>) -> Self {
        Error::PathResolution {
            diagnostic: Diagnostic::new(message),
            missing: false,
        }
    }

    /// Path resolution failure for a value absent from the source tree
    pub fn missing(message: impl Into<String>) -> Self {
        Error::PathResolution {
            diagnostic: Diagnostic::new(message),
            missing: true,
        }
    }

    /// Operator failure with a message
    pub fn operator(message: impl Into<String>) -> Self {
        Error::Operator(Diagnostic::new(message))
    }

    /// Guard failure with a message
    pub fn depth(message: impl Into<String>) -> Self {
        Error::DepthLimitExceeded(Diagnostic::new(message))
    }

    /// Returns true if this error reports an absent source value
    pub fn is_missing_source(&self) -> bool {
        matches!(self, Error::PathResolution { missing: true, .. })
    }

    /// Get the diagnostic of a structured error
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Error::SchemaViolation(d)
            | Error::NamespaceResolution(d)
            | Error::Operator(d)
            | Error::DepthLimitExceeded(d) => Some(d),
            Error::PathResolution { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }

    fn diagnostic_mut(&mut self) -> Option<&mut Diagnostic> {
        match self {
            Error::SchemaViolation(d)
            | Error::NamespaceResolution(d)
            | Error::Operator(d)
            | Error::DepthLimitExceeded(d) => Some(d),
            Error::PathResolution { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }

    /// Attach the output location and producing directive.
    ///
    /// Details already present are kept, so the innermost location wins.
    pub fn at(mut self, path: &[String], directive: DirectiveKind) -> Self {
        if let Some(d) = self.diagnostic_mut() {
            if d.path.is_empty() {
                d.path = path.to_vec();
            }
            if d.directive.is_none() {
                d.directive = Some(directive);
            }
        }
        self
    }

    /// Set the expected/actual summary if not already present
    pub fn with_shape(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        if let Some(d) = self.diagnostic_mut() {
            if d.expected.is_none() {
                d.expected = Some(expected.into());
            }
            if d.actual.is_none() {
                d.actual = Some(actual.into());
            }
        }
        self
    }
}

/// Structured detail of a mapping failure
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Error message
    pub message: String,
    /// Offending field path (sequence of step names)
    pub path: Vec<String>,
    /// Expected shape or type
    pub expected: Option<String>,
    /// Summary of the value actually found
    pub actual: Option<String>,
    /// Directive variant that produced the value
    pub directive: Option<DirectiveKind>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Vec::new(),
            expected: None,
            actual: None,
            directive: None,
        }
    }

    /// Set the offending path
    pub fn with_path(mut self, path: Vec<String>) -> Self {
        self.path = path;
        self
    }

    /// Set the expected shape
    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    /// Set the actual value summary
    pub fn with_actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    /// Set the directive variant
    pub fn with_directive(mut self, directive: DirectiveKind) -> Self {
        self.directive = Some(directive);
        self
    }

    /// Render the path as `/a/b/c`
    pub fn path_string(&self) -> String {
        format!("/{}", self.path.join("/"))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if !self.path.is_empty() {
            write!(f, " at '{}'", self.path_string())?;
        }

        match (&self.expected, &self.actual) {
            (Some(expected), Some(actual)) => write!(f, " (expected {}, found {})", expected, actual)?,
            (Some(expected), None) => write!(f, " (expected {})", expected)?,
            (None, Some(actual)) => write!(f, " (found {})", actual)?,
            (None, None) => {}
        }

        if let Some(directive) = self.directive {
            write!(f, " [directive: {}]", directive)?;
        }

        Ok(())
    }
}
