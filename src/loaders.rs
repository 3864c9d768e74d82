//! Mapping configuration loading
//!
//! A mapping configuration bundles one mapping pair as JSON:
//!
//! ```json
//! {
//!   "inputSchema": {"namespaces": {...}, "root": {...}},
//!   "outputSchema": {"namespaces": {...}, "root": {...}},
//!   "directives": {...},
//!   "limits": {"maxFanoutDepth": 16},
//!   "conventions": {"attrPrefix": "attr_"}
//! }
//! ```
//!
//! `limits` and `conventions` are optional.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::conventions::KeyConventions;
use crate::directives::DirectiveTable;
use crate::engine::Mapper;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::schema::SchemaModel;

/// Default maximum configuration size (16 MB)
pub const DEFAULT_MAX_CONFIG_SIZE: usize = 16 * 1024 * 1024;

/// One mapping pair as loaded from JSON
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MappingConfig {
    /// Schema of the input trees
    pub input_schema: SchemaModel,
    /// Schema of the output trees
    pub output_schema: SchemaModel,
    /// Directive table for the output root
    pub directives: DirectiveTable,
    /// Depth and breadth guards
    #[serde(default)]
    pub limits: Limits,
    /// Key conventions shared by input and output trees
    #[serde(default)]
    pub conventions: KeyConventions,
}

impl MappingConfig {
    /// Parse a configuration from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build and check the mapper described by this configuration
    pub fn into_mapper(self) -> Result<Mapper> {
        Mapper::with_parts(
            self.input_schema,
            self.output_schema,
            self.directives,
            self.limits,
            self.conventions,
        )
    }
}

/// Loader for mapping configurations
#[derive(Debug)]
pub struct ConfigLoader {
    /// Maximum accepted configuration size in bytes
    max_size: usize,
}

impl ConfigLoader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self {
            max_size: DEFAULT_MAX_CONFIG_SIZE,
        }
    }

    /// Set the maximum configuration size
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Load a configuration from JSON text
    pub fn load_str(&self, text: &str) -> Result<MappingConfig> {
        self.check_size(text.len())?;
        MappingConfig::from_json_str(text)
    }

    /// Load a configuration from a file
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<MappingConfig> {
        let path = path.as_ref();
        let size = fs::metadata(path)?.len();
        self.check_size(usize::try_from(size).unwrap_or(usize::MAX))?;

        let content = fs::read_to_string(path)?;
        let config = self.load_str(&content)?;
        debug!(path = %path.display(), "mapping configuration loaded");
        Ok(config)
    }

    /// Load a configuration file and build its mapper
    pub fn load_mapper(&self, path: impl AsRef<Path>) -> Result<Mapper> {
        self.load_file(path)?.into_mapper()
    }

    fn check_size(&self, size: usize) -> Result<()> {
        if size > self.max_size {
            return Err(Error::Config(format!(
                "Configuration size {} exceeds maximum {}",
                size, self.max_size
            )));
        }
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
