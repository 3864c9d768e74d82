//! # datamapper
//!
//! A data-driven tree-to-tree mapping engine.
//!
//! A mapping pair is an input schema, an output schema and a directive
//! table. The engine reads an input tree conforming to the input schema
//! and derives an output tree conforming to the output schema, node by
//! node, following the directives:
//!
//! - `constant` assigns a literal
//! - `copy` projects a single source path
//! - `fanOut` maps every element of a source array to one output object
//! - `object` builds a nested object from its own directive table
//! - `operatorChain` applies named operators from the operator library
//!
//! Namespace-qualified names appear in trees as `prefix_local` keys,
//! attributes as `attr_` keys and mixed-content text under `_ELEMVAL`.
//!
//! ## Features
//!
//! - Schema models with namespaces, attributes and mixed content
//! - Path projection with explicit array handling
//! - Operator library (arithmetic, conversion, string)
//! - Input and output shape validation with structured diagnostics
//! - Fan-out depth and array size guards
//! - JSON mapping configurations
//!
//! ## Example
//!
//! ```rust,ignore
//! use datamapper::loaders::ConfigLoader;
//! use datamapper::DocumentTree;
//!
//! let mapper = ConfigLoader::new().load_mapper("mapping.json")?;
//! let input = DocumentTree::from_json_str(r#"{"lead": []}"#)?;
//! let output = mapper.map(&input)?;
//! println!("{}", output.to_json_string(true)?);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Names and trees
pub mod names;
pub mod namespaces;
pub mod tree;
pub mod conventions;

// Schemas and paths
pub mod schema;
pub mod path;

// Mapping
pub mod directives;
pub mod operators;
pub mod engine;

// Configuration loading
pub mod loaders;

// Re-exports for convenience
pub use conventions::KeyConventions;
pub use directives::{ChainStep, Directive, DirectiveKind, DirectiveTable, Operand};
pub use engine::{map, Mapper};
pub use error::{Diagnostic, Error, Result};
pub use limits::Limits;
pub use loaders::{ConfigLoader, MappingConfig};
pub use namespaces::NamespaceTable;
pub use operators::OperatorLibrary;
pub use path::Path;
pub use schema::{NodeKind, ScalarType, SchemaModel, SchemaNode};
pub use tree::{DocumentTree, Value};

/// Version of the datamapper library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
