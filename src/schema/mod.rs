//! Schema model
//!
//! Typed description of an input or output document tree: field names,
//! namespace bindings, attribute vs. element distinction, cardinality and
//! mixed-content markers.

mod model;
pub mod validation;

pub use model::{NodeKind, ScalarType, SchemaModel, SchemaNode};
pub use validation::{first_violation, validate_shape};
