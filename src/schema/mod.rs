//! Schema layer - turns raw schema JSON into a canonical node tree and a
//! flat, navigable field model.
//!
//! The resolver normalizes composition (`allOf`), nullable unions
//! (`anyOf`/`oneOf` with a null branch) and `$ref` indirection into one
//! tagged variant that the field builder and editors pattern-match on.

pub mod fields;
pub mod resolver;

pub use fields::{build_fields, BaseType, EditorKind, FieldDescriptor};
pub use resolver::{Resolver, SchemaKind, SchemaNode};
