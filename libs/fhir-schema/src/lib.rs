//! Record schemas for the typed-record engine
//!
//! A record type is described as data: a [`RecordSchema`] holding an ordered
//! list of [`FieldDescriptor`]s (name, declared type or choice of types,
//! cardinality, code binding, reference targets). Schemas are registered once
//! in a [`SchemaRegistry`] and shared read-only afterwards.
//!
//! # Example
//!
//! ```rust
//! use tessera_schema::{Cardinality, FieldDescriptor, PrimitiveKind, RecordSchema, SchemaRegistry};
//!
//! let mut registry = SchemaRegistry::new();
//! registry
//!     .register(RecordSchema::resource(
//!         "Basic",
//!         vec![
//!             FieldDescriptor::complex("code", "CodeableConcept")
//!                 .with_cardinality(Cardinality::REQUIRED),
//!             FieldDescriptor::primitive("created", PrimitiveKind::Date),
//!         ],
//!     ))
//!     .unwrap();
//!
//! let schema = registry.lookup("Basic").unwrap();
//! assert!(schema.field("code").unwrap().cardinality.is_required());
//! ```

mod builtin;
pub mod definition;
pub mod descriptor;
pub mod error;
pub mod primitive;
pub mod registry;
pub mod schema;

pub use definition::{BindingDefinition, FieldDefinition, RenameDefinition, SchemaDefinition};
pub use descriptor::{
    choice_suffix, BindingStrength, Cardinality, CodeBinding, FieldDescriptor, FieldKind, Max,
    TypeRef, CODEABLE_CONCEPT_TYPE, CODING_TYPE, REFERENCE_TYPE,
};
pub use error::{Result, SchemaError};
pub use primitive::{PrimitiveKind, ScalarClass};
pub use registry::SchemaRegistry;
pub use schema::{RecordKind, RecordSchema, RenameTable, ResolvedKey};
