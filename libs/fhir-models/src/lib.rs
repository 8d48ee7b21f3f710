//! Record instances for the typed-record engine
//!
//! A [`RecordInstance`] is one generic container for every record type: the
//! record's shape comes from a [`tessera_schema::RecordSchema`], not from a
//! compiled struct per type.
//!
//! # Module Organization
//!
//! - `primitive`, `temporal`: decoded primitive values, including the
//!   standard's reduced-precision dates and times
//! - `reference`: non-owning pointers to other records
//! - `record`: field values and record instances
//! - `builder`: schema-aware construction
//! - `equality`: structural equality, hashing and deduplication
//!
//! # Example
//!
//! ```rust
//! use tessera_models::{structural_eq, RecordBuilder, ReferenceValue};
//! use tessera_schema::SchemaRegistry;
//!
//! let registry = SchemaRegistry::builtin().unwrap();
//! let schema = registry.lookup("DeviceRequest").unwrap();
//!
//! let request = RecordBuilder::new(schema)
//!     .set("status", "active")
//!     .unwrap()
//!     .choice("code", "Reference", ReferenceValue::new("Device/infusion-pump"))
//!     .unwrap()
//!     .build();
//!
//! assert!(request.contains("codeReference"));
//! assert!(structural_eq(&request, &request.clone()));
//! ```

pub mod builder;
pub mod equality;
pub mod error;
pub mod primitive;
pub mod record;
pub mod reference;
pub mod temporal;

pub use builder::RecordBuilder;
pub use equality::{dedup_structural, field_value_eq, structural_eq, structural_hash};
pub use error::{Error, PrimitiveError, Result};
pub use primitive::{parse_decimal, PrimitiveValue};
pub use record::{FieldEntry, FieldValue, RecordInstance};
pub use reference::ReferenceValue;
pub use temporal::{DatePrecision, PartialDate, PartialDateTime, PartialTime, TemporalError, TzOffset};
