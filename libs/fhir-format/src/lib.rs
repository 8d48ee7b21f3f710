//! Wire formats for record instances
//!
//! Two lossless views of the same [`RecordInstance`]:
//! - the tree codec ([`encode_tree`]/[`decode_tree`]) maps records to an
//!   XML-shaped document of [`TreeNode`]s, with [`to_xml`]/[`parse_xml`]
//!   for the text form
//! - the tagged codec ([`encode_tagged`]/[`decode_tagged`]) maps records to
//!   [`TaggedObject`]s holding host-native scalars, with a JSON bridge
//!   ([`to_json`]/[`from_json`])
//!
//! Both are driven by the [`SchemaRegistry`]: choice fields are written under
//! type-suffixed keys, repeated fields always decode to repetitions, and
//! anything the schema does not describe is kept in the record's unknown
//! content and written back out.
//!
//! ```
//! use tessera_format::{record_from_xml, record_to_json};
//! use tessera_schema::SchemaRegistry;
//!
//! let registry = SchemaRegistry::builtin().unwrap();
//! let record = record_from_xml(
//!     r#"<Appointment xmlns="http://hl7.org/fhir">
//!          <status value="booked"/>
//!          <participant><status value="accepted"/></participant>
//!        </Appointment>"#,
//!     &registry,
//! )
//! .unwrap();
//!
//! let json = record_to_json(&record, &registry).unwrap();
//! assert!(json.contains(r#""resourceType": "Appointment""#));
//! ```
//!
//! [`RecordInstance`]: tessera_models::RecordInstance
//! [`SchemaRegistry`]: tessera_schema::SchemaRegistry

mod error;
pub mod tagged;
pub mod tree;
mod unknown;
pub mod xml;

pub use error::{DecodeError, EncodeError};
pub use tagged::{
    decode_tagged, encode_tagged, encode_tagged_with, from_json, json_to_tagged, record_from_json,
    record_to_json, tagged_to_json, to_json, KeyNames, TaggedObject, TaggedValue, TYPE_TAG_KEY,
};
pub use tree::{decode_tree, encode_tree, record_from_xml, record_to_xml};
pub use xml::{parse_xml, to_xml, TreeNode, STANDARD_NS};
