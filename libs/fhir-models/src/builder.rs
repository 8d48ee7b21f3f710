//! Schema-aware record construction
//!
//! [`RecordBuilder`] populates a [`RecordInstance`] field by field against a
//! [`RecordSchema`]: keys are resolved (host aliases included) to canonical
//! wire keys, values are checked against the declared type, repeated fields
//! are always stored as [`FieldValue::Repeated`] (single-valued fields never
//! hold a one-item repetition), and setting one alternative of a choice
//! field clears the others.

use crate::error::{Error, Result};
use crate::record::{FieldValue, RecordInstance};
use crate::reference::ReferenceValue;
use serde_json::Value;
use tessera_schema::{FieldDescriptor, RecordSchema, TypeRef};

#[derive(Debug)]
pub struct RecordBuilder<'s> {
    schema: &'s RecordSchema,
    instance: RecordInstance,
}

impl<'s> RecordBuilder<'s> {
    pub fn new(schema: &'s RecordSchema) -> Self {
        Self {
            schema,
            instance: RecordInstance::new(schema.name()),
        }
    }

    /// Set a field, replacing any previous value. Choice alternatives are
    /// addressed by their suffixed key (`codeReference`).
    pub fn set(mut self, key: &str, value: impl Into<FieldValue>) -> Result<Self> {
        let (field, type_ref, wire_key) = self.resolve(key)?;
        let value = value.into();
        self.check_value(field, &type_ref, &value)?;

        let repeated = field.cardinality.is_repeated();
        let value = match value {
            // Left for the validator to count when there is more than one
            FieldValue::Repeated(mut items) if !repeated && items.len() == 1 => items.remove(0),
            FieldValue::Repeated(items) => FieldValue::Repeated(items),
            single if repeated => FieldValue::Repeated(vec![single]),
            single => single,
        };
        self.clear_siblings(field, &wire_key);
        self.instance.insert(wire_key, value);
        Ok(self)
    }

    /// Append one occurrence to a repeated field; behaves like
    /// [`RecordBuilder::set`] on single-valued fields
    pub fn push(mut self, key: &str, value: impl Into<FieldValue>) -> Result<Self> {
        let value = value.into();
        if value.is_repeated() {
            return Err(Error::NestedRepeated);
        }

        let (field, type_ref, wire_key) = self.resolve(key)?;
        if !field.cardinality.is_repeated() {
            return self.set(key, value);
        }
        self.check_value(field, &type_ref, &value)?;

        match self.instance.get_mut(&wire_key) {
            Some(FieldValue::Repeated(items)) => items.push(value),
            _ => {
                self.instance.insert(wire_key, FieldValue::Repeated(vec![value]));
            }
        }
        Ok(self)
    }

    /// Populate a choice field by field name and alternative type code
    pub fn choice(self, field_name: &str, type_code: &str, value: impl Into<FieldValue>) -> Result<Self> {
        let field = self.field(field_name)?;
        let Some(alternative) = field
            .kind
            .types()
            .into_iter()
            .find(|alt| alt.code() == type_code)
            .filter(|_| field.kind.is_choice())
        else {
            return Err(if field.kind.is_choice() {
                Error::NotAnAlternative {
                    type_name: self.schema.name().to_string(),
                    field: field_name.to_string(),
                    alternative: type_code.to_string(),
                }
            } else {
                Error::NotAChoice {
                    type_name: self.schema.name().to_string(),
                    field: field_name.to_string(),
                }
            });
        };

        let key = field.key_for(&alternative);
        self.set(&key, value)
    }

    pub fn reference(self, key: &str, reference: ReferenceValue) -> Result<Self> {
        self.set(key, FieldValue::Reference(reference))
    }

    /// Attach content that no field of the schema describes
    pub fn unknown(mut self, key: impl Into<String>, value: Value) -> Self {
        self.instance.insert_unknown(key, value);
        self
    }

    pub fn build(self) -> RecordInstance {
        self.instance
    }

    fn field(&self, name: &str) -> Result<&'s FieldDescriptor> {
        let schema = self.schema;
        schema
            .field(schema.wire_key(name))
            .ok_or_else(|| Error::UnknownField {
                type_name: schema.name().to_string(),
                key: name.to_string(),
            })
    }

    fn resolve(&self, key: &str) -> Result<(&'s FieldDescriptor, TypeRef, String)> {
        let schema = self.schema;
        let resolved = schema.resolve(key).ok_or_else(|| Error::UnknownField {
            type_name: schema.name().to_string(),
            key: key.to_string(),
        })?;
        let type_ref = resolved.type_ref();
        let wire_key = resolved.field.key_for(&type_ref);
        Ok((resolved.field, type_ref, wire_key))
    }

    fn check_value(&self, field: &FieldDescriptor, type_ref: &TypeRef, value: &FieldValue) -> Result<()> {
        let fits = |item: &FieldValue| match (type_ref, item) {
            (TypeRef::Primitive(kind), FieldValue::Primitive(p)) => {
                p.scalar_class() == kind.scalar_class()
            }
            (TypeRef::Complex(_), FieldValue::Reference(_)) => type_ref.is_reference(),
            (TypeRef::Complex(name), FieldValue::Single(record)) => record.type_name() == name,
            _ => false,
        };

        let ok = match value {
            FieldValue::Repeated(items) => items.iter().all(|item| !item.is_repeated() && fits(item)),
            single => fits(single),
        };
        if ok {
            Ok(())
        } else {
            Err(Error::WrongValueKind {
                type_name: self.schema.name().to_string(),
                field: field.name.clone(),
                expected: type_ref.code().to_string(),
            })
        }
    }

    fn clear_siblings(&mut self, field: &FieldDescriptor, keep: &str) {
        if !field.kind.is_choice() {
            return;
        }
        for (key, _) in field.wire_keys() {
            if key != keep {
                self.instance.remove(&key);
            }
        }
    }
}
