//! Schema registry
//!
//! Populated once at startup, then shared read-only (typically behind an
//! `Arc`). There is no interior mutability: all mutation goes through
//! `&mut self`, so a registry that has been shared can no longer change.

use crate::definition::{self, SchemaDefinition};
use crate::error::{Result, SchemaError};
use crate::schema::RecordSchema;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, RecordSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema, enforcing its descriptor invariants
    pub fn register(&mut self, schema: RecordSchema) -> Result<()> {
        if self.schemas.contains_key(schema.name()) {
            return Err(SchemaError::DuplicateSchema(schema.name().to_string()));
        }
        schema.check()?;

        tracing::debug!(
            type_name = schema.name(),
            kind = %schema.kind(),
            fields = schema.fields().len(),
            "registered schema"
        );
        self.schemas.insert(schema.name().to_string(), schema);
        Ok(())
    }

    /// Register a batch of schemas; nothing is registered if any one fails
    pub fn register_all(&mut self, schemas: Vec<RecordSchema>) -> Result<usize> {
        let mut names = HashSet::new();
        for schema in &schemas {
            if self.schemas.contains_key(schema.name()) || !names.insert(schema.name()) {
                return Err(SchemaError::DuplicateSchema(schema.name().to_string()));
            }
            schema.check()?;
        }

        let count = schemas.len();
        for schema in schemas {
            self.register(schema)?;
        }
        Ok(count)
    }

    pub fn lookup(&self, type_name: &str) -> Result<&RecordSchema> {
        self.schemas
            .get(type_name)
            .ok_or_else(|| SchemaError::UnknownType(type_name.to_string()))
    }

    pub fn get(&self, type_name: &str) -> Option<&RecordSchema> {
        self.schemas.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.schemas.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Registered type names in sorted order
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn schemas(&self) -> impl Iterator<Item = &RecordSchema> {
        self.schemas.values()
    }

    pub fn load_definitions(&mut self, definitions: Vec<SchemaDefinition>) -> Result<usize> {
        let schemas = definitions
            .into_iter()
            .map(RecordSchema::try_from)
            .collect::<Result<Vec<_>>>()?;
        self.register_all(schemas)
    }

    pub fn load_json(&mut self, text: &str) -> Result<usize> {
        self.load_definitions(definition::parse_json(text)?)
    }

    pub fn load_yaml(&mut self, text: &str) -> Result<usize> {
        self.load_definitions(definition::parse_yaml(text)?)
    }

    /// Load a definition file, or every `.json`/`.yaml`/`.yml` file of a
    /// directory in file-name order
    pub fn load_path(&mut self, path: &Path) -> Result<usize> {
        if path.is_dir() {
            let mut files: Vec<_> = fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| definition_format(p).is_some())
                .collect();
            files.sort();

            let mut total = 0;
            for file in files {
                total += self.load_file(&file)?;
            }
            return Ok(total);
        }
        self.load_file(path)
    }

    fn load_file(&mut self, path: &Path) -> Result<usize> {
        let text = fs::read_to_string(path)?;
        let count = match definition_format(path) {
            Some(DefinitionFormat::Yaml) => self.load_yaml(&text)?,
            _ => self.load_json(&text)?,
        };
        tracing::debug!(path = %path.display(), count, "loaded schema definitions");
        Ok(count)
    }

    /// Registry populated with the embedded definitions
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        for (name, text) in crate::builtin::DEFINITIONS {
            let count = registry.load_json(text)?;
            tracing::trace!(file = name, count, "loaded built-in definitions");
        }
        Ok(registry)
    }
}

enum DefinitionFormat {
    Json,
    Yaml,
}

fn definition_format(path: &Path) -> Option<DefinitionFormat> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Some(DefinitionFormat::Json),
        Some("yaml") | Some("yml") => Some(DefinitionFormat::Yaml),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cardinality, FieldDescriptor, Max, PrimitiveKind};

    fn period() -> RecordSchema {
        RecordSchema::data_type(
            "Period",
            vec![
                FieldDescriptor::primitive("start", PrimitiveKind::DateTime),
                FieldDescriptor::primitive("end", PrimitiveKind::DateTime),
            ],
        )
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = SchemaRegistry::new();
        registry.register(period()).unwrap();
        assert_eq!(registry.lookup("Period").unwrap().fields().len(), 2);
        assert!(matches!(
            registry.lookup("Range"),
            Err(SchemaError::UnknownType(name)) if name == "Range"
        ));
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = SchemaRegistry::new();
        registry.register(period()).unwrap();
        assert!(matches!(
            registry.register(period()),
            Err(SchemaError::DuplicateSchema(name)) if name == "Period"
        ));
    }

    #[test]
    fn rejects_min_greater_than_max() {
        let mut registry = SchemaRegistry::new();
        let schema = RecordSchema::resource(
            "Broken",
            vec![FieldDescriptor::primitive("count", PrimitiveKind::Integer)
                .with_cardinality(Cardinality::new(2, Max::Bounded(1)))],
        );
        assert!(matches!(
            registry.register(schema),
            Err(SchemaError::InvalidCardinality { min: 2, .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let mut registry = SchemaRegistry::new();
        let result = registry.register_all(vec![period(), period()]);
        assert!(result.is_err());
        assert!(registry.is_empty());
    }
}
