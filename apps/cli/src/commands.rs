//! Subcommand handlers

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tessera_format::{record_from_json, record_from_xml, record_to_json, record_to_xml};
use tessera_models::RecordInstance;
use tessera_schema::{FieldDescriptor, FieldKind, RecordSchema, SchemaRegistry};
use tessera_validator::{Validator, ValidatorConfig};

/// Wire format of a record document
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Xml,
    Json,
}

impl Format {
    /// Format named by the file extension, else guessed from the content
    pub fn detect(path: &Path, text: &str) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xml") => Self::Xml,
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ if text.trim_start().starts_with('<') => Self::Xml,
            _ => Self::Json,
        }
    }
}

/// Registry with the built-in definitions (unless disabled) plus every
/// extra definition path, in order
pub fn load_registry(builtin: bool, paths: &[PathBuf]) -> Result<SchemaRegistry> {
    let mut registry = if builtin {
        SchemaRegistry::builtin().context("Failed to load built-in schemas")?
    } else {
        SchemaRegistry::new()
    };

    for path in paths {
        let count = registry
            .load_path(path)
            .with_context(|| format!("Failed to load schemas from {}", path.display()))?;
        tracing::info!(path = %path.display(), count, "Registered schema definitions");
    }

    if registry.is_empty() {
        bail!("No schemas registered; pass --schemas or drop --no-builtin");
    }
    Ok(registry)
}

pub fn load_config(path: Option<&Path>) -> Result<ValidatorConfig> {
    let Some(path) = path else {
        return Ok(ValidatorConfig::default());
    };
    let yaml = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration {}", path.display()))?;
    ValidatorConfig::from_yaml(&yaml)
        .with_context(|| format!("Invalid configuration in {}", path.display()))
}

/// A document read from a file, or stdin for `-`
struct Document {
    path: PathBuf,
    text: String,
}

impl Document {
    fn read(path: &Path) -> Result<Self> {
        let text = if path == Path::new("-") {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            text
        } else {
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?
        };
        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }

    fn decode(&self, format: Option<Format>, registry: &SchemaRegistry) -> Result<RecordInstance> {
        let format = format.unwrap_or_else(|| Format::detect(&self.path, &self.text));
        let record = match format {
            Format::Xml => record_from_xml(&self.text, registry),
            Format::Json => record_from_json(&self.text, registry),
        };
        record.with_context(|| format!("Failed to decode {}", self.path.display()))
    }
}

// ============================================================================
// validate
// ============================================================================

pub fn validate(
    files: &[PathBuf],
    format: Option<Format>,
    outcome: bool,
    registry: Arc<SchemaRegistry>,
    config: &ValidatorConfig,
) -> Result<ExitCode> {
    let validator = Validator::from_config(config, Arc::clone(&registry))
        .context("Failed to compile the validator configuration")?;

    let mut failed = 0usize;
    for path in files {
        let document = Document::read(path)?;
        let record = document.decode(format, &registry)?;
        let result = validator.validate(&record);

        tracing::info!(
            path = %path.display(),
            type_name = %result.type_name,
            errors = result.error_count(),
            warnings = result.warning_count(),
            "Validated record"
        );

        if outcome {
            let json = serde_json::to_string_pretty(&result.to_operation_outcome())?;
            println!("{}", json);
        } else if result.issues.is_empty() {
            println!("{}: {} is valid", path.display(), result.type_name);
        } else {
            for issue in &result.issues {
                println!("{}: {}", path.display(), issue);
            }
        }

        if result.has_errors() {
            failed += 1;
        }
    }

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

// ============================================================================
// convert
// ============================================================================

pub fn convert(
    file: &Path,
    format: Option<Format>,
    to: Format,
    output: Option<&Path>,
    registry: &SchemaRegistry,
) -> Result<()> {
    let document = Document::read(file)?;
    let record = document.decode(format, registry)?;

    let text = match to {
        Format::Xml => record_to_xml(&record, registry),
        Format::Json => record_to_json(&record, registry),
    }
    .with_context(|| format!("Failed to encode {} record", record.type_name()))?;

    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "Wrote converted record");
        }
        None => println!("{}", text),
    }
    Ok(())
}

// ============================================================================
// schemas
// ============================================================================

pub fn schemas(type_name: Option<&str>, registry: &SchemaRegistry) -> Result<()> {
    match type_name {
        Some(name) => {
            let schema = registry
                .lookup(name)
                .with_context(|| format!("Cannot describe '{}'", name))?;
            print!("{}", describe_schema(schema));
        }
        None => {
            let mut schemas: Vec<&RecordSchema> = registry.schemas().collect();
            schemas.sort_by(|a, b| a.name().cmp(b.name()));
            for schema in schemas {
                println!(
                    "{:<28} {:<10} {} fields",
                    schema.name(),
                    schema.kind(),
                    schema.fields().len()
                );
            }
        }
    }
    Ok(())
}

/// One line per field: name, cardinality, type, then binding, reference
/// targets and modifier flag where present
pub fn describe_schema(schema: &RecordSchema) -> String {
    let mut out = format!("{} ({})\n", schema.name(), schema.kind());
    for field in schema.fields() {
        out.push_str(&format!(
            "  {:<24} {:<6} {}{}\n",
            field.name,
            field.cardinality.to_string(),
            field.kind,
            field_notes(field)
        ));
    }
    for (alias, wire) in schema.renames().iter() {
        out.push_str(&format!("  {} is written as '{}'\n", alias, wire));
    }
    out
}

fn field_notes(field: &FieldDescriptor) -> String {
    let mut notes = String::new();
    if let Some(binding) = &field.binding {
        notes.push_str(&format!("  [{} binding", binding.strength));
        if let Some(url) = &binding.value_set {
            notes.push_str(&format!(" to {}", url));
        }
        notes.push(']');
    }
    if !field.reference_targets.is_empty() && field.kind.accepts_reference() {
        notes.push_str(&format!("  -> {}", field.reference_targets.join(" | ")));
    }
    if field.is_modifier {
        notes.push_str("  (modifier)");
    }
    if let FieldKind::Choice(alternatives) = &field.kind {
        let keys: Vec<String> = alternatives.iter().map(|alt| field.key_for(alt)).collect();
        notes.push_str(&format!("  keys: {}", keys.join(", ")));
    }
    notes
}
