use crate::steps::{self, FieldCheck};
use crate::{ConfigError, Step, ValidationPlan};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tessera_models::{FieldValue, RecordInstance};
use tessera_schema::{FieldDescriptor, RecordSchema, SchemaRegistry};

/// Reusable validator - owns the plan and a shared registry
#[derive(Debug, Clone)]
pub struct Validator {
    plan: ValidationPlan,
    registry: Arc<SchemaRegistry>,
}

impl Validator {
    pub fn new(plan: ValidationPlan, registry: Arc<SchemaRegistry>) -> Self {
        Self { plan, registry }
    }

    pub fn from_config(
        config: &crate::ValidatorConfig,
        registry: Arc<SchemaRegistry>,
    ) -> Result<Self, ConfigError> {
        let plan = config.compile()?;
        Ok(Self::new(plan, registry))
    }

    pub fn validate(&self, instance: &RecordInstance) -> ValidationOutcome {
        ValidationRun::new(&self.plan, &self.registry).execute(instance)
    }

    pub fn validate_batch(&self, instances: &[RecordInstance]) -> Vec<ValidationOutcome> {
        instances.iter().map(|i| self.validate(i)).collect()
    }

    pub fn plan(&self) -> &ValidationPlan {
        &self.plan
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }
}

/// Validate with the default plan
pub fn validate(instance: &RecordInstance, registry: &SchemaRegistry) -> Vec<ValidationIssue> {
    let plan = ValidationPlan::default();
    ValidationRun::new(&plan, registry).execute(instance).issues
}

/// Short-lived validation execution
struct ValidationRun<'a> {
    plan: &'a ValidationPlan,
    registry: &'a SchemaRegistry,
    issues: Vec<ValidationIssue>,
}

impl<'a> ValidationRun<'a> {
    fn new(plan: &'a ValidationPlan, registry: &'a SchemaRegistry) -> Self {
        Self {
            plan,
            registry,
            issues: Vec::new(),
        }
    }

    fn execute(mut self, instance: &RecordInstance) -> ValidationOutcome {
        let type_name = instance.type_name().to_string();
        let registry = self.registry;

        match registry.get(&type_name) {
            Some(schema) => self.validate_record(instance, schema, &type_name),
            None => self.issues.push(ValidationIssue::fatal(
                IssueKind::UnknownType,
                type_name.clone(),
                format!("no schema is registered for record type '{}'", type_name),
            )),
        }

        let outcome = ValidationOutcome {
            type_name,
            valid: !self.has_errors(),
            issues: self.issues,
        };
        tracing::debug!(
            type_name = %outcome.type_name,
            valid = outcome.valid,
            issues = outcome.issues.len(),
            "validated record"
        );
        outcome
    }

    fn validate_record(&mut self, record: &RecordInstance, schema: &RecordSchema, path: &str) {
        let plan = self.plan;
        for field in schema.fields() {
            let check = FieldCheck {
                record_path: path,
                field,
                entries: record.entries_for(field),
                kept: kept_occurrences(record, field),
            };

            for step in &plan.steps {
                self.execute_step(step, &check);
            }
            self.descend(&check);
        }

        steps::schema::check_unmatched_keys(record, schema, path, &mut self.issues);
        steps::schema::check_unknown_content(
            record,
            schema,
            path,
            &plan.schema,
            &mut self.issues,
        );
    }

    fn execute_step(&mut self, step: &Step, check: &FieldCheck<'_>) {
        match step {
            Step::Cardinality => steps::cardinality::check_cardinality(check, &mut self.issues),
            Step::ChoiceExclusivity => {
                steps::cardinality::check_choice_exclusivity(check, &mut self.issues)
            }
            Step::Types => steps::types::check_types(check, &mut self.issues),
            Step::Bindings(plan) => steps::bindings::check_bindings(check, plan, &mut self.issues),
            Step::ReferenceTargets(plan) => {
                steps::references::check_reference_targets(check, plan, &mut self.issues)
            }
            Step::Modifiers => steps::schema::check_modifiers(check, &mut self.issues),
        }
    }

    /// Recurse into nested records, prefixing their paths with the item path
    fn descend(&mut self, check: &FieldCheck<'_>) {
        let registry = self.registry;
        for (path, item) in check.items() {
            let FieldValue::Single(child) = item else {
                continue;
            };
            match registry.get(child.type_name()) {
                Some(schema) => self.validate_record(child, schema, &path),
                None => self.issues.push(ValidationIssue::error(
                    IssueKind::UnknownType,
                    path,
                    format!("no schema is registered for record type '{}'", child.type_name()),
                )),
            }
        }
    }

    fn has_errors(&self) -> bool {
        self.issues.iter().any(ValidationIssue::is_error)
    }
}

/// Items of a repeated primitive kept in side-channel content under one of
/// the field's wire keys (some of them carry only an `id` or extensions)
fn kept_occurrences(record: &RecordInstance, field: &FieldDescriptor) -> usize {
    field
        .wire_keys()
        .iter()
        .filter_map(|(key, _)| record.unknown().get(key).and_then(Value::as_array))
        .map(Vec::len)
        .max()
        .unwrap_or(0)
}

/// Validation result for a single record
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub type_name: String,
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationOutcome {
    pub fn success(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            valid: true,
            issues: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.valid
    }

    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Warning)
            .count()
    }

    /// Issues of one kind, in report order
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    pub fn to_operation_outcome(&self) -> Value {
        serde_json::json!({
            "resourceType": "OperationOutcome",
            "issue": self.issues.iter().map(|i| i.to_json()).collect::<Vec<_>>()
        })
    }
}

/// Individual validation issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub kind: IssueKind,
    /// Dotted field path, e.g. `Appointment.participant[0].status`
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        severity: IssueSeverity,
        kind: IssueKind,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn fatal(kind: IssueKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(IssueSeverity::Fatal, kind, path, message)
    }

    pub fn error(kind: IssueKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(IssueSeverity::Error, kind, path, message)
    }

    pub fn warning(kind: IssueKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(IssueSeverity::Warning, kind, path, message)
    }

    pub fn information(
        kind: IssueKind,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(IssueSeverity::Information, kind, path, message)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, IssueSeverity::Error | IssueSeverity::Fatal)
    }

    fn to_json(&self) -> Value {
        serde_json::json!({
            "severity": self.severity.to_string().to_lowercase(),
            "code": self.kind.code().to_string(),
            "details": { "text": self.kind.to_string() },
            "diagnostics": self.message,
            "expression": [self.path],
        })
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} at {}: {}",
            self.severity, self.kind, self.path, self.message
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IssueSeverity {
    Fatal,
    Error,
    Warning,
    Information,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fatal => write!(f, "Fatal"),
            Self::Error => write!(f, "Error"),
            Self::Warning => write!(f, "Warning"),
            Self::Information => write!(f, "Information"),
        }
    }
}

/// What a validation issue is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    MissingRequiredField,
    CardinalityExceeded,
    AmbiguousChoice,
    TypeMismatch,
    CodeNotInValueSet,
    InvalidReferenceTarget,
    UnknownField,
    UnknownType,
    ModifierPresent,
}

impl IssueKind {
    /// OperationOutcome issue type for this kind
    pub fn code(self) -> IssueCode {
        match self {
            Self::MissingRequiredField => IssueCode::Required,
            Self::CardinalityExceeded => IssueCode::Structure,
            Self::AmbiguousChoice => IssueCode::Structure,
            Self::TypeMismatch => IssueCode::Value,
            Self::CodeNotInValueSet => IssueCode::CodeInvalid,
            Self::InvalidReferenceTarget => IssueCode::Invalid,
            Self::UnknownField => IssueCode::Structure,
            Self::UnknownType => IssueCode::NotSupported,
            Self::ModifierPresent => IssueCode::BusinessRule,
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingRequiredField => "MissingRequiredField",
            Self::CardinalityExceeded => "CardinalityExceeded",
            Self::AmbiguousChoice => "AmbiguousChoice",
            Self::TypeMismatch => "TypeMismatch",
            Self::CodeNotInValueSet => "CodeNotInValueSet",
            Self::InvalidReferenceTarget => "InvalidReferenceTarget",
            Self::UnknownField => "UnknownField",
            Self::UnknownType => "UnknownType",
            Self::ModifierPresent => "ModifierPresent",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueCode {
    Invalid,
    Structure,
    Required,
    Value,
    NotSupported,
    CodeInvalid,
    BusinessRule,
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Invalid => "invalid",
            Self::Structure => "structure",
            Self::Required => "required",
            Self::Value => "value",
            Self::NotSupported => "not-supported",
            Self::CodeInvalid => "code-invalid",
            Self::BusinessRule => "business-rule",
        };
        write!(f, "{}", s)
    }
}
