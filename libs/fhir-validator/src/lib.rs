//! Schema-driven validation of record instances
//!
//! A [`Validator`] walks a record against its [`RecordSchema`] from the
//! registry, field by field in schema order, and collects every problem it
//! finds as a [`ValidationIssue`]. Nothing short-circuits: a record with
//! three defects yields three issues.
//!
//! What is checked is configured declaratively with a [`ValidatorConfig`],
//! which compiles into a [`ValidationPlan`]:
//!
//! ```
//! use std::sync::Arc;
//! use tessera_schema::SchemaRegistry;
//! use tessera_validator::{IssueKind, Preset, Validator, ValidatorConfig};
//! use tessera_models::RecordInstance;
//!
//! let registry = Arc::new(SchemaRegistry::builtin().unwrap());
//! let config = ValidatorConfig::preset(Preset::Default);
//! let validator = Validator::from_config(&config, registry).unwrap();
//!
//! let appointment = RecordInstance::new("Appointment");
//! let outcome = validator.validate(&appointment);
//! assert!(!outcome.valid);
//! assert_eq!(outcome.issues_of(IssueKind::MissingRequiredField).count(), 2);
//! ```
//!
//! [`RecordSchema`]: tessera_schema::RecordSchema

mod config;
mod error;
mod plan;
pub mod steps;
mod validator;

pub use config::{
    AdvisoryHandling, Preset, ReferenceMode, ReferencesConfig, SchemaConfig, TerminologyConfig,
    TerminologyMode, UnknownContentHandling, ValidatorConfig, ValidatorConfigBuilder,
};
pub use error::ConfigError;
pub use plan::{ReferencesPlan, SchemaPlan, Step, TerminologyPlan, ValidationPlan};
pub use validator::{
    validate, IssueCode, IssueKind, IssueSeverity, ValidationIssue, ValidationOutcome, Validator,
};
