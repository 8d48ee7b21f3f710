//! Reference values
//!
//! A reference identifies another record by literal (`Patient/123`,
//! `#contained`, `urn:uuid:...`); it never owns the target.

use serde_json::{Map, Value};

/// A non-owning pointer to another record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceValue {
    /// Literal reference; empty when the reference carries only other members
    pub reference: String,
    /// Explicit target type hint (the `type` element)
    pub target_type: Option<String>,
    pub display: Option<String>,
    /// Members other than `reference`/`type`/`display`, kept verbatim
    pub unknown: Map<String, Value>,
}

impl ReferenceValue {
    pub const REFERENCE_KEY: &'static str = "reference";
    pub const TYPE_KEY: &'static str = "type";
    pub const DISPLAY_KEY: &'static str = "display";

    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, target_type: impl Into<String>) -> Self {
        self.target_type = Some(target_type.into());
        self
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    /// The explicit type hint, else the type segment of a relative or
    /// absolute `Type/id` literal. Contained (`#id`) and URN references have
    /// no inferable type.
    pub fn target_type_or_inferred(&self) -> Option<&str> {
        if let Some(hint) = &self.target_type {
            return Some(hint);
        }
        literal_type(&self.reference)
    }
}

fn literal_type(reference: &str) -> Option<&str> {
    if reference.starts_with('#') || reference.starts_with("urn:") {
        return None;
    }

    let path = reference
        .split_once("/_history/")
        .map(|(path, _)| path)
        .unwrap_or(reference);
    let mut segments = path.rsplit('/');
    let id = segments.next()?;
    let type_name = segments.next()?;

    let is_type = type_name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && type_name.chars().all(|c| c.is_ascii_alphanumeric());
    (!id.is_empty() && is_type).then_some(type_name)
}
