//! Declarative validator configuration
//!
//! A [`ValidatorConfig`] says *what* to check; [`ValidatorConfig::compile`]
//! turns it into a [`ValidationPlan`] the validator executes. Configurations
//! start from a [`Preset`] and can be adjusted with the builder or loaded
//! from YAML, where any section left out keeps the preset's values:
//!
//! ```yaml
//! preset: Strict
//! terminology:
//!   extensible_handling: Information
//! ```

use crate::plan::{ReferencesPlan, SchemaPlan, Step, TerminologyPlan, ValidationPlan};
use crate::ConfigError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Preset {
    /// Required bindings and declared reference hints are enforced; unknown
    /// content is a warning
    #[default]
    Default,
    /// Unknown content is an error and populated modifiers are reported.
    /// Reference targets are also inferred from literals.
    Strict,
    /// Unknown content is accepted and advisory bindings are not reported
    Lenient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    #[serde(default)]
    pub preset: Preset,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub terminology: TerminologyConfig,
    #[serde(default)]
    pub references: ReferencesConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// How content that no schema field describes is reported
    pub unknown_content: UnknownContentHandling,
    /// Emit an information issue for every populated modifier field
    pub report_modifiers: bool,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            unknown_content: UnknownContentHandling::Warning,
            report_modifiers: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnknownContentHandling {
    Allow,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminologyConfig {
    pub mode: TerminologyMode,
    /// Severity of a code outside an `extensible` binding
    pub extensible_handling: AdvisoryHandling,
    /// Severity of a code outside a `preferred` or `example` binding
    pub preferred_handling: AdvisoryHandling,
}

impl Default for TerminologyConfig {
    fn default() -> Self {
        Self {
            mode: TerminologyMode::Local,
            extensible_handling: AdvisoryHandling::Warning,
            preferred_handling: AdvisoryHandling::Information,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminologyMode {
    /// No binding checks
    Off,
    /// Membership in the allow-lists carried by the schema
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvisoryHandling {
    Ignore,
    Information,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferencesConfig {
    pub mode: ReferenceMode,
    /// Without an explicit type hint, take the target type from a `Type/id`
    /// literal
    pub infer_from_literal: bool,
}

impl Default for ReferencesConfig {
    fn default() -> Self {
        Self {
            mode: ReferenceMode::TypeOnly,
            infer_from_literal: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceMode {
    Off,
    /// Check the target type against the field's allowed targets
    TypeOnly,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self::preset(Preset::Default)
    }
}

impl ValidatorConfig {
    pub fn preset(preset: Preset) -> Self {
        let mut config = Self {
            preset,
            schema: SchemaConfig::default(),
            terminology: TerminologyConfig::default(),
            references: ReferencesConfig::default(),
        };

        match preset {
            Preset::Default => {}
            Preset::Strict => {
                config.schema.unknown_content = UnknownContentHandling::Error;
                config.schema.report_modifiers = true;
                config.references.infer_from_literal = true;
            }
            Preset::Lenient => {
                config.schema.unknown_content = UnknownContentHandling::Allow;
                config.terminology.extensible_handling = AdvisoryHandling::Ignore;
                config.terminology.preferred_handling = AdvisoryHandling::Ignore;
            }
        }
        config
    }

    pub fn builder() -> ValidatorConfigBuilder {
        ValidatorConfigBuilder::default()
    }

    /// Parse a YAML configuration; sections it leaves out come from its
    /// `preset` (or [`Preset::Default`])
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let overrides: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        if overrides.is_null() {
            return Ok(Self::default());
        }
        if !overrides.is_mapping() {
            return Err(ConfigError::InvalidConfig(
                "the configuration must be a YAML mapping".to_string(),
            ));
        }
        let preset = match overrides.get("preset") {
            Some(value) => serde_yaml::from_value(value.clone())?,
            None => Preset::Default,
        };

        let mut merged = serde_yaml::to_value(Self::preset(preset))?;
        merge_yaml(&mut merged, overrides);
        Ok(serde_yaml::from_value(merged)?)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check the configuration and produce an executable plan
    pub fn compile(&self) -> Result<ValidationPlan, ConfigError> {
        if self.references.infer_from_literal && self.references.mode == ReferenceMode::Off {
            return Err(ConfigError::InferenceWithoutReferenceChecks);
        }

        let mut steps = vec![Step::Cardinality, Step::ChoiceExclusivity, Step::Types];
        if self.terminology.mode == TerminologyMode::Local {
            steps.push(Step::Bindings(TerminologyPlan::from(&self.terminology)));
        }
        if self.references.mode == ReferenceMode::TypeOnly {
            steps.push(Step::ReferenceTargets(ReferencesPlan::from(&self.references)));
        }
        if self.schema.report_modifiers {
            steps.push(Step::Modifiers);
        }

        Ok(ValidationPlan {
            steps,
            schema: SchemaPlan::from(&self.schema),
        })
    }
}

fn merge_yaml(base: &mut serde_yaml::Value, overrides: serde_yaml::Value) {
    match (base, overrides) {
        (serde_yaml::Value::Mapping(base), serde_yaml::Value::Mapping(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overrides) => *base = overrides,
    }
}

#[derive(Debug, Default)]
pub struct ValidatorConfigBuilder {
    preset: Option<Preset>,
    unknown_content: Option<UnknownContentHandling>,
    report_modifiers: Option<bool>,
    terminology_mode: Option<TerminologyMode>,
    extensible_handling: Option<AdvisoryHandling>,
    preferred_handling: Option<AdvisoryHandling>,
    reference_mode: Option<ReferenceMode>,
    infer_from_literal: Option<bool>,
}

impl ValidatorConfigBuilder {
    pub fn preset(mut self, preset: Preset) -> Self {
        self.preset = Some(preset);
        self
    }

    pub fn unknown_content(mut self, handling: UnknownContentHandling) -> Self {
        self.unknown_content = Some(handling);
        self
    }

    pub fn report_modifiers(mut self, enabled: bool) -> Self {
        self.report_modifiers = Some(enabled);
        self
    }

    pub fn terminology_mode(mut self, mode: TerminologyMode) -> Self {
        self.terminology_mode = Some(mode);
        self
    }

    pub fn extensible_handling(mut self, handling: AdvisoryHandling) -> Self {
        self.extensible_handling = Some(handling);
        self
    }

    pub fn preferred_handling(mut self, handling: AdvisoryHandling) -> Self {
        self.preferred_handling = Some(handling);
        self
    }

    pub fn reference_mode(mut self, mode: ReferenceMode) -> Self {
        self.reference_mode = Some(mode);
        self
    }

    pub fn infer_from_literal(mut self, enabled: bool) -> Self {
        self.infer_from_literal = Some(enabled);
        self
    }

    pub fn build(self) -> ValidatorConfig {
        let mut config = ValidatorConfig::preset(self.preset.unwrap_or_default());

        if let Some(v) = self.unknown_content {
            config.schema.unknown_content = v;
        }
        if let Some(v) = self.report_modifiers {
            config.schema.report_modifiers = v;
        }
        if let Some(v) = self.terminology_mode {
            config.terminology.mode = v;
        }
        if let Some(v) = self.extensible_handling {
            config.terminology.extensible_handling = v;
        }
        if let Some(v) = self.preferred_handling {
            config.terminology.preferred_handling = v;
        }
        if let Some(v) = self.reference_mode {
            config.references.mode = v;
        }
        if let Some(v) = self.infer_from_literal {
            config.references.infer_from_literal = v;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_compile() {
        for preset in [Preset::Default, Preset::Strict, Preset::Lenient] {
            let plan = ValidatorConfig::preset(preset).compile().unwrap();
            assert!(plan.steps.contains(&Step::Cardinality));
        }
        let strict = ValidatorConfig::preset(Preset::Strict).compile().unwrap();
        assert!(strict.steps.contains(&Step::Modifiers));
    }

    #[test]
    fn strict_changes_schema_and_reference_settings_only() {
        let default = ValidatorConfig::default();
        let strict = ValidatorConfig::preset(Preset::Strict);

        assert_eq!(strict.terminology, default.terminology);
        assert_eq!(strict.schema.unknown_content, UnknownContentHandling::Error);
        assert!(strict.schema.report_modifiers);
        assert!(strict.references.infer_from_literal);
        assert!(!default.references.infer_from_literal);
    }

    #[test]
    fn builder_overrides_preset() {
        let config = ValidatorConfig::builder()
            .preset(Preset::Lenient)
            .terminology_mode(TerminologyMode::Off)
            .reference_mode(ReferenceMode::Off)
            .build();
        let plan = config.compile().unwrap();
        assert_eq!(
            plan.steps,
            vec![Step::Cardinality, Step::ChoiceExclusivity, Step::Types]
        );
        assert_eq!(plan.schema.unknown_content, UnknownContentHandling::Allow);
    }

    #[test]
    fn inference_needs_reference_checks() {
        let config = ValidatorConfig::builder()
            .reference_mode(ReferenceMode::Off)
            .infer_from_literal(true)
            .build();
        assert!(matches!(
            config.compile(),
            Err(ConfigError::InferenceWithoutReferenceChecks)
        ));
    }

    #[test]
    fn yaml_sections_overlay_the_preset() {
        let config = ValidatorConfig::from_yaml(
            r#"
preset: Strict
terminology:
  extensible_handling: Information
"#,
        )
        .unwrap();
        assert_eq!(config.preset, Preset::Strict);
        assert_eq!(
            config.terminology.extensible_handling,
            AdvisoryHandling::Information
        );
        assert_eq!(config.terminology.mode, TerminologyMode::Local);
        assert_eq!(config.schema.unknown_content, UnknownContentHandling::Error);
        assert!(config.references.infer_from_literal);
    }

    #[test]
    fn yaml_round_trip() {
        let config = ValidatorConfig::preset(Preset::Lenient);
        let yaml = config.to_yaml().unwrap();
        assert_eq!(ValidatorConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn non_mapping_yaml_is_rejected() {
        assert!(matches!(
            ValidatorConfig::from_yaml("- Strict"),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(matches!(
            ValidatorConfig::from_yaml("terminology: { mode: Remote }"),
            Err(ConfigError::Yaml(_))
        ));
    }
}
