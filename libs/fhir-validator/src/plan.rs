use crate::{
    AdvisoryHandling, ReferenceMode, ReferencesConfig, SchemaConfig, TerminologyConfig,
    UnknownContentHandling,
};
use tessera_schema::BindingStrength;

/// Compiled validation plan - per-field checks run in order for every
/// descriptor, plus record-level schema handling
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationPlan {
    pub steps: Vec<Step>,
    pub schema: SchemaPlan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Cardinality,
    ChoiceExclusivity,
    Types,
    Bindings(TerminologyPlan),
    ReferenceTargets(ReferencesPlan),
    Modifiers,
}

impl Default for ValidationPlan {
    fn default() -> Self {
        // The default preset always compiles
        Self {
            steps: vec![
                Step::Cardinality,
                Step::ChoiceExclusivity,
                Step::Types,
                Step::Bindings(TerminologyPlan::from(&TerminologyConfig::default())),
                Step::ReferenceTargets(ReferencesPlan::from(&ReferencesConfig::default())),
            ],
            schema: SchemaPlan::from(&SchemaConfig::default()),
        }
    }
}

// ============================================================================
// Step Plans
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaPlan {
    pub unknown_content: UnknownContentHandling,
}

impl From<&SchemaConfig> for SchemaPlan {
    fn from(cfg: &SchemaConfig) -> Self {
        Self {
            unknown_content: cfg.unknown_content,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TerminologyPlan {
    pub extensible_handling: AdvisoryHandling,
    pub preferred_handling: AdvisoryHandling,
}

impl TerminologyPlan {
    /// How a code outside a binding of the given strength is reported;
    /// `None` means it is not an error at all
    pub fn handling(&self, strength: BindingStrength) -> Option<AdvisoryHandling> {
        match strength {
            BindingStrength::Required => None,
            BindingStrength::Extensible => Some(self.extensible_handling),
            BindingStrength::Preferred | BindingStrength::Example => {
                Some(self.preferred_handling)
            }
        }
    }
}

impl From<&TerminologyConfig> for TerminologyPlan {
    fn from(cfg: &TerminologyConfig) -> Self {
        Self {
            extensible_handling: cfg.extensible_handling,
            preferred_handling: cfg.preferred_handling,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferencesPlan {
    pub infer_from_literal: bool,
}

impl From<&ReferencesConfig> for ReferencesPlan {
    fn from(cfg: &ReferencesConfig) -> Self {
        Self {
            infer_from_literal: cfg.mode == ReferenceMode::TypeOnly && cfg.infer_from_literal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidatorConfig;

    #[test]
    fn default_plan_matches_default_preset() {
        assert_eq!(
            ValidationPlan::default(),
            ValidatorConfig::default().compile().unwrap()
        );
    }
}
