use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("inferring reference targets from literals requires references.mode TypeOnly")]
    InferenceWithoutReferenceChecks,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
