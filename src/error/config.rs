use super::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON config '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unsupported config extension '{ext}'. Use .toml or .json.")]
    UnsupportedExtension { ext: String },
    #[error("Config file must have .toml or .json extension.")]
    MissingExtension,
    #[error("Invalid duration for '{field}': {source}")]
    InvalidDuration {
        field: String,
        #[source]
        source: ValidationError,
    },
    #[error("Config must define at least one stage.")]
    StagesEmpty,
    #[error("pacing_min ({min_ms}ms) must not exceed pacing_max ({max_ms}ms).")]
    PacingRangeInverted { min_ms: u128, max_ms: u128 },
    #[error("Threshold error_rate must be within [0, 1], got {value}.")]
    ErrorRateOutOfRange { value: f64 },
    #[error("Threshold p95_ms must be > 0.")]
    P95MustBePositive,
}
