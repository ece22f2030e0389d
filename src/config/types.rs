use serde::Deserialize;

use crate::args::ProfileKind;

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub pushgateway_url: Option<String>,
    pub job_name: Option<String>,
    pub profile: Option<ProfileKind>,
    pub stages: Option<Vec<StageConfig>>,
    pub thresholds: Option<ThresholdsConfig>,
    pub pacing_min: Option<String>,
    pub pacing_max: Option<String>,
    pub graceful_stop: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StageConfig {
    pub duration: String,
    pub target: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct ThresholdsConfig {
    pub p95_ms: Option<u64>,
    pub error_rate: Option<f64>,
}
