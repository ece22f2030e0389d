use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Built-in workload profile selecting ramp stages and thresholds.
#[derive(Debug, Clone, Copy, ValueEnum, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Load,
    Stress,
}

impl ProfileKind {
    /// Label attached to exported metrics and the teardown report.
    #[must_use]
    pub const fn test_type(self) -> &'static str {
        match self {
            ProfileKind::Load => "load_test",
            ProfileKind::Stress => "stress_test",
        }
    }
}
