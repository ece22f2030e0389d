use std::time::Duration;

use serde_json::Value;

use super::catalog::EndpointKind;
use super::dispatch::ResponseOutcome;

pub const CHECK_STATUS_OK: &str = "status is 200";
pub const CHECK_RESPONSE_TIME: &str = "response time < 2s";
pub const CHECK_HAS_CONTENT: &str = "response has content";
pub const CHECK_IS_JSON: &str = "response is JSON";
pub const CHECK_HEALTHY: &str = "health endpoint returns healthy";
pub const CHECK_PREDICTION_RESULT: &str = "prediction has result";
pub const CHECK_CONFIDENCE_VALID: &str = "confidence is valid";

const RESPONSE_TIME_LIMIT: Duration = Duration::from_secs(2);

/// A named, non-fatal assertion outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
}

impl CheckResult {
    const fn new(name: &'static str, passed: bool) -> Self {
        Self { name, passed }
    }
}

/// View over a prediction response that has both required fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionResult<'body> {
    pub prediction: &'body Value,
    pub confidence: &'body Value,
}

impl<'body> PredictionResult<'body> {
    #[must_use]
    pub fn from_json(json: &'body Value) -> Option<Self> {
        let object = json.as_object()?;
        Some(Self {
            prediction: object.get("prediction")?,
            confidence: object.get("confidence")?,
        })
    }
}

/// Evaluates the generic checks plus the endpoint-specific ones. Missing or
/// malformed JSON makes the JSON-dependent checks fail rather than error.
#[must_use]
pub fn evaluate_checks(kind: EndpointKind, outcome: &ResponseOutcome) -> Vec<CheckResult> {
    let json = outcome.json.as_ref();
    let mut checks = vec![
        CheckResult::new(CHECK_STATUS_OK, outcome.status == 200),
        CheckResult::new(CHECK_RESPONSE_TIME, outcome.latency < RESPONSE_TIME_LIMIT),
        CheckResult::new(CHECK_HAS_CONTENT, !outcome.body.is_empty()),
        CheckResult::new(CHECK_IS_JSON, json.is_some()),
    ];

    match kind {
        EndpointKind::Health => {
            checks.push(CheckResult::new(CHECK_HEALTHY, reports_healthy(json)));
        }
        EndpointKind::Prediction => {
            checks.push(CheckResult::new(
                CHECK_PREDICTION_RESULT,
                json.and_then(PredictionResult::from_json).is_some(),
            ));
            checks.push(CheckResult::new(
                CHECK_CONFIDENCE_VALID,
                confidence_in_range(json),
            ));
        }
        EndpointKind::Other => {}
    }

    checks
}

fn reports_healthy(json: Option<&Value>) -> bool {
    json.and_then(|value| value.get("status"))
        .and_then(Value::as_str)
        == Some("healthy")
}

fn confidence_in_range(json: Option<&Value>) -> bool {
    json.and_then(|value| value.get("confidence"))
        .and_then(Value::as_f64)
        .is_some_and(|confidence| (0.0..=1.0).contains(&confidence))
}
