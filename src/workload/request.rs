use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::args::{DEFAULT_USER_AGENT, MODEL_ID, REQUEST_TIMEOUT};

use super::catalog::EndpointKind;
use super::choices::ChoiceSource;

pub const CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Corpus the prediction text is drawn from.
pub const PREDICTION_TEXTS: [&str; 8] = [
    "This is a positive review of the product. I love it!",
    "The service was terrible and I would not recommend it.",
    "Average experience, nothing special but not bad either.",
    "Excellent quality and fast delivery. Highly recommended!",
    "Poor customer service and slow response times.",
    "Good product but could be improved in some areas.",
    "Outstanding performance and great value for money.",
    "Disappointed with the quality and would not buy again.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPayload {
    pub model_id: String,
    pub text: String,
    pub confidence_threshold: f64,
}

impl PredictionPayload {
    pub fn sample<C>(choices: &mut C) -> Self
    where
        C: ChoiceSource + ?Sized,
    {
        let upper = u64::try_from(PREDICTION_TEXTS.len()).unwrap_or(u64::MAX);
        let index = usize::try_from(choices.pick(upper)).unwrap_or(0);
        let text = PREDICTION_TEXTS
            .get(index)
            .copied()
            .unwrap_or_default();
        Self {
            model_id: MODEL_ID.to_owned(),
            text: text.to_owned(),
            confidence_threshold: CONFIDENCE_THRESHOLD,
        }
    }
}

/// One request, built fresh for each iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<PredictionPayload>,
    pub timeout: Duration,
}

impl RequestSpec {
    /// A bodyless GET carrying the standard headers and timeout.
    #[must_use]
    pub fn get(url: String) -> Self {
        Self {
            method: HttpMethod::Get,
            url,
            headers: default_headers(),
            body: None,
            timeout: REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub fn post(url: String, body: PredictionPayload) -> Self {
        Self {
            method: HttpMethod::Post,
            url,
            headers: default_headers(),
            body: Some(body),
            timeout: REQUEST_TIMEOUT,
        }
    }
}

fn default_headers() -> Vec<(String, String)> {
    vec![
        ("Content-Type".to_owned(), "application/json".to_owned()),
        ("User-Agent".to_owned(), DEFAULT_USER_AGENT.to_owned()),
    ]
}

/// Builds the request for `endpoint`: POST with a prediction payload for the
/// prediction endpoint, GET for everything else.
pub fn build_request<C>(base_url: &str, endpoint: &str, choices: &mut C) -> RequestSpec
where
    C: ChoiceSource + ?Sized,
{
    let url = format!("{}{}", base_url.trim_end_matches('/'), endpoint);
    match EndpointKind::of(endpoint) {
        EndpointKind::Prediction => RequestSpec::post(url, PredictionPayload::sample(choices)),
        EndpointKind::Health | EndpointKind::Other => RequestSpec::get(url),
    }
}
