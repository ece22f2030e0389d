//! Virtual-user workload: endpoint selection, request building, dispatch,
//! response checks and pacing for a single iteration.
mod catalog;
mod checks;
mod choices;
mod dispatch;
mod driver;
mod request;


pub use catalog::{
    EndpointCatalog, EndpointKind, HEALTH_PATH, METRICS_PATH, MODELS_PATH, PREDICT_PATH,
    STATUS_PATH,
};
pub use checks::{
    CHECK_CONFIDENCE_VALID, CHECK_HAS_CONTENT, CHECK_HEALTHY, CHECK_IS_JSON,
    CHECK_PREDICTION_RESULT, CHECK_RESPONSE_TIME, CHECK_STATUS_OK, CheckResult, PredictionResult,
    evaluate_checks,
};
pub use choices::{ChoiceSource, RngChoices};
pub use dispatch::{Dispatcher, FailureKind, HttpDispatcher, ResponseOutcome};
pub use driver::{IterationReport, Pacing, WorkloadDriver};
pub use request::{
    CONFIDENCE_THRESHOLD, HttpMethod, PREDICTION_TEXTS, PredictionPayload, RequestSpec,
    build_request,
};
