use std::time::Duration;

pub(crate) const DEFAULT_BASE_URL: &str = "https://ml-pipeline.yourcompany.com";
pub(crate) const DEFAULT_JOB_NAME: &str = "ml-pipeline-load-test";
pub(crate) const DEFAULT_USER_AGENT: &str = "inferload-loadtest/1.0";
/// Model requested by every prediction call.
pub(crate) const MODEL_ID: &str = "distilbert-classification";
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
