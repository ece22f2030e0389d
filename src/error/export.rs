use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write line: {source}")]
    WriteLine {
        #[source]
        source: std::fmt::Error,
    },
    #[error("Metrics gateway URL '{url}' cannot carry a job path.")]
    GatewayUrlNotHierarchical { url: String },
    #[error("Failed to push metrics to '{url}': {source}")]
    PushFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Metrics gateway '{url}' rejected push with status {status}.")]
    PushRejected { url: String, status: u16 },
}
