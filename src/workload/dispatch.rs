use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::Value;
use tokio::time::Instant;

use crate::error::{AppError, AppResult, HttpError};

use super::request::{HttpMethod, RequestSpec};

/// Why a request produced no HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Transport,
}

/// Result of one dispatch. Failed dispatches carry status 0, an empty body and
/// the time spent until the failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseOutcome {
    pub status: u16,
    pub latency: Duration,
    pub body: String,
    /// Parsed body, absent when the body is not valid JSON.
    pub json: Option<Value>,
    pub failure: Option<FailureKind>,
}

impl ResponseOutcome {
    #[must_use]
    pub fn received(status: u16, latency: Duration, body: String) -> Self {
        let json = serde_json::from_str::<Value>(&body).ok();
        Self {
            status,
            latency,
            body,
            json,
            failure: None,
        }
    }

    #[must_use]
    pub const fn failed(kind: FailureKind, latency: Duration) -> Self {
        Self {
            status: 0,
            latency,
            body: String::new(),
            json: None,
            failure: Some(kind),
        }
    }

    /// Error sample value: transport failure or an HTTP status >= 400.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.failure.is_some() || self.status >= 400
    }
}

/// Sends a [`RequestSpec`]. Never fails: every failure mode is folded into
/// the returned [`ResponseOutcome`].
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, request: &RequestSpec) -> ResponseOutcome;
}

/// [`Dispatcher`] issuing real requests through `reqwest`, one attempt each.
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    client: Client,
}

impl HttpDispatcher {
    /// Builds the shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error when the TLS backend or client cannot be initialised.
    pub fn new() -> AppResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|err| AppError::http(HttpError::BuildClientFailed { source: err }))?;
        Ok(Self { client })
    }

    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    async fn dispatch(&self, request: &RequestSpec) -> ResponseOutcome {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = request.body.as_ref() {
            builder = builder.json(body);
        }
        builder = builder.timeout(request.timeout);

        let start = Instant::now();
        match builder.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                match read_body(response).await {
                    Ok(body) => ResponseOutcome::received(status, start.elapsed(), body),
                    Err(err) => ResponseOutcome::failed(classify(&err), start.elapsed()),
                }
            }
            Err(err) => ResponseOutcome::failed(classify(&err), start.elapsed()),
        }
    }
}

fn classify(err: &reqwest::Error) -> FailureKind {
    if err.is_timeout() {
        FailureKind::Timeout
    } else {
        FailureKind::Transport
    }
}

async fn read_body(response: reqwest::Response) -> Result<String, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();
    while let Some(chunk) = stream.next().await {
        buffer.extend_from_slice(&chunk?);
    }
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
