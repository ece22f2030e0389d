use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

use crate::error::{AppError, AppResult, ExportError, ValidationError};
use crate::metrics::RunStats;

use super::format::{format_gauge, write_line};

const EXPOSITION_CONTENT_TYPE: &str = "text/plain";

/// Renders the three run gauges, each labelled with `test_type`.
///
/// # Errors
///
/// Returns an error if a line cannot be written to the output buffer.
pub fn render_exposition(stats: &RunStats, test_type: &str) -> AppResult<String> {
    let gauges = [
        ("load_test_error_rate", stats.error_rate),
        ("load_test_avg_response_time_ms", stats.avg_response_time_ms),
        ("load_test_p95_response_time_ms", stats.p95_response_time_ms),
    ];

    let mut output = String::new();
    for (name, value) in gauges {
        write_line(&mut output, &format!("# TYPE {} gauge", name))?;
        write_line(
            &mut output,
            &format!(
                "{}{{test_type=\"{}\"}} {}",
                name,
                test_type,
                format_gauge(value)
            ),
        )?;
    }
    Ok(output)
}

/// `<gateway>/metrics/job/<job_name>`, with the job name percent-encoded as
/// a single path segment.
///
/// # Errors
///
/// Returns an error when `gateway_url` is not a valid hierarchical URL.
pub fn gateway_push_url(gateway_url: &str, job_name: &str) -> AppResult<Url> {
    let mut url = Url::parse(gateway_url).map_err(|err| {
        AppError::validation(ValidationError::InvalidUrl {
            url: gateway_url.to_owned(),
            source: err,
        })
    })?;
    let Ok(mut segments) = url.path_segments_mut() else {
        return Err(AppError::export(ExportError::GatewayUrlNotHierarchical {
            url: gateway_url.to_owned(),
        }));
    };
    segments.pop_if_empty().extend(["metrics", "job", job_name]);
    drop(segments);
    Ok(url)
}

/// POSTs an exposition body to the push gateway.
///
/// # Errors
///
/// Returns an error when the gateway URL is invalid, the request fails, or
/// the gateway answers with a non-2xx status.
pub async fn push_exposition(
    client: &Client,
    gateway_url: &str,
    job_name: &str,
    body: String,
) -> AppResult<()> {
    let url = gateway_push_url(gateway_url, job_name)?;
    let response = client
        .post(url.clone())
        .header(CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)
        .body(body)
        .send()
        .await
        .map_err(|err| {
            AppError::export(ExportError::PushFailed {
                url: url.to_string(),
                source: err,
            })
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::export(ExportError::PushRejected {
            url: url.to_string(),
            status: status.as_u16(),
        }));
    }
    debug!("Pushed metrics to {} ({})", url, status);
    Ok(())
}
