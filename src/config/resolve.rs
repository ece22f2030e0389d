use std::time::Duration;

use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{LoadArgs, parse_duration_arg, parse_http_url};
use crate::error::{AppError, AppResult, ConfigError, ValidationError};
use crate::workload::Pacing;

use super::profile::{Stage, Thresholds, WorkloadProfile};
use super::types::{ConfigFile, StageConfig, ThresholdsConfig};

/// Time VUs get to finish their in-flight iteration once the last stage ends.
pub(crate) const DEFAULT_GRACEFUL_STOP: Duration = Duration::from_secs(30);

/// Where and under which job name teardown pushes its metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    pub gateway_url: String,
    pub job_name: String,
}

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub base_url: String,
    pub profile: WorkloadProfile,
    pub pacing: Pacing,
    pub graceful_stop: Duration,
    pub export: Option<ExportTarget>,
}

/// Merges CLI/env values, an optional config file and the built-in profile.
///
/// Explicit CLI flags and environment variables win over the file, the file
/// wins over defaults.
///
/// # Errors
///
/// Returns an error when a URL, duration, stage list or threshold is invalid.
pub fn resolve_run_config(
    args: &LoadArgs,
    matches: &ArgMatches,
    file: Option<ConfigFile>,
) -> AppResult<RunConfig> {
    let file = file.unwrap_or_default();

    let base_url = pick(matches, "base_url", args.base_url.as_str(), file.base_url.as_deref());
    let base_url = parse_http_url(base_url).map_err(AppError::validation)?;

    let profile_kind = if is_explicit(matches, "profile") {
        args.profile
    } else {
        file.profile.unwrap_or(args.profile)
    };
    let mut profile = WorkloadProfile::builtin(profile_kind);
    if let Some(stages) = file.stages.as_ref() {
        profile.stages = parse_stages(stages)?;
    }
    if let Some(thresholds) = file.thresholds.as_ref() {
        profile.thresholds = merge_thresholds(profile.thresholds, thresholds)?;
    }

    let pacing = resolve_pacing(file.pacing_min.as_deref(), file.pacing_max.as_deref())?;
    let graceful_stop = match file.graceful_stop.as_deref() {
        Some(value) => parse_field_duration(value, "graceful_stop")?,
        None => DEFAULT_GRACEFUL_STOP,
    };

    let gateway_url = if is_explicit(matches, "pushgateway_url") {
        args.pushgateway_url.clone()
    } else {
        args.pushgateway_url
            .clone()
            .or_else(|| file.pushgateway_url.clone())
    };
    let export = match gateway_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => {
            let gateway_url = parse_http_url(url).map_err(AppError::validation)?;
            let job_name = pick(matches, "job_name", args.job_name.as_str(), file.job_name.as_deref())
                .trim()
                .to_owned();
            if job_name.is_empty() {
                return Err(AppError::validation(ValidationError::JobNameEmpty));
            }
            Some(ExportTarget {
                gateway_url,
                job_name,
            })
        }
        Some(_) | None => None,
    };

    Ok(RunConfig {
        base_url,
        profile,
        pacing,
        graceful_stop,
        export,
    })
}

fn is_explicit(matches: &ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}

fn pick<'value>(
    matches: &ArgMatches,
    name: &str,
    cli_value: &'value str,
    file_value: Option<&'value str>,
) -> &'value str {
    if is_explicit(matches, name) {
        return cli_value;
    }
    file_value.unwrap_or(cli_value)
}

fn parse_field_duration(value: &str, field: &str) -> AppResult<Duration> {
    parse_duration_arg(value).map_err(|err| {
        AppError::config(ConfigError::InvalidDuration {
            field: field.to_owned(),
            source: err,
        })
    })
}

fn parse_stages(stages: &[StageConfig]) -> AppResult<Vec<Stage>> {
    if stages.is_empty() {
        return Err(AppError::config(ConfigError::StagesEmpty));
    }
    let mut parsed = Vec::with_capacity(stages.len());
    for (idx, stage) in stages.iter().enumerate() {
        let field = format!("stages[{}].duration", idx);
        let duration = parse_field_duration(&stage.duration, &field)?;
        parsed.push(Stage::new(duration, stage.target));
    }
    Ok(parsed)
}

fn merge_thresholds(base: Thresholds, overrides: &ThresholdsConfig) -> AppResult<Thresholds> {
    let p95_ms = overrides.p95_ms.unwrap_or(base.p95_ms);
    if p95_ms == 0 {
        return Err(AppError::config(ConfigError::P95MustBePositive));
    }
    let error_rate = overrides.error_rate.unwrap_or(base.error_rate);
    if !(0.0..=1.0).contains(&error_rate) {
        return Err(AppError::config(ConfigError::ErrorRateOutOfRange {
            value: error_rate,
        }));
    }
    Ok(Thresholds { p95_ms, error_rate })
}

fn resolve_pacing(min: Option<&str>, max: Option<&str>) -> AppResult<Pacing> {
    let defaults = Pacing::default();
    let min = match min {
        Some(value) => parse_field_duration(value, "pacing_min")?,
        None => defaults.min(),
    };
    let max = match max {
        Some(value) => parse_field_duration(value, "pacing_max")?,
        None => defaults.max(),
    };
    Pacing::new(min, max).ok_or_else(|| {
        AppError::config(ConfigError::PacingRangeInverted {
            min_ms: min.as_millis(),
            max_ms: max.as_millis(),
        })
    })
}
