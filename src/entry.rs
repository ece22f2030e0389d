use std::sync::Arc;

use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tracing::info;

use crate::args::LoadArgs;
use crate::config::{load_config, resolve_run_config};
use crate::error::{AppError, AppResult};
use crate::lifecycle::{ProbeOutcome, health_url, probe_or_shutdown, teardown};
use crate::metrics::MetricSink;
use crate::runner::{RunSummary, run_stages};
use crate::shutdown::{setup_signal_shutdown_handler, shutdown_channel};
use crate::workload::{EndpointCatalog, HttpDispatcher, WorkloadDriver};

/// Parses the command line, runs the configured profile and exits non-zero
/// when a threshold is breached.
///
/// # Errors
///
/// Returns an error for invalid arguments or configuration, runtime setup
/// failures, and breached thresholds.
pub fn run() -> AppResult<()> {
    let (args, matches) = parse_args()?;

    crate::logger::init_logging(args.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(args, &matches))
}

fn parse_args() -> AppResult<(LoadArgs, ArgMatches)> {
    let matches = LoadArgs::command().get_matches();
    let args = LoadArgs::from_arg_matches(&matches)?;
    Ok((args, matches))
}

async fn run_async(args: LoadArgs, matches: &ArgMatches) -> AppResult<()> {
    let file = load_config(args.config.as_deref())?;
    let config = resolve_run_config(&args, matches, file)?;
    info!(
        "Starting {} against {}: {} stages over {:?}, peak {} VUs",
        config.profile.kind.test_type(),
        config.base_url,
        config.profile.stages.len(),
        config.profile.total_duration(),
        config.profile.peak_target()
    );

    let dispatcher = HttpDispatcher::new()?;
    let client = dispatcher.client().clone();
    let sink = Arc::new(MetricSink::new()?);
    let driver = Arc::new(WorkloadDriver::new(
        config.base_url.clone(),
        EndpointCatalog::standard(),
        dispatcher,
        Arc::clone(&sink),
        config.pacing,
    ));

    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    let (setup, summary) =
        match probe_or_shutdown(driver.dispatcher(), &config.base_url, &mut shutdown_rx).await {
            Some(setup) => {
                let summary = run_stages(
                    Arc::clone(&driver),
                    &config.profile.stages,
                    config.graceful_stop,
                    &shutdown_tx,
                    shutdown_rx,
                )
                .await;
                (setup, summary)
            }
            None => (
                ProbeOutcome::interrupted(health_url(&config.base_url)),
                RunSummary::not_started(),
            ),
        };

    drop(shutdown_tx.send(()));
    signal_handle.await?;

    let report = teardown(&config, &client, &sink, &summary, setup).await?;
    if !report.passed {
        return Err(AppError::ThresholdsBreached {
            failed: report.failed_thresholds(),
        });
    }
    Ok(())
}
