//! Core library for the `inferload` CLI.
//!
//! Ramps simulated users against an ML inference HTTP API, checks response
//! shapes, aggregates error rate and latency, evaluates p95/error-rate
//! thresholds and optionally pushes the results to a Prometheus Pushgateway.
//! The `inferload` binary is the primary interface; library APIs may evolve
//! with it.
pub mod args;
pub mod config;
mod entry;
pub mod error;
pub mod export;
pub mod lifecycle;
mod logger;
pub mod metrics;
pub mod runner;
pub mod shutdown;
pub mod workload;

pub use entry::run;
