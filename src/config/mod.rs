//! Configuration loading and resolution into a [`RunConfig`].
mod loader;
mod profile;
mod resolve;
pub mod types;


pub use loader::load_config;
pub use profile::{Stage, Thresholds, WorkloadProfile};
pub use resolve::{ExportTarget, RunConfig, resolve_run_config};
