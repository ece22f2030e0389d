//! Run-wide metric aggregation shared by every virtual user.
mod histogram;
mod sink;
mod types;


pub use histogram::LatencyHistogram;
pub use sink::{IterationSample, MetricSink};
pub use types::{CheckTally, RunStats};
