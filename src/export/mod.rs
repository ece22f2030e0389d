//! Prometheus exposition of run statistics and push-gateway delivery.
mod format;
mod prometheus;


pub use prometheus::{gateway_push_url, push_exposition, render_exposition};
