//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
mod parsers;
mod types;


pub use cli::LoadArgs;
pub use types::ProfileKind;

pub(crate) use defaults::{DEFAULT_USER_AGENT, MODEL_ID, REQUEST_TIMEOUT};
pub(crate) use parsers::{parse_duration_arg, parse_http_url};
