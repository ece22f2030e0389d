use std::fmt::Write as _;

use crate::error::{AppError, AppResult, ExportError};

pub(super) fn write_line(output: &mut String, line: &str) -> AppResult<()> {
    writeln!(output, "{}", line)
        .map_err(|err| AppError::export(ExportError::WriteLine { source: err }))
}

/// Shortest round-trip form that always keeps a fractional part
/// (`1890.0`, `0.05`).
pub(super) fn format_gauge(value: f64) -> String {
    format!("{:?}", value)
}
