//! This module provides observability and diagnostics for the query pipeline.
//!
//! Per-row failures are logged at `trace` and fragment lifecycle events at
//! `debug`. The `log_metric!` macro emits structured key-value lines under the
//! `variant_query::metrics` target so they can be filtered independently.

use std::fs::OpenOptions;
use std::sync::Once;

use log::LevelFilter;

use crate::error::VariantError;

/// Log target for structured metric lines.
pub const METRICS_TARGET: &str = "variant_query::metrics";

/// Logs a structured key-value metric line at debug level.
///
/// # Example
/// ```
/// use variant_query::log_metric;
/// let hits = 12;
/// log_metric!("event" = "fragment_closed", "cache_hits" = hits);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        if $crate::__log::log_enabled!(target: $crate::observability::METRICS_TARGET, $crate::__log::Level::Debug) {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            $crate::__log::debug!(
                target: $crate::observability::METRICS_TARGET,
                "VARIANT_QUERY_METRIC: {{ {} }}",
                parts.join(", ")
            );
        }
    };
}

static INIT_LOGGER: Once = Once::new();

/// Installs a process-wide logger printing `[LEVEL] message` lines at `Trace`,
/// optionally appending to `log_file` instead of stderr.
///
/// Only the first call has any effect. A logger installed elsewhere first is
/// left in place.
pub fn enable_verbose_logging(log_file: Option<&str>) -> Result<(), VariantError> {
    let mut result = Ok(());
    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(LevelFilter::Trace);

        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(filename) = log_file {
            match OpenOptions::new().append(true).create(true).open(filename) {
                Ok(file) => {
                    builder.target(env_logger::Target::Pipe(Box::new(file)));
                }
                Err(e) => {
                    result = Err(VariantError::Logging(format!(
                        "Could not open log file '{}' in append mode: {}",
                        filename, e
                    )));
                    return;
                }
            }
        }

        let _ = builder.try_init();
    });
    result
}
