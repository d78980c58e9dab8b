//! Logging setup and structured metrics for pipeline runs.
//!
//! Every module logs through the `log` facade. `init_logging` installs the
//! `env_logger` backend once per process; later calls are no-ops, so several
//! pipelines in one process can each ask for logging safely.

use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Once;

use log::LevelFilter;

use crate::config::LoggingConfig;
use crate::error::EbsdError;

static INIT_LOGGER: Once = Once::new();

/// Logs a structured key-value metric line at debug level.
///
/// # Example
/// ```
/// use ebsd_pipeline::log_metric;
/// let features = 12;
/// log_metric!("event"="segment", "features"=&features);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        if log::log_enabled!(log::Level::Debug) {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            log::debug!("EBSD_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}

/// Installs the global logger according to `config`. Only the first call has
/// any effect; it fails only if the log file cannot be opened.
pub fn init_logging(config: &LoggingConfig) -> Result<(), EbsdError> {
    if !config.enabled || INIT_LOGGER.is_completed() {
        return Ok(());
    }
    let file = match &config.log_file {
        Some(path) => Some(OpenOptions::new().append(true).create(true).open(path)?),
        None => None,
    };

    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.is_test(false);
        builder.filter_level(parse_level(&config.level));

        // Level and message only.
        builder.format(|buf, record| {
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    Ok(())
}

/// Parses a level name such as `"debug"`; unknown names fall back to `Info`.
pub fn parse_level(name: &str) -> LevelFilter {
    name.parse().unwrap_or(LevelFilter::Info)
}
