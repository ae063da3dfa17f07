//! Tracing subscriber setup.

use crate::options::LoggingOptions;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};
use trustscore_shared::{TrustscoreError, TrustscoreResult};

const LOG_FILE_PREFIX: &str = "trustscore.log";

/// Install the global subscriber: stderr always, plus a daily-rolling file
/// under `log_dir` when configured. `RUST_LOG` wins over the configured
/// filter.
///
/// Keep the returned guard alive for as long as file logging should flush.
/// Returns `Ok(None)` without touching anything if a subscriber is already
/// installed.
pub fn init_logging(options: &LoggingOptions) -> TrustscoreResult<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => parse_filter(&options.filter)?,
    };

    let (file_layer, guard) = match &options.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init();

    match installed {
        Ok(()) => Ok(guard),
        Err(_) => Ok(None),
    }
}

fn parse_filter(directive: &str) -> TrustscoreResult<EnvFilter> {
    EnvFilter::try_new(directive).map_err(|e| {
        TrustscoreError::Config(format!("invalid log filter {:?}: {}", directive, e))
    })
}
