//! Logging setup.
//!
//! Reports go to stdout, so log events (data-integrity warnings included)
//! are written to stderr. A daily rolling file can be added on top when a
//! log directory is configured.

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system.
///
/// Log level can be controlled via the `DIGIKUERY_LOG` environment variable:
/// - `DIGIKUERY_LOG=debug` for verbose output
/// - `DIGIKUERY_LOG=warn` for warnings and errors only (default)
/// - `DIGIKUERY_LOG=error` for errors only
///
/// `verbose` lowers the default level to `debug` when the variable is unset.
pub fn init(log_dir: Option<&Path>, verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_env("DIGIKUERY_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let file_layer = match log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)?;
            let file_appender = tracing_appender::rolling::daily(log_dir, "digikuery.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // Dropping the guard would stop the writer thread; init() runs once.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    tracing::debug!("Logging initialized, file output: {:?}", log_dir);
    Ok(())
}
