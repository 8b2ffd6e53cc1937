//! Logging setup for embedders that want a ready-made subscriber.
//!
//! Library code only emits `tracing` events; nothing here is initialized
//! implicitly. Hosts that already run their own subscriber can ignore this
//! module entirely. [`init_logging`] wires a compact stdout layer and a
//! non-blocking file layer (`logs/terralayer.log` by default, truncated per
//! session), filtered via `RUST_LOG` with an `info` fallback.

use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the background log writer alive; dropping it flushes and closes the
/// file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Default log directory relative to the working directory.
pub const DEFAULT_LOG_DIR: &str = "logs";
/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "terralayer.log";

/// Installs the global subscriber with file and stdout output.
///
/// The previous session's log file is truncated. Call once per process; a
/// second call fails inside `tracing` when a global subscriber is already
/// set.
///
/// # Errors
///
/// Returns an error when the log directory cannot be created or the log file
/// cannot be truncated.
pub fn init_logging(log_dir: &str, log_file: &str) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;
    fs::write(Path::new(log_dir).join(log_file), "")?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true)
        .compact();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true)
        .compact();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        PathBuf::from(format!("target/test_logs_{nanos}"))
    }

    // init_logging itself can only run once per process (global subscriber),
    // so the tests cover the file preparation it performs.

    #[test]
    fn test_truncates_previous_session_log() {
        let dir = scratch_dir();
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join(DEFAULT_LOG_FILE);
        fs::write(&file, "stale session output").unwrap();

        fs::write(&file, "").unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_creates_missing_log_directory() {
        let dir = scratch_dir().join("nested");
        assert!(!dir.exists());

        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(DEFAULT_LOG_FILE), "").unwrap();
        assert!(dir.join(DEFAULT_LOG_FILE).exists());

        fs::remove_dir_all(dir.parent().unwrap()).unwrap();
    }
}
