use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "logs/report-dedupe.log";

/// Console output goes to stderr so group listings on stdout stay pipeable.
///
/// `TRACING_LEVEL` takes an `EnvFilter` directive (default `info`).
/// `LOG_FILE_PATH` names the log file; set it to an empty string to disable
/// file logging. The returned guard flushes the file writer on drop.
pub fn init_logger() -> Option<WorkerGuard> {
    let directive = env::var("TRACING_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .compact()
        .with_target(false)
        .without_time();

    let log_file = env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let (file_layer, guard) = match split_log_path(&log_file) {
        Some((dir, name)) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, name));
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();

    debug!("Logging initialized (filter '{}', file '{}')", directive, log_file);
    guard
}

/// `None` disables file logging.
fn split_log_path(path: &str) -> Option<(PathBuf, String)> {
    let path = Path::new(path);
    let name = path.file_name()?.to_str()?.to_string();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Some((dir, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_log_path() {
        assert_eq!(
            split_log_path("logs/report-dedupe.log"),
            Some((PathBuf::from("logs"), "report-dedupe.log".to_string()))
        );
        assert_eq!(
            split_log_path("run.log"),
            Some((PathBuf::from("."), "run.log".to_string()))
        );
        assert_eq!(split_log_path(""), None);
    }
}
