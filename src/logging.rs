use std::path::{Path, PathBuf};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ConvertError, Result};

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_dir: PathBuf,
    /// Directive for the crate's own events, e.g. `info` or `debug`.
    pub level: String,
    /// Also write to stderr. Off while the terminal UI owns the screen.
    pub stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            log_dir: std::env::temp_dir(),
            level: String::from("info"),
            stderr: false,
        }
    }
}

impl LogConfig {
    pub fn with_log_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.log_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_level(mut self, level: &str) -> Self {
        self.level = String::from(level);
        self
    }

    pub fn with_stderr(mut self, stderr: bool) -> Self {
        self.stderr = stderr;
        self
    }

    fn filter(&self) -> Result<EnvFilter> {
        let directive = format!("{}={}", env!("CARGO_CRATE_NAME"), self.level);
        EnvFilter::try_new(&directive)
            .map_err(|err| ConvertError::InvalidInput(format!("bad log level {:?}: {err}", self.level)))
    }
}

/// Installs the global subscriber: a daily log file in `log_dir`, plus
/// stderr when asked for. Returns the log file's base path.
pub fn init_logging(program_name: &str, config: LogConfig) -> Result<PathBuf> {
    std::fs::create_dir_all(&config.log_dir)?;
    let log_file_name = format!("{}.log", program_name);
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.log_dir, &log_file_name);

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true)
        .with_line_number(true);

    let stderr_layer = config.stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(config.filter()?)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|err| ConvertError::InvalidInput(format!("logging already initialized: {err}")))?;

    tracing::info!(
        program = program_name,
        log_dir = ?config.log_dir,
        level = %config.level,
        "logging initialized"
    );
    Ok(config.log_dir.join(log_file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter() {
        assert!(LogConfig::default().with_level("debug").filter().is_ok());
        assert!(LogConfig::default().with_level("not a level!").filter().is_err());
    }

    #[test]
    fn test_builder() {
        let config = LogConfig::default().with_log_dir("/var/log/x").with_stderr(true);
        assert_eq!(config.log_dir, PathBuf::from("/var/log/x"));
        assert!(config.stderr);
        assert_eq!(config.level, "info");
    }
}
