use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::Config;

/// sqlx logs every statement of an import at info; sled and hyper are chatty at debug.
const QUIET_DEPENDENCIES: &[&str] = &["sqlx=warn", "sled=warn", "hyper=info"];

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub file: Option<FileLogConfig>,
}

/// Daily-rolling JSON log files, one per day, oldest deleted past `max_files`.
#[derive(Debug, Clone)]
pub struct FileLogConfig {
    pub dir: String,
    pub prefix: String,
    pub max_files: usize,
}

impl From<&Config> for LogConfig {
    fn from(config: &Config) -> Self {
        Self {
            log_level: config.log_level.clone(),
            file: config.enable_file_logs.then(|| FileLogConfig {
                dir: config.log_dir.clone(),
                prefix: "vocab-quiz".to_string(),
                max_files: 14,
            }),
        }
    }
}

impl LogConfig {
    /// `RUST_LOG` wins; otherwise the configured level with noisy crates capped.
    pub fn filter_directives(&self) -> String {
        let mut directives = vec![self.log_level.clone()];
        directives.extend(QUIET_DEPENDENCIES.iter().map(|d| d.to_string()));
        directives.join(",")
    }
}

pub fn init_tracing(config: &LogConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directives()));

    let stdout_layer = fmt::layer().with_target(true).with_thread_ids(false);
    let registry = Registry::default().with(env_filter).with(stdout_layer);

    match &config.file {
        Some(file) => {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(&file.prefix)
                .filename_suffix("log")
                .max_log_files(file.max_files)
                .build(&file.dir)
                .expect("Failed to create rolling file appender");
            let file_layer = fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .json();
            accept_existing(registry.with(file_layer).try_init());
        }
        None => accept_existing(registry.try_init()),
    }
}

// A subscriber set earlier (tests) is fine; anything else is a broken setup.
fn accept_existing(result: Result<(), TryInitError>) {
    if let Err(e) = result {
        if !e.to_string().contains("already been set") {
            panic!("Failed to initialize tracing: {e}");
        }
    }
}
