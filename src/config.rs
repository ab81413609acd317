use std::env;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    /// Target language given to users on first contact.
    pub default_language: String,
    pub pipeline: PipelineConfig,
    pub translator: TranslatorConfig,
    pub notifier: NotifierConfig,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub scratch_dir: String,
    pub download_workers: usize,
    pub migration_workers: usize,
    pub queue_depth: usize,
    pub download_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scratch_dir: "./data/scratch".to_string(),
            download_workers: 3,
            migration_workers: 3,
            queue_depth: 20,
            download_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    pub api_url: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

#[derive(Clone, Default)]
pub struct NotifierConfig {
    pub webhook_url: Option<String>,
    pub timeout_secs: u64,
}

impl fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Webhook URLs usually embed a bot token.
        f.debug_struct("NotifierConfig")
            .field(
                "webhook_url",
                &self.webhook_url.as_ref().map(|_| "***REDACTED***"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/vocab-quiz.sled"),
            default_language: env_or("DEFAULT_LANGUAGE", "en"),
            pipeline: PipelineConfig {
                scratch_dir: env_or("SCRATCH_DIR", "./data/scratch"),
                download_workers: env_or_parse("DOWNLOAD_WORKERS", 3_usize).max(1),
                migration_workers: env_or_parse("MIGRATION_WORKERS", 3_usize).max(1),
                queue_depth: env_or_parse("INGEST_QUEUE_DEPTH", 20_usize).max(1),
                download_timeout_secs: env_or_parse("DOWNLOAD_TIMEOUT_SECS", 60_u64),
            },
            translator: TranslatorConfig {
                api_url: env_or(
                    "TRANSLATOR_API_URL",
                    "https://translate.googleapis.com/translate_a/single",
                ),
                timeout_secs: env_or_parse("TRANSLATOR_TIMEOUT_SECS", 10_u64),
                max_attempts: env_or_parse("TRANSLATOR_MAX_ATTEMPTS", 5_u32).max(1),
                retry_delay_ms: env_or_parse("TRANSLATOR_RETRY_DELAY_MS", 1000_u64),
            },
            notifier: NotifierConfig {
                webhook_url: env::var("NOTIFIER_WEBHOOK_URL")
                    .ok()
                    .filter(|url| !url.trim().is_empty()),
                timeout_secs: env_or_parse("NOTIFIER_TIMEOUT_SECS", 10_u64),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, OnceLock};

    use super::*;

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn managed_keys() -> &'static [&'static str] {
        &[
            "HOST",
            "PORT",
            "RUST_LOG",
            "DOWNLOAD_WORKERS",
            "INGEST_QUEUE_DEPTH",
            "TRANSLATOR_MAX_ATTEMPTS",
            "NOTIFIER_WEBHOOK_URL",
        ]
    }

    fn clear_keys(keys: &[&str]) {
        for key in keys {
            env::remove_var(key);
        }
    }

    #[test]
    fn loads_defaults_when_missing() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.pipeline.download_workers, 3);
        assert_eq!(cfg.pipeline.migration_workers, 3);
        assert_eq!(cfg.pipeline.queue_depth, 20);
        assert_eq!(cfg.translator.max_attempts, 5);
        assert_eq!(cfg.translator.retry_delay_ms, 1000);
        assert!(cfg.notifier.webhook_url.is_none());
    }

    #[test]
    fn parses_numeric_values() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("PORT", "4000");
        env::set_var("DOWNLOAD_WORKERS", "5");
        env::set_var("TRANSLATOR_MAX_ATTEMPTS", "2");

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 4000);
        assert_eq!(cfg.pipeline.download_workers, 5);
        assert_eq!(cfg.translator.max_attempts, 2);
        clear_keys(managed_keys());
    }

    #[test]
    fn invalid_values_fall_back() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("PORT", "bad");
        env::set_var("INGEST_QUEUE_DEPTH", "0");

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.pipeline.queue_depth, 1);
        clear_keys(managed_keys());
    }

    #[test]
    fn webhook_url_is_redacted_in_debug() {
        let cfg = NotifierConfig {
            webhook_url: Some("https://api.example.org/bot123:secret/send".to_string()),
            timeout_secs: 5,
        };
        let printed = format!("{:?}", cfg);
        assert!(!printed.contains("secret"));
        assert!(printed.contains("REDACTED"));
    }
}
