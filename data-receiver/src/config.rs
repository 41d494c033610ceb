//! Configuration module for environment variable parsing.
//!
//! Process-level settings only; the per-service plugin configuration lives in
//! the service document (see [`crate::services`]).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Path to a `.json`, `.yaml` or `.yml` service document
    pub config_path: Option<PathBuf>,

    /// Inline JSON service document, used when no path is given
    pub inline_config: Option<String>,

    /// Largest request body accepted, in bytes
    pub max_body_bytes: usize,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Upper bound on waiting for writers to drain at shutdown
    pub writer_close_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            config_path: None,
            inline_config: None,
            max_body_bytes: 2 * 1024 * 1024,
            request_timeout: Duration::from_secs(60),
            writer_close_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            port: parse_var("PORT", defaults.port),

            config_path: non_empty_var("DATA_RECEIVER_CONFIG").map(PathBuf::from),

            inline_config: non_empty_var("DATA_RECEIVER_INLINE_CONFIG"),

            max_body_bytes: parse_var("MAX_BODY_BYTES", defaults.max_body_bytes),

            request_timeout: Duration::from_millis(parse_var(
                "REQUEST_TIMEOUT_MS",
                defaults.request_timeout.as_millis() as u64,
            )),

            writer_close_timeout: Duration::from_millis(parse_var(
                "WRITER_CLOSE_TIMEOUT_MS",
                defaults.writer_close_timeout.as_millis() as u64,
            )),
        }
    }
}

/// Parse a variable, falling back to `default` when unset or invalid.
fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
