//! Runtime configuration, loaded from the environment (via `.env` and
//! process env vars) and parsed through `clap` so every field is
//! documented and has a predictable default.

use std::time::Duration;

use clap::Parser;

use crate::query::executor::ExecutorConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "stats-query", about = "Multi-tenant stats query plane")]
pub struct Config {
    /// Address to bind the HTTP listener to.
    #[arg(long, env = "APP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the HTTP listener to.
    #[arg(long, env = "API_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Port the Prometheus exporter serves `/metrics` on.
    #[arg(long, env = "API_METRICS_PORT", default_value_t = 9091)]
    pub metrics_port: u16,

    /// Base URL of the external metrics backend's chart API.
    #[arg(long, env = "STATS_BACKEND_URL")]
    pub backend_url: String,

    /// Auth token sent as `X-Auth-Token` on every backend request.
    #[arg(long, env = "STATS_BACKEND_AUTH_TOKEN")]
    pub backend_auth_token: Option<String>,

    /// Comma-separated list of allowed CORS origins; `*` allows any origin.
    #[arg(long, env = "CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Comma-separated developer modes: `noauth` (skip org-key
    /// authorization, scoping every request to a fixed org), `mock`
    /// (reserved for the out-of-scope ingestion path), `verbose` (raise the
    /// default log level).
    #[arg(long, env = "DEV_MODES", default_value = "")]
    pub dev_modes: String,

    /// Maximum number of backend HTTP attempts in flight at once.
    #[arg(long, env = "EXECUTOR_PARALLELISM", default_value_t = 16)]
    pub executor_parallelism: usize,

    /// Maximum number of tasks (queued + in flight) admitted at once.
    #[arg(long, env = "EXECUTOR_MAX_QUEUE_DEPTH", default_value_t = 256)]
    pub executor_max_queue_depth: usize,

    /// Attempts per backend request before giving up.
    #[arg(long, env = "EXECUTOR_MAX_ATTEMPTS", default_value_t = 8)]
    pub executor_max_attempts: u32,

    /// Timeout, in milliseconds, for a single backend HTTP attempt.
    #[arg(long, env = "EXECUTOR_ATTEMPT_TIMEOUT_MS", default_value_t = 5_000)]
    pub executor_attempt_timeout_ms: u64,

    /// Deadline, in milliseconds, for a whole per-series task across retries.
    #[arg(long, env = "EXECUTOR_TASK_TIMEOUT_MS", default_value_t = 30_000)]
    pub executor_task_timeout_ms: u64,
}

impl Config {
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            parallelism: self.executor_parallelism,
            max_queue_depth: self.executor_max_queue_depth,
            max_attempts: self.executor_max_attempts,
            attempt_timeout: Duration::from_millis(self.executor_attempt_timeout_ms),
            task_timeout: Duration::from_millis(self.executor_task_timeout_ms),
        }
    }

    /// True if the comma-separated `dev_modes` list contains `mode`.
    pub fn dev_mode(&self, mode: &str) -> bool {
        self.dev_modes.split(',').any(|m| m.trim() == mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_only_the_required_backend_url() {
        let cfg = Config::parse_from(["stats-query", "--backend-url", "http://backend"]);
        assert_eq!(cfg.backend_url, "http://backend");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.executor_parallelism, 16);
    }

    #[test]
    fn executor_config_converts_millis_to_durations() {
        let cfg = Config::parse_from([
            "stats-query",
            "--backend-url",
            "http://backend",
            "--executor-attempt-timeout-ms",
            "1500",
        ]);
        assert_eq!(cfg.executor_config().attempt_timeout, Duration::from_millis(1500));
    }
}
