use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-wide configuration, loaded from the environment once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Base URL of the booking server.
    pub api_base_url: String,
    /// Base URL of the OSRM-compatible routing service.
    pub routing_base_url: String,
    /// Where the recovery snapshot is persisted.
    pub session_path: PathBuf,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Seconds between acceptance-poll status checks.
    pub poll_interval_secs: u64,
    /// Poll attempts before the poller gives up and leaves the booking waiting.
    pub poll_max_attempts: u32,
    /// Delay before the single follow-up active-booking fetch when a
    /// submission succeeds without a booking payload.
    pub degraded_refetch_delay_ms: u64,
    /// Seconds between driver-approach simulation ticks.
    pub sim_tick_secs: u64,
}
