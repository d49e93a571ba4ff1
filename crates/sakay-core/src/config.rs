use std::path::PathBuf;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files; useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup; no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_owned()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_owned())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_owned(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_owned(),
            reason: e.to_string(),
        })
    };

    let api_base_url = require("SAKAY_API_BASE_URL")?;

    let env = parse_environment(&or_default("SAKAY_ENV", "development"));
    let log_level = or_default("SAKAY_LOG_LEVEL", "info");
    let routing_base_url = or_default(
        "SAKAY_ROUTING_BASE_URL",
        "https://router.project-osrm.org",
    );
    let session_path = PathBuf::from(or_default("SAKAY_SESSION_PATH", "./.sakay-session.json"));
    let user_agent = or_default("SAKAY_USER_AGENT", "sakay/0.1 (booking-client)");

    let request_timeout_secs = parse_u64("SAKAY_REQUEST_TIMEOUT_SECS", "30")?;
    let poll_interval_secs = parse_u64("SAKAY_POLL_INTERVAL_SECS", "2")?;
    let poll_max_attempts = parse_u32("SAKAY_POLL_MAX_ATTEMPTS", "300")?;
    let degraded_refetch_delay_ms = parse_u64("SAKAY_DEGRADED_REFETCH_DELAY_MS", "1500")?;
    let sim_tick_secs = parse_u64("SAKAY_SIM_TICK_SECS", "2")?;

    Ok(AppConfig {
        env,
        log_level,
        api_base_url,
        routing_base_url,
        session_path,
        user_agent,
        request_timeout_secs,
        poll_interval_secs,
        poll_max_attempts,
        degraded_refetch_delay_ms,
        sim_tick_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
