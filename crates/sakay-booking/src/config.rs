//! Timing knobs for the poller, tracking view, and controller.

use std::time::Duration;

use sakay_core::AppConfig;

/// Driver-approach simulation and surface-readiness parameters.
#[derive(Debug, Clone)]
pub struct TrackingConfig {
    /// Delay between surface readiness checks.
    pub surface_retry: Duration,
    /// Readiness checks before giving up and proceeding anyway.
    pub surface_retry_limit: u32,
    /// Interval between simulation ticks.
    pub sim_tick: Duration,
    /// Fraction of the remaining distance covered per tick.
    pub approach_factor: f64,
    /// Remaining distance below which the driver counts as arrived.
    pub arrival_threshold_m: f64,
    /// Margin applied when fitting bounds around the markers.
    pub bounds_padding_px: u32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            surface_retry: Duration::from_millis(300),
            surface_retry_limit: 100,
            sim_tick: Duration::from_secs(2),
            approach_factor: 0.1,
            arrival_threshold_m: 30.0,
            bounds_padding_px: 80,
        }
    }
}

/// Controller and poller timing.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// Interval between acceptance-poll status checks.
    pub poll_interval: Duration,
    /// Attempts before the poller resolves as still waiting.
    pub poll_max_attempts: u32,
    /// Delay before the single follow-up active-booking fetch after a
    /// degraded submission response.
    pub degraded_refetch_delay: Duration,
    pub tracking: TrackingConfig,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            poll_max_attempts: 300,
            degraded_refetch_delay: Duration::from_millis(1500),
            tracking: TrackingConfig::default(),
        }
    }
}

impl BookingConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            poll_max_attempts: config.poll_max_attempts,
            degraded_refetch_delay: Duration::from_millis(config.degraded_refetch_delay_ms),
            tracking: TrackingConfig {
                sim_tick: Duration::from_secs(config.sim_tick_secs),
                ..TrackingConfig::default()
            },
        }
    }
}
