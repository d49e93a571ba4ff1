pub mod app_config;
pub mod booking;
pub mod config;
pub mod fare;
pub mod geo;

pub use app_config::AppConfig;
pub use booking::{
    BookingRecord, BookingRequest, BookingStatus, Contact, DriverSummary, RideKind, Stop,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::LatLng;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
