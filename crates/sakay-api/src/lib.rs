pub mod client;
pub mod error;
pub mod types;

pub use client::BookingClient;
pub use error::ApiError;
pub use types::{ActiveBooking, StatusSnapshot};
