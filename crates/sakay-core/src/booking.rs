//! Booking domain types shared between the API client and the lifecycle
//! controller.
//!
//! [`BookingRequest`] is assembled once by the caller (CLI flags, a form, a
//! saved trip) and never mutated by the core. [`BookingRecord`] is owned by
//! the server; the client holds a read-mostly copy refreshed through status
//! polling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::LatLng;

/// Ride product selected by the passenger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideKind {
    Standard,
    Premium,
    Shared,
}

impl std::fmt::Display for RideKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RideKind::Standard => write!(f, "standard"),
            RideKind::Premium => write!(f, "premium"),
            RideKind::Shared => write!(f, "shared"),
        }
    }
}

/// A pickup or destination point: coordinates plus the human-readable
/// address and optional administrative area (barangay / district).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub position: LatLng,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
}

/// Emergency contact attached to a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub phone: String,
}

/// An immutable, fully-prepared ride request.
///
/// `fare`, `distance_km`, and `duration_min` are display strings as computed
/// upstream (they may carry currency glyphs or thousands separators); the
/// API client converts them to numbers defensively before submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    /// Client-generated correlation id, echoed in server logs.
    pub request_id: Uuid,
    pub ride_kind: RideKind,
    pub passenger_count: u8,
    pub pickup: Stop,
    pub destination: Stop,
    pub fare: String,
    pub distance_km: String,
    pub duration_min: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passenger_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passenger_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<Contact>,
}

/// Server-side booking status vocabulary.
///
/// Unknown strings deserialize to [`BookingStatus::Unknown`] so a newer
/// server cannot wedge an older client; unknown statuses are treated as
/// non-terminal by the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum BookingStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
    Unknown,
}

impl From<String> for BookingStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => BookingStatus::Pending,
            "accepted" => BookingStatus::Accepted,
            "in_progress" => BookingStatus::InProgress,
            "completed" => BookingStatus::Completed,
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Unknown,
        }
    }
}

impl BookingStatus {
    /// Terminal statuses admit no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Assigned driver as reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub plate_number: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Server-assigned booking entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: i64,
    pub booking_code: String,
    pub status: BookingStatus,
    #[serde(default)]
    pub driver: Option<DriverSummary>,
    pub total_fare: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
