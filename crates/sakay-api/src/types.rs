//! Wire types for the booking server endpoints.
//!
//! Every response is wrapped in a `{ "status": "ok" | "error", ... }`
//! envelope; the client checks the envelope before typed deserialization so
//! error payloads with unexpected shapes still produce a useful message.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sakay_core::booking::{BookingRecord, BookingStatus, DriverSummary, RideKind, Stop};
use sakay_core::fare;
use sakay_core::BookingRequest;

/// Body sent to `POST /bookings`.
///
/// Fare, distance, and duration leave the client as numbers: the upstream
/// display strings are scrubbed through [`fare::parse_amount`] so a
/// currency glyph or thousands separator can never reach the server.
#[derive(Debug, Serialize)]
pub struct CreateBookingPayload<'a> {
    pub request_id: Uuid,
    pub ride_kind: RideKind,
    pub passenger_count: u8,
    pub pickup: &'a Stop,
    pub destination: &'a Stop,
    pub total_fare: f64,
    pub distance_km: f64,
    pub duration_min: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passenger_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passenger_phone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact_phone: Option<&'a str>,
}

impl<'a> CreateBookingPayload<'a> {
    #[must_use]
    pub fn from_request(request: &'a BookingRequest) -> Self {
        Self {
            request_id: request.request_id,
            ride_kind: request.ride_kind,
            passenger_count: request.passenger_count,
            pickup: &request.pickup,
            destination: &request.destination,
            total_fare: fare::parse_amount(&request.fare),
            distance_km: fare::parse_amount(&request.distance_km),
            duration_min: fare::parse_amount(&request.duration_min),
            passenger_name: request.passenger_name.as_deref(),
            passenger_phone: request.passenger_phone.as_deref(),
            emergency_contact_name: request.emergency_contact.as_ref().map(|c| c.name.as_str()),
            emergency_contact_phone: request.emergency_contact.as_ref().map(|c| c.phone.as_str()),
        }
    }
}

/// One polled status observation for a booking.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusSnapshot {
    pub status: BookingStatus,
    #[serde(default)]
    pub driver: Option<DriverSummary>,
}

/// The server's page-load view of the caller's currently active booking.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActiveBooking {
    pub id: i64,
    pub status: BookingStatus,
    #[serde(default)]
    pub driver: Option<DriverSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateBookingResponse {
    #[serde(default)]
    pub booking: Option<BookingRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusResponse {
    pub booking: StatusSnapshot,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActiveBookingResponse {
    #[serde(default)]
    pub booking: Option<ActiveBooking>,
}
