//! HTTP client for the booking server REST API.
//!
//! Wraps `reqwest` with envelope checking, typed response deserialization,
//! and base-URL injection for tests. All endpoints check the `"status"`
//! field in the JSON envelope and surface server-level rejections as
//! [`ApiError::Rejected`].

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::ApiError;
use crate::types::{
    ActiveBooking, ActiveBookingResponse, CreateBookingPayload, CreateBookingResponse,
    StatusResponse, StatusSnapshot,
};
use sakay_core::booking::BookingRecord;
use sakay_core::BookingRequest;

/// Client for the booking server.
///
/// Cheap to clone; the underlying `reqwest::Client` is a shared handle, so
/// spawned tasks (the acceptance poller, the degraded-response refetch) take
/// clones rather than borrows.
#[derive(Debug, Clone)]
pub struct BookingClient {
    client: Client,
    base_url: Url,
}

impl BookingClient {
    /// Creates a client with the given base URL, timeout, and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`ApiError::InvalidBaseUrl`] if `base_url` does not
    /// parse.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Normalise: ensure the base URL ends with exactly one slash so that
        // Url::join treats it as a directory rather than replacing the last
        // path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ApiError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    /// Submits a prepared ride request.
    ///
    /// Returns `Ok(Some(record))` on a normal success, and `Ok(None)` when
    /// the server accepts the submission but the success envelope carries no
    /// booking object; the degraded case the lifecycle controller recovers
    /// from with a follow-up [`Self::active_booking`] fetch.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Rejected`] if the server refuses the booking.
    /// - [`ApiError::Http`] on network failure.
    /// - [`ApiError::UnexpectedStatus`] on a non-2xx status without an
    ///   error envelope.
    /// - [`ApiError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn create_booking(
        &self,
        request: &BookingRequest,
    ) -> Result<Option<BookingRecord>, ApiError> {
        let url = self.endpoint("bookings");
        let payload = CreateBookingPayload::from_request(request);
        let body = self.post_json(&url, &payload).await?;
        Self::check_envelope(&body)?;

        let parsed: CreateBookingResponse =
            serde_json::from_value(body).map_err(|e| ApiError::Deserialize {
                context: format!("createBooking(request_id={})", request.request_id),
                source: e,
            })?;

        if parsed.booking.is_none() {
            tracing::warn!(
                request_id = %request.request_id,
                "booking server accepted the submission but returned no booking payload"
            );
        }
        Ok(parsed.booking)
    }

    /// Fetches the current status (and driver, once assigned) of a booking.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`Self::create_booking`].
    pub async fn booking_status(&self, booking_id: i64) -> Result<StatusSnapshot, ApiError> {
        let url = self.endpoint(&format!("bookings/{booking_id}/status"));
        let body = self.get_json(&url).await?;
        Self::check_envelope(&body)?;

        let parsed: StatusResponse =
            serde_json::from_value(body).map_err(|e| ApiError::Deserialize {
                context: format!("bookingStatus(id={booking_id})"),
                source: e,
            })?;
        Ok(parsed.booking)
    }

    /// Fetches the caller's currently active booking, if any.
    ///
    /// Consumed once at controller startup for recovery, and again as the
    /// single follow-up after a degraded submission response.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`Self::create_booking`].
    pub async fn active_booking(&self) -> Result<Option<ActiveBooking>, ApiError> {
        let url = self.endpoint("bookings/active");
        let body = self.get_json(&url).await?;
        Self::check_envelope(&body)?;

        let parsed: ActiveBookingResponse =
            serde_json::from_value(body).map_err(|e| ApiError::Deserialize {
                context: "activeBooking".to_owned(),
                source: e,
            })?;
        Ok(parsed.booking)
    }

    /// Asks the server to cancel a booking.
    ///
    /// Best-effort from the controller's point of view: a refusal is logged
    /// there and local cancellation proceeds regardless.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`Self::create_booking`].
    pub async fn cancel_booking(&self, booking_id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("bookings/{booking_id}/cancel"));
        let body = self
            .post_json(&url, &serde_json::json!({}))
            .await?;
        Self::check_envelope(&body)?;
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        self.base_url
            .join(path)
            .map_or_else(|_| format!("{}{path}", self.base_url), |u| u.to_string())
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, ApiError> {
        let response = self.client.get(url).send().await?;
        Self::read_json(url, response).await
    }

    async fn post_json<T: serde::Serialize>(
        &self,
        url: &str,
        payload: &T,
    ) -> Result<serde_json::Value, ApiError> {
        let response = self.client.post(url).json(payload).send().await?;
        Self::read_json(url, response).await
    }

    async fn read_json(
        url: &str,
        response: reqwest::Response,
    ) -> Result<serde_json::Value, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        // Error envelopes may ride on 4xx statuses; try to parse the body
        // first so the server's message wins over a bare status code.
        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value) => Ok(value),
            Err(e) if status.is_success() => Err(ApiError::Deserialize {
                context: format!("response body from {url}"),
                source: e,
            }),
            Err(_) => Err(ApiError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            }),
        }
    }

    /// Surfaces `{ "status": "error", "message": ... }` envelopes as
    /// [`ApiError::Rejected`].
    fn check_envelope(body: &serde_json::Value) -> Result<(), ApiError> {
        if body.get("status").and_then(|s| s.as_str()) == Some("error") {
            let message = body
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error")
                .to_owned();
            return Err(ApiError::Rejected(message));
        }
        Ok(())
    }
}
