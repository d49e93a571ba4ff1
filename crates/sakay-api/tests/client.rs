//! Integration tests for `BookingClient` using wiremock HTTP mocks.

use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sakay_api::{ApiError, BookingClient};
use sakay_core::booking::{BookingRequest, BookingStatus, RideKind, Stop};
use sakay_core::LatLng;

fn test_client(base_url: &str) -> BookingClient {
    BookingClient::new(base_url, 30, "sakay-test/0.1")
        .expect("client construction should not fail")
}

fn sample_request() -> BookingRequest {
    BookingRequest {
        request_id: Uuid::new_v4(),
        ride_kind: RideKind::Standard,
        passenger_count: 2,
        pickup: Stop {
            position: LatLng::new(14.5995, 120.9842),
            address: "Quiapo Church, Manila".to_owned(),
            area: Some("Quiapo".to_owned()),
        },
        destination: Stop {
            position: LatLng::new(14.6091, 121.0223),
            address: "Araneta Coliseum, Quezon City".to_owned(),
            area: None,
        },
        fare: "₱125.50".to_owned(),
        distance_km: "6.4 km".to_owned(),
        duration_min: "22 min".to_owned(),
        passenger_name: Some("Liza M.".to_owned()),
        passenger_phone: None,
        emergency_contact: None,
    }
}

#[tokio::test]
async fn create_booking_returns_parsed_record() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "status": "ok",
        "booking": {
            "id": 42,
            "booking_code": "SKY-2025-0042",
            "status": "pending",
            "driver": null,
            "total_fare": 125.5,
            "created_at": "2025-08-01T08:30:00Z",
            "updated_at": "2025-08-01T08:30:00Z"
        }
    });

    Mock::given(method("POST"))
        .and(path("/bookings"))
        .and(body_partial_json(serde_json::json!({
            "ride_kind": "standard",
            "passenger_count": 2,
            "total_fare": 125.5,
            "distance_km": 6.4,
            "duration_min": 22.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let record = client
        .create_booking(&sample_request())
        .await
        .expect("should parse booking")
        .expect("booking payload should be present");

    assert_eq!(record.id, 42);
    assert_eq!(record.booking_code, "SKY-2025-0042");
    assert_eq!(record.status, BookingStatus::Pending);
    assert!(record.driver.is_none());
}

#[tokio::test]
async fn create_booking_without_payload_is_ok_none() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bookings"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "ok" })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let record = client
        .create_booking(&sample_request())
        .await
        .expect("degraded success is not an error");
    assert!(record.is_none());
}

#[tokio::test]
async fn create_booking_rejection_surfaces_server_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bookings"))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "status": "error",
            "message": "no drivers available in your area"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .create_booking(&sample_request())
        .await
        .expect_err("rejection should be an error");
    assert!(
        matches!(err, ApiError::Rejected(ref m) if m == "no drivers available in your area"),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn booking_status_parses_accepted_with_driver() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "status": "ok",
        "booking": {
            "status": "accepted",
            "driver": {
                "id": 9,
                "name": "Ramon C.",
                "phone": "+63-912-555-0199",
                "plate_number": "TRK-4821"
            }
        }
    });

    Mock::given(method("GET"))
        .and(path("/bookings/42/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let snapshot = client.booking_status(42).await.expect("should parse status");

    assert_eq!(snapshot.status, BookingStatus::Accepted);
    let driver = snapshot.driver.expect("driver should be present");
    assert_eq!(driver.id, 9);
    assert_eq!(driver.plate_number.as_deref(), Some("TRK-4821"));
}

#[tokio::test]
async fn active_booking_absent_is_ok_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookings/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok",
            "booking": null
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let active = client.active_booking().await.expect("should parse");
    assert!(active.is_none());
}

#[tokio::test]
async fn cancel_booking_succeeds_on_ok_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bookings/42/cancel"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "ok" })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    client.cancel_booking(42).await.expect("cancel should succeed");
}

#[tokio::test]
async fn non_json_server_failure_is_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookings/42/status"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.booking_status(42).await.expect_err("should fail");
    assert!(
        matches!(err, ApiError::UnexpectedStatus { status: 502, .. }),
        "got: {err:?}"
    );
}
