//! Startup reconciliation between the persisted snapshot and the server's
//! page-load view of the active booking.
//!
//! Precedence: the server-pushed active booking wins on status (and driver),
//! but when both sides describe the same booking the stored identifier is
//! reused for continuity. A stored snapshot alone is still worth resuming;
//! the poller re-validates it against the server on the first tick.

use sakay_api::ActiveBooking;
use sakay_session::RecoverySnapshot;

/// Merges the two recovery sources into the booking the controller should
/// fast-forward to, if any.
#[must_use]
pub fn reconcile(
    stored: Option<RecoverySnapshot>,
    server: Option<ActiveBooking>,
) -> Option<ActiveBooking> {
    match (stored, server) {
        (Some(stored), Some(server)) => Some(ActiveBooking {
            // Same booking: keep the id the client has been tracking.
            // A different id means a booking placed elsewhere; the server
            // knows best, so its id wins too.
            id: if stored.booking_id == server.id {
                stored.booking_id
            } else {
                server.id
            },
            status: server.status,
            driver: server.driver,
        }),
        (None, Some(server)) => Some(server),
        (Some(stored), None) => Some(ActiveBooking {
            id: stored.booking_id,
            status: stored.last_status,
            driver: None,
        }),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use sakay_core::booking::{BookingStatus, DriverSummary};

    fn driver() -> DriverSummary {
        DriverSummary {
            id: 9,
            name: "Ramon C.".to_owned(),
            phone: None,
            plate_number: None,
            avatar_url: None,
        }
    }

    #[test]
    fn nothing_to_recover() {
        assert_eq!(reconcile(None, None), None);
    }

    #[test]
    fn server_snapshot_alone_is_used_as_is() {
        let server = ActiveBooking {
            id: 42,
            status: BookingStatus::Pending,
            driver: None,
        };
        assert_eq!(reconcile(None, Some(server.clone())), Some(server));
    }

    #[test]
    fn stored_snapshot_alone_resumes_with_stored_status() {
        let stored = RecoverySnapshot {
            booking_id: 42,
            last_status: BookingStatus::Pending,
        };
        let merged = reconcile(Some(stored), None).unwrap();
        assert_eq!(merged.id, 42);
        assert_eq!(merged.status, BookingStatus::Pending);
        assert!(merged.driver.is_none());
    }

    #[test]
    fn server_status_wins_over_stored_status() {
        let stored = RecoverySnapshot {
            booking_id: 42,
            last_status: BookingStatus::Pending,
        };
        let server = ActiveBooking {
            id: 42,
            status: BookingStatus::Accepted,
            driver: Some(driver()),
        };
        let merged = reconcile(Some(stored), Some(server)).unwrap();
        assert_eq!(merged.id, 42);
        assert_eq!(merged.status, BookingStatus::Accepted);
        assert_eq!(merged.driver, Some(driver()));
    }

    #[test]
    fn a_new_server_booking_replaces_the_stored_one() {
        let stored = RecoverySnapshot {
            booking_id: 42,
            last_status: BookingStatus::Pending,
        };
        let server = ActiveBooking {
            id: 77,
            status: BookingStatus::Pending,
            driver: None,
        };
        let merged = reconcile(Some(stored), Some(server)).unwrap();
        assert_eq!(merged.id, 77);
    }
}
