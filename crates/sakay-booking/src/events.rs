//! Completion events flowing from spawned tasks back to the controller.
//!
//! Every event carries the generation it was spawned under; the controller
//! discards events from an older generation, so a poll response or arrival
//! notification that lands after a cancel can never mutate state.

use sakay_api::ActiveBooking;
use sakay_core::booking::DriverSummary;

/// Terminal outcome of one acceptance-poller run.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// A driver took the booking.
    Accepted(DriverSummary),
    /// The server cancelled the booking.
    Cancelled,
    /// Attempts exhausted with no resolution. Not an error: the booking
    /// stays in `Waiting` rather than failing hard.
    StillWaiting,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    PollResolved(PollOutcome),
    /// The simulated driver reached the pickup point.
    DriverArrived,
    /// Result of the single follow-up active-booking fetch after a
    /// degraded submission response.
    ActiveRefetched(Option<ActiveBooking>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleEvent {
    pub generation: u64,
    pub kind: EventKind,
}
