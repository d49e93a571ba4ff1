//! Acceptance polling.
//!
//! One bounded task per waiting booking checks the server status at a fixed
//! cadence until a driver accepts, the booking is cancelled, or the attempt
//! ceiling is reached. Ticks are strictly sequential: the next status
//! request is issued only after the previous outcome is processed.
//! Cancellation is cooperative, with the flag checked before every sleep
//! and again after every in-flight response, so a response that lands
//! after `cancel()` cannot revive the poll.

use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::events::{EventKind, LifecycleEvent, PollOutcome};
use sakay_api::BookingClient;
use sakay_core::booking::BookingStatus;

/// Disposer for a running poller.
///
/// Dropping the handle also cancels the task: a poll must never outlive the
/// controller that owns its outcome.
#[derive(Debug)]
pub struct PollerHandle {
    cancel: watch::Sender<bool>,
}

impl PollerHandle {
    /// Requests cooperative cancellation. Idempotent.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }
}

/// Spawns the polling task for `booking_id`.
///
/// Resolution (accepted / cancelled / attempts exhausted) is delivered as a
/// single [`EventKind::PollResolved`] on `events`, stamped with
/// `generation`. Individual tick failures are logged at debug and counted
/// as normal attempts; only resolution ends the loop.
pub fn spawn_poller(
    client: BookingClient,
    booking_id: i64,
    interval: Duration,
    max_attempts: u32,
    generation: u64,
    events: mpsc::UnboundedSender<LifecycleEvent>,
) -> PollerHandle {
    let (cancel_tx, mut cancel_rx) = watch::channel(false);

    tokio::spawn(async move {
        let outcome = poll_loop(&client, booking_id, interval, max_attempts, &mut cancel_rx).await;
        let Some(outcome) = outcome else {
            tracing::debug!(booking_id, "acceptance poll cancelled");
            return;
        };
        let _ = events.send(LifecycleEvent {
            generation,
            kind: EventKind::PollResolved(outcome),
        });
    });

    PollerHandle { cancel: cancel_tx }
}

/// Runs the bounded poll loop. Returns `None` when cancelled.
async fn poll_loop(
    client: &BookingClient,
    booking_id: i64,
    interval: Duration,
    max_attempts: u32,
    cancel: &mut watch::Receiver<bool>,
) -> Option<PollOutcome> {
    // True once cancel was requested or the handle was dropped.
    let is_cancelled =
        |rx: &watch::Receiver<bool>| *rx.borrow() || rx.has_changed().is_err();

    for attempt in 1..=max_attempts {
        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            _ = cancel.changed() => return None,
        }
        if is_cancelled(cancel) {
            return None;
        }

        let snapshot = match client.booking_status(booking_id).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                // Transient tick failure: swallowed, counted, retried.
                tracing::debug!(booking_id, attempt, error = %err, "status check failed");
                continue;
            }
        };

        // The response may have raced a cancel; suppress its effect.
        if is_cancelled(cancel) {
            return None;
        }

        match snapshot.status {
            BookingStatus::Accepted => {
                if let Some(driver) = snapshot.driver {
                    tracing::info!(booking_id, attempt, driver_id = driver.id, "driver accepted");
                    return Some(PollOutcome::Accepted(driver));
                }
                // Accepted without a driver payload is not actionable yet;
                // the next tick will carry the assignment.
                tracing::debug!(booking_id, attempt, "accepted without driver payload");
            }
            BookingStatus::Cancelled => {
                tracing::info!(booking_id, attempt, "booking cancelled server-side");
                return Some(PollOutcome::Cancelled);
            }
            status => {
                tracing::trace!(booking_id, attempt, %status, "still waiting");
            }
        }
    }

    tracing::warn!(booking_id, max_attempts, "acceptance poll exhausted; leaving booking waiting");
    Some(PollOutcome::StillWaiting)
}
