//! The booking lifecycle state machine.
//!
//! States: `Pending → Submitting → Waiting → Accepted → InProgress →
//! Completed`, with `Cancelled` reachable from `Pending`, `Waiting`, and
//! `Accepted`. The controller owns the poller and tracking-view handles,
//! persists the recovery snapshot on every non-terminal transition, and
//! clears it on terminal ones.
//!
//! Asynchronous completions (poll resolution, driver arrival, the degraded
//! refetch) arrive as [`LifecycleEvent`]s stamped with the generation they
//! were spawned under. `cancel` and `shutdown` bump the generation, so any
//! completion still in flight at that moment is discarded on arrival: a
//! late poll response cannot mutate a cancelled booking.

use tokio::sync::mpsc;

use crate::config::BookingConfig;
use crate::error::BookingError;
use crate::events::{EventKind, LifecycleEvent, PollOutcome};
use crate::poller::{spawn_poller, PollerHandle};
use crate::recovery::reconcile;
use crate::surface::MapSurface;
use crate::tracking::{spawn_driver_position, spawn_tracking, TrackingHandle, TrackingScene};
use sakay_api::{ActiveBooking, BookingClient};
use sakay_core::booking::{BookingStatus, DriverSummary};
use sakay_core::{BookingRequest, LatLng};
use sakay_routing::RouteResolver;
use sakay_session::{RecoverySnapshot, SessionStore};

/// Where a booking stands, with the data each stage owns.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleState {
    Pending,
    Submitting,
    /// Submitted, waiting for a driver. `booking_id` is `None` only in the
    /// degraded case where the submission response carried no booking and
    /// the follow-up fetch has not landed yet.
    Waiting { booking_id: Option<i64> },
    Accepted {
        booking_id: i64,
        driver: DriverSummary,
    },
    InProgress {
        booking_id: i64,
        driver: DriverSummary,
    },
    Completed,
    Cancelled,
}

impl LifecycleState {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            LifecycleState::Pending => "pending",
            LifecycleState::Submitting => "submitting",
            LifecycleState::Waiting { .. } => "waiting",
            LifecycleState::Accepted { .. } => "accepted",
            LifecycleState::InProgress { .. } => "in_progress",
            LifecycleState::Completed => "completed",
            LifecycleState::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub const fn booking_id(&self) -> Option<i64> {
        match self {
            LifecycleState::Waiting { booking_id } => *booking_id,
            LifecycleState::Accepted { booking_id, .. }
            | LifecycleState::InProgress { booking_id, .. } => Some(*booking_id),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Completed | LifecycleState::Cancelled)
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Orchestrates one booking from submission to a terminal state.
pub struct LifecycleController {
    state: LifecycleState,
    client: BookingClient,
    resolver: RouteResolver,
    store: SessionStore,
    config: BookingConfig,
    /// Bumped on cancel/shutdown; events from older generations are stale.
    generation: u64,
    /// Cleared on shutdown; a dead controller applies no event at all.
    alive: bool,
    events_tx: mpsc::UnboundedSender<LifecycleEvent>,
    events_rx: mpsc::UnboundedReceiver<LifecycleEvent>,
    poller: Option<PollerHandle>,
    tracking: Option<TrackingHandle>,
}

impl LifecycleController {
    /// Builds a controller, fast-forwarding into `Waiting` or `Accepted`
    /// when a recovered active booking is supplied.
    ///
    /// Must be called within a tokio runtime: recovery into `Waiting`
    /// resumes polling immediately, with no user action.
    #[must_use]
    pub fn new(
        client: BookingClient,
        resolver: RouteResolver,
        store: SessionStore,
        config: BookingConfig,
        active: Option<ActiveBooking>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut controller = Self {
            state: LifecycleState::Pending,
            client,
            resolver,
            store,
            config,
            generation: 1,
            alive: true,
            events_tx,
            events_rx,
            poller: None,
            tracking: None,
        };
        if let Some(active) = active {
            controller.recover(active);
        }
        controller
    }

    /// Builds a controller after reading both recovery sources: the
    /// persisted snapshot and the server's active-booking view.
    pub async fn bootstrap(
        client: BookingClient,
        resolver: RouteResolver,
        store: SessionStore,
        config: BookingConfig,
    ) -> Self {
        let stored = store.load().await;
        let server = match client.active_booking().await {
            Ok(server) => server,
            Err(err) => {
                tracing::debug!(error = %err, "active-booking fetch failed during bootstrap");
                None
            }
        };
        let active = reconcile(stored, server);
        Self::new(client, resolver, store, config, active)
    }

    #[must_use]
    pub const fn state(&self) -> &LifecycleState {
        &self.state
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Submits the prepared request.
    ///
    /// A call while a submission is already in flight is a logged no-op.
    /// On rejection the controller returns to `Pending` and surfaces the
    /// error; nothing is retried automatically.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidState`] outside `Pending`/`Submitting`.
    /// - [`BookingError::IncompleteRequest`] when pickup, destination, or
    ///   the computed fare is missing; no network call is made.
    /// - [`BookingError::Submit`] when the server rejects the booking.
    pub async fn confirm(&mut self, request: &BookingRequest) -> Result<(), BookingError> {
        match self.state {
            LifecycleState::Pending => {}
            LifecycleState::Submitting => {
                tracing::debug!("confirm ignored: submission already in flight");
                return Ok(());
            }
            ref state => {
                return Err(BookingError::InvalidState {
                    action: "confirm",
                    state: state.to_string(),
                })
            }
        }
        validate_request(request)?;

        self.state = LifecycleState::Submitting;
        tracing::info!(request_id = %request.request_id, "submitting booking");

        match self.client.create_booking(request).await {
            Ok(Some(record)) => {
                tracing::info!(
                    booking_id = record.id,
                    booking_code = %record.booking_code,
                    "booking created"
                );
                self.state = LifecycleState::Waiting {
                    booking_id: Some(record.id),
                };
                self.persist(record.id, BookingStatus::Pending).await;
                self.start_poller(record.id);
                Ok(())
            }
            Ok(None) => {
                // Degraded: submission succeeded but no booking came back.
                // One follow-up fetch after a short delay, then normal flow.
                self.state = LifecycleState::Waiting { booking_id: None };
                self.schedule_active_refetch();
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "booking submission failed");
                self.state = LifecycleState::Pending;
                Err(BookingError::Submit(err))
            }
        }
    }

    /// Applies one completion event.
    ///
    /// Stale events (an older generation, or anything after `shutdown`)
    /// are discarded without touching state.
    pub async fn handle_event(&mut self, event: LifecycleEvent) {
        if !self.alive || event.generation != self.generation {
            tracing::debug!(
                event_generation = event.generation,
                current_generation = self.generation,
                alive = self.alive,
                "discarding stale lifecycle event"
            );
            return;
        }

        match event.kind {
            EventKind::PollResolved(outcome) => self.apply_poll_outcome(outcome).await,
            EventKind::DriverArrived => self.apply_driver_arrived(),
            EventKind::ActiveRefetched(active) => self.apply_active_refetched(active).await,
        }
    }

    /// Waits for the next completion event from the poller, the tracking
    /// view, or the degraded refetch.
    pub async fn recv_event(&mut self) -> Option<LifecycleEvent> {
        self.events_rx.recv().await
    }

    /// Cancels the booking. Legal from `Pending`, `Waiting`, and
    /// `Accepted`; idempotent from `Cancelled`.
    ///
    /// The poller and tracking view are stopped, the server is informed
    /// when an id exists (its refusal is logged, never honoured over the
    /// user), and the recovery snapshot is cleared.
    ///
    /// # Errors
    ///
    /// [`BookingError::InvalidState`] from `Submitting`, `InProgress`, or
    /// `Completed`.
    pub async fn cancel(&mut self) -> Result<(), BookingError> {
        match self.state {
            LifecycleState::Pending
            | LifecycleState::Waiting { .. }
            | LifecycleState::Accepted { .. } => {}
            LifecycleState::Cancelled => return Ok(()),
            ref state => {
                return Err(BookingError::InvalidState {
                    action: "cancel",
                    state: state.to_string(),
                })
            }
        }

        // Stale-proof any completion already in flight.
        self.generation += 1;
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
        if let Some(tracking) = self.tracking.take() {
            tracking.cancel();
        }

        if let Some(booking_id) = self.state.booking_id() {
            if let Err(err) = self.client.cancel_booking(booking_id).await {
                tracing::warn!(booking_id, error = %err, "server refused cancellation; cancelling locally anyway");
            }
        }

        self.clear_snapshot().await;
        self.state = LifecycleState::Cancelled;
        tracing::info!("booking cancelled");
        Ok(())
    }

    /// Mounts the tracking view for the accepted booking on `surface`.
    ///
    /// No-op outside `Accepted`, and while a view is already mounted:
    /// the live surface is reused rather than recreated, so re-entering
    /// the same state never flickers.
    pub fn attach_surface<M: MapSurface>(
        &mut self,
        surface: M,
        pickup: LatLng,
        destination: LatLng,
    ) {
        if !matches!(self.state, LifecycleState::Accepted { .. }) {
            tracing::debug!(state = %self.state, "attach_surface ignored outside accepted state");
            return;
        }
        if self.tracking.is_some() {
            tracing::debug!("tracking view already mounted; reusing it");
            return;
        }
        let scene = TrackingScene {
            pickup,
            destination,
            driver_start: spawn_driver_position(pickup),
        };
        self.tracking = Some(spawn_tracking(
            surface,
            self.resolver.clone(),
            scene,
            self.config.tracking.clone(),
            self.generation,
            self.events_tx.clone(),
        ));
    }

    /// Marks the ride finished. Legal only from `InProgress`.
    ///
    /// # Errors
    ///
    /// [`BookingError::InvalidState`] from any other state.
    pub async fn complete(&mut self) -> Result<(), BookingError> {
        if !matches!(self.state, LifecycleState::InProgress { .. }) {
            return Err(BookingError::InvalidState {
                action: "complete",
                state: self.state.to_string(),
            });
        }
        if let Some(tracking) = self.tracking.take() {
            tracking.cancel();
        }
        self.clear_snapshot().await;
        self.state = LifecycleState::Completed;
        tracing::info!("booking completed");
        Ok(())
    }

    /// Unmounts the controller: stops the poller and tracking view and
    /// drops all late completions. The recovery snapshot is NOT cleared;
    /// an in-flight booking must survive a reload.
    pub fn shutdown(&mut self) {
        self.alive = false;
        self.generation += 1;
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
        if let Some(tracking) = self.tracking.take() {
            tracking.cancel();
        }
        tracing::debug!("lifecycle controller shut down");
    }

    fn recover(&mut self, active: ActiveBooking) {
        match (active.status, active.driver) {
            (BookingStatus::Accepted | BookingStatus::InProgress, Some(driver)) => {
                tracing::info!(booking_id = active.id, driver_id = driver.id, "recovered accepted booking");
                self.state = LifecycleState::Accepted {
                    booking_id: active.id,
                    driver,
                };
            }
            (BookingStatus::Completed | BookingStatus::Cancelled, _) => {
                tracing::debug!(booking_id = active.id, "recovered booking already terminal");
            }
            (_, _) => {
                tracing::info!(booking_id = active.id, "recovered waiting booking; resuming poll");
                self.state = LifecycleState::Waiting {
                    booking_id: Some(active.id),
                };
                self.start_poller(active.id);
            }
        }
    }

    async fn apply_poll_outcome(&mut self, outcome: PollOutcome) {
        let LifecycleState::Waiting { booking_id } = self.state else {
            tracing::debug!(state = %self.state, "poll outcome outside waiting state; ignored");
            return;
        };
        self.poller = None;

        match outcome {
            PollOutcome::Accepted(driver) => {
                let Some(booking_id) = booking_id else { return };
                self.persist(booking_id, BookingStatus::Accepted).await;
                self.state = LifecycleState::Accepted { booking_id, driver };
            }
            PollOutcome::Cancelled => {
                self.clear_snapshot().await;
                self.state = LifecycleState::Cancelled;
            }
            PollOutcome::StillWaiting => {
                // Explicit degraded outcome: stay waiting, re-assert the
                // snapshot so a reload keeps resuming this booking.
                if let Some(booking_id) = booking_id {
                    self.persist(booking_id, BookingStatus::Pending).await;
                }
            }
        }
    }

    fn apply_driver_arrived(&mut self) {
        let (booking_id, driver) = match &self.state {
            LifecycleState::Accepted { booking_id, driver } => (*booking_id, driver.clone()),
            state => {
                tracing::debug!(%state, "driver arrival outside accepted state; ignored");
                return;
            }
        };
        self.state = LifecycleState::InProgress { booking_id, driver };
        tracing::info!(booking_id, "ride started");
    }

    async fn apply_active_refetched(&mut self, active: Option<ActiveBooking>) {
        if !matches!(self.state, LifecycleState::Waiting { booking_id: None }) {
            tracing::debug!(state = %self.state, "active refetch outside degraded waiting; ignored");
            return;
        }
        let Some(active) = active else {
            // Explicitly degraded: no id to poll, the booking stays
            // waiting until the user retries or navigates back.
            tracing::warn!("no active booking found after degraded submission response");
            return;
        };

        match (active.status, active.driver) {
            (BookingStatus::Accepted | BookingStatus::InProgress, Some(driver)) => {
                self.persist(active.id, BookingStatus::Accepted).await;
                self.state = LifecycleState::Accepted {
                    booking_id: active.id,
                    driver,
                };
            }
            (BookingStatus::Cancelled | BookingStatus::Completed, _) => {
                self.clear_snapshot().await;
                self.state = LifecycleState::Cancelled;
            }
            (_, _) => {
                self.persist(active.id, BookingStatus::Pending).await;
                self.state = LifecycleState::Waiting {
                    booking_id: Some(active.id),
                };
                self.start_poller(active.id);
            }
        }
    }

    fn start_poller(&mut self, booking_id: i64) {
        // At most one live poller: replace-then-cancel the old handle.
        if let Some(old) = self.poller.take() {
            old.cancel();
        }
        self.poller = Some(spawn_poller(
            self.client.clone(),
            booking_id,
            self.config.poll_interval,
            self.config.poll_max_attempts,
            self.generation,
            self.events_tx.clone(),
        ));
    }

    fn schedule_active_refetch(&self) {
        let client = self.client.clone();
        let delay = self.config.degraded_refetch_delay;
        let generation = self.generation;
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let active = match client.active_booking().await {
                Ok(active) => active,
                Err(err) => {
                    tracing::debug!(error = %err, "degraded-response refetch failed");
                    None
                }
            };
            let _ = events.send(LifecycleEvent {
                generation,
                kind: EventKind::ActiveRefetched(active),
            });
        });
    }

    async fn persist(&self, booking_id: i64, status: BookingStatus) {
        let snapshot = RecoverySnapshot {
            booking_id,
            last_status: status,
        };
        if let Err(err) = self.store.save(&snapshot).await {
            tracing::warn!(booking_id, error = %err, "failed to persist recovery snapshot");
        }
    }

    async fn clear_snapshot(&self) {
        if let Err(err) = self.store.clear().await {
            tracing::warn!(error = %err, "failed to clear recovery snapshot");
        }
    }
}

/// Pre-submission guard: nothing may go to the server without a pickup, a
/// destination, and a computed fare/distance.
fn validate_request(request: &BookingRequest) -> Result<(), BookingError> {
    if request.pickup.address.trim().is_empty() {
        return Err(BookingError::IncompleteRequest("pickup"));
    }
    if request.destination.address.trim().is_empty() {
        return Err(BookingError::IncompleteRequest("destination"));
    }
    if request.fare.trim().is_empty() || request.distance_km.trim().is_empty() {
        return Err(BookingError::IncompleteRequest("computed route and fare"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use sakay_core::booking::{RideKind, Stop};

    fn offline_client() -> BookingClient {
        BookingClient::new("http://127.0.0.1:9", 1, "sakay-test/0.1").expect("client")
    }

    fn offline_resolver() -> RouteResolver {
        RouteResolver::new("http://127.0.0.1:9", 1, "sakay-test/0.1").expect("resolver")
    }

    fn scratch_store() -> SessionStore {
        SessionStore::new(
            std::env::temp_dir().join(format!("sakay-controller-{}.json", uuid::Uuid::new_v4())),
        )
    }

    fn fast_config() -> BookingConfig {
        BookingConfig {
            poll_interval: Duration::from_millis(2),
            poll_max_attempts: 3,
            degraded_refetch_delay: Duration::from_millis(2),
            ..BookingConfig::default()
        }
    }

    fn offline_controller(active: Option<ActiveBooking>) -> LifecycleController {
        LifecycleController::new(
            offline_client(),
            offline_resolver(),
            scratch_store(),
            fast_config(),
            active,
        )
    }

    fn sample_request() -> BookingRequest {
        BookingRequest {
            request_id: uuid::Uuid::new_v4(),
            ride_kind: RideKind::Standard,
            passenger_count: 1,
            pickup: Stop {
                position: LatLng::new(14.5995, 120.9842),
                address: "Quiapo Church, Manila".to_owned(),
                area: None,
            },
            destination: Stop {
                position: LatLng::new(14.6091, 121.0223),
                address: "Araneta Coliseum, Quezon City".to_owned(),
                area: None,
            },
            fare: "₱125.50".to_owned(),
            distance_km: "6.4".to_owned(),
            duration_min: "22".to_owned(),
            passenger_name: None,
            passenger_phone: None,
            emergency_contact: None,
        }
    }

    fn driver() -> DriverSummary {
        DriverSummary {
            id: 9,
            name: "Ramon C.".to_owned(),
            phone: None,
            plate_number: None,
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn confirm_is_a_noop_while_submitting() {
        let mut controller = offline_controller(None);
        controller.state = LifecycleState::Submitting;

        let result = controller.confirm(&sample_request()).await;
        assert!(result.is_ok());
        assert_eq!(controller.state, LifecycleState::Submitting);
    }

    #[tokio::test]
    async fn confirm_is_rejected_outside_pending() {
        let mut controller = offline_controller(None);
        controller.state = LifecycleState::Cancelled;

        let err = controller.confirm(&sample_request()).await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidState { action: "confirm", .. }));
    }

    #[tokio::test]
    async fn incomplete_request_blocks_before_any_network_call() {
        let mut controller = offline_controller(None);
        let mut request = sample_request();
        request.destination.address = "  ".to_owned();

        let err = controller.confirm(&request).await.unwrap_err();
        assert!(matches!(err, BookingError::IncompleteRequest("destination")));
        // Validation failure means no transition happened at all.
        assert_eq!(controller.state, LifecycleState::Pending);
    }

    #[tokio::test]
    async fn submission_failure_returns_to_pending() {
        // Offline client: the POST itself fails.
        let mut controller = offline_controller(None);

        let err = controller.confirm(&sample_request()).await.unwrap_err();
        assert!(matches!(err, BookingError::Submit(_)));
        assert_eq!(controller.state, LifecycleState::Pending);
    }

    #[tokio::test]
    async fn stale_generation_events_are_discarded() {
        let mut controller = offline_controller(None);
        controller.state = LifecycleState::Waiting { booking_id: Some(42) };

        controller
            .handle_event(LifecycleEvent {
                generation: controller.generation() + 1,
                kind: EventKind::PollResolved(PollOutcome::Accepted(driver())),
            })
            .await;

        assert_eq!(controller.state, LifecycleState::Waiting { booking_id: Some(42) });
    }

    #[tokio::test]
    async fn events_after_shutdown_are_discarded() {
        let mut controller = offline_controller(None);
        controller.state = LifecycleState::Waiting { booking_id: Some(42) };
        let generation = controller.generation();
        controller.shutdown();

        controller
            .handle_event(LifecycleEvent {
                generation,
                kind: EventKind::PollResolved(PollOutcome::Accepted(driver())),
            })
            .await;

        assert_eq!(controller.state, LifecycleState::Waiting { booking_id: Some(42) });
    }

    #[tokio::test]
    async fn recovery_from_pending_snapshot_enters_waiting() {
        let controller = offline_controller(Some(ActiveBooking {
            id: 42,
            status: BookingStatus::Pending,
            driver: None,
        }));
        assert_eq!(controller.state, LifecycleState::Waiting { booking_id: Some(42) });
        assert!(controller.poller.is_some(), "recovery must resume polling");
    }

    #[tokio::test]
    async fn recovery_from_accepted_snapshot_enters_accepted() {
        let controller = offline_controller(Some(ActiveBooking {
            id: 42,
            status: BookingStatus::Accepted,
            driver: Some(driver()),
        }));
        assert_eq!(
            controller.state,
            LifecycleState::Accepted {
                booking_id: 42,
                driver: driver()
            }
        );
        assert!(controller.poller.is_none());
    }

    #[tokio::test]
    async fn recovery_from_terminal_snapshot_stays_pending() {
        let controller = offline_controller(Some(ActiveBooking {
            id: 42,
            status: BookingStatus::Cancelled,
            driver: None,
        }));
        assert_eq!(controller.state, LifecycleState::Pending);
    }

    #[tokio::test]
    async fn poll_acceptance_carries_driver_data_exactly() {
        let mut controller = offline_controller(None);
        controller.state = LifecycleState::Waiting { booking_id: Some(42) };

        controller
            .handle_event(LifecycleEvent {
                generation: controller.generation(),
                kind: EventKind::PollResolved(PollOutcome::Accepted(driver())),
            })
            .await;

        assert_eq!(
            controller.state,
            LifecycleState::Accepted {
                booking_id: 42,
                driver: driver()
            }
        );
        let snapshot = controller.store.load().await.expect("snapshot persisted");
        assert_eq!(snapshot.last_status, BookingStatus::Accepted);
        controller.store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn poll_cancellation_clears_the_snapshot() {
        let mut controller = offline_controller(None);
        controller.state = LifecycleState::Waiting { booking_id: Some(42) };
        controller.persist(42, BookingStatus::Pending).await;

        controller
            .handle_event(LifecycleEvent {
                generation: controller.generation(),
                kind: EventKind::PollResolved(PollOutcome::Cancelled),
            })
            .await;

        assert_eq!(controller.state, LifecycleState::Cancelled);
        assert!(controller.store.load().await.is_none());
    }

    #[tokio::test]
    async fn still_waiting_keeps_waiting_and_rewrites_the_snapshot() {
        let mut controller = offline_controller(None);
        controller.state = LifecycleState::Waiting { booking_id: Some(42) };

        controller
            .handle_event(LifecycleEvent {
                generation: controller.generation(),
                kind: EventKind::PollResolved(PollOutcome::StillWaiting),
            })
            .await;

        assert_eq!(controller.state, LifecycleState::Waiting { booking_id: Some(42) });
        let snapshot = controller.store.load().await.expect("snapshot rewritten");
        assert_eq!(snapshot.booking_id, 42);
        assert_eq!(snapshot.last_status, BookingStatus::Pending);
        controller.store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn cancel_from_waiting_discards_late_poll_responses() {
        let mut controller = offline_controller(None);
        controller.state = LifecycleState::Waiting { booking_id: Some(42) };
        let pre_cancel_generation = controller.generation();

        controller.cancel().await.expect("cancel is legal from waiting");
        assert_eq!(controller.state, LifecycleState::Cancelled);

        // A response that was in flight when the user cancelled.
        controller
            .handle_event(LifecycleEvent {
                generation: pre_cancel_generation,
                kind: EventKind::PollResolved(PollOutcome::Accepted(driver())),
            })
            .await;
        assert_eq!(controller.state, LifecycleState::Cancelled);
    }

    #[tokio::test]
    async fn cancel_is_idempotent_and_illegal_mid_submission() {
        let mut controller = offline_controller(None);
        controller.state = LifecycleState::Cancelled;
        controller.cancel().await.expect("second cancel is a no-op");

        controller.state = LifecycleState::Submitting;
        let err = controller.cancel().await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidState { action: "cancel", .. }));
    }

    #[tokio::test]
    async fn driver_arrival_moves_accepted_to_in_progress() {
        let mut controller = offline_controller(None);
        controller.state = LifecycleState::Accepted {
            booking_id: 42,
            driver: driver(),
        };

        controller
            .handle_event(LifecycleEvent {
                generation: controller.generation(),
                kind: EventKind::DriverArrived,
            })
            .await;

        assert_eq!(
            controller.state,
            LifecycleState::InProgress {
                booking_id: 42,
                driver: driver()
            }
        );
    }

    #[tokio::test]
    async fn degraded_refetch_with_id_resumes_normal_flow() {
        let mut controller = offline_controller(None);
        controller.state = LifecycleState::Waiting { booking_id: None };

        controller
            .handle_event(LifecycleEvent {
                generation: controller.generation(),
                kind: EventKind::ActiveRefetched(Some(ActiveBooking {
                    id: 77,
                    status: BookingStatus::Pending,
                    driver: None,
                })),
            })
            .await;

        assert_eq!(controller.state, LifecycleState::Waiting { booking_id: Some(77) });
        assert!(controller.poller.is_some());
        controller.store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn degraded_refetch_without_id_stays_waiting() {
        let mut controller = offline_controller(None);
        controller.state = LifecycleState::Waiting { booking_id: None };

        controller
            .handle_event(LifecycleEvent {
                generation: controller.generation(),
                kind: EventKind::ActiveRefetched(None),
            })
            .await;

        assert_eq!(controller.state, LifecycleState::Waiting { booking_id: None });
        assert!(controller.poller.is_none());
    }

    #[tokio::test]
    async fn complete_requires_in_progress() {
        let mut controller = offline_controller(None);
        let err = controller.complete().await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidState { action: "complete", .. }));

        controller.state = LifecycleState::InProgress {
            booking_id: 42,
            driver: driver(),
        };
        controller.complete().await.expect("complete from in_progress");
        assert_eq!(controller.state, LifecycleState::Completed);
    }
}
