//! Live tracking view: markers, route, and the driver-approach simulation.
//!
//! Active only while a booking is accepted or in progress. The view owns
//! its [`MapSurface`] for that whole span; the surface is acquired once
//! and reused, never recreated per redraw.
//!
//! The driver position here is simulated: real device GPS belongs to the
//! driver-side client, which is outside this system. Each tick moves the
//! marker a fixed fraction of the remaining distance toward the pickup
//! point; the simulation's one structural obligation is emitting
//! [`EventKind::DriverArrived`] when the distance falls below the arrival
//! threshold.

use tokio::sync::{mpsc, watch};

use crate::config::TrackingConfig;
use crate::events::{EventKind, LifecycleEvent};
use crate::surface::{MapSurface, MarkerKind, PathKind};
use sakay_core::LatLng;
use sakay_routing::RouteResolver;

/// The three positions a mounted tracking view renders.
#[derive(Debug, Clone, Copy)]
pub struct TrackingScene {
    pub pickup: LatLng,
    pub destination: LatLng,
    pub driver_start: LatLng,
}

/// Disposer for a running tracking view. Dropping the handle tears the
/// view down as well.
#[derive(Debug)]
pub struct TrackingHandle {
    cancel: watch::Sender<bool>,
}

impl TrackingHandle {
    /// Requests cooperative teardown. Idempotent.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }
}

/// Picks a simulated spawn position for the driver, 1–2 km out from the
/// pickup point in a random direction. Regenerated every time tracking
/// begins; never persisted.
#[must_use]
pub fn spawn_driver_position(pickup: LatLng) -> LatLng {
    let bearing = rand::random::<f64>() * std::f64::consts::TAU;
    let radius_deg = 0.01 + rand::random::<f64>() * 0.008;
    LatLng::new(
        pickup.lat + bearing.sin() * radius_deg,
        pickup.lng + bearing.cos() * radius_deg,
    )
}

/// Mounts the tracking view on `surface` and starts the approach
/// simulation.
///
/// Sequence: wait for the surface to report non-zero dimensions (hidden or
/// animating containers report zero size), place the passenger,
/// destination, and driver markers, draw the resolved ride route and the
/// approach line, fit bounds around passenger and driver, then tick the
/// simulation until arrival or teardown.
pub fn spawn_tracking<M: MapSurface>(
    mut surface: M,
    resolver: RouteResolver,
    scene: TrackingScene,
    config: TrackingConfig,
    generation: u64,
    events: mpsc::UnboundedSender<LifecycleEvent>,
) -> TrackingHandle {
    let (cancel_tx, mut cancel_rx) = watch::channel(false);

    tokio::spawn(async move {
        if !wait_for_surface(&surface, &config, &mut cancel_rx).await {
            return;
        }

        surface.set_marker(MarkerKind::Passenger, scene.pickup);
        surface.set_marker(MarkerKind::Destination, scene.destination);
        surface.set_marker(MarkerKind::Driver, scene.driver_start);

        let route = resolver.resolve(scene.pickup, scene.destination).await;
        if *cancel_rx.borrow() || cancel_rx.has_changed().is_err() {
            surface.clear();
            return;
        }
        surface.draw_path(PathKind::Route, &route);
        surface.draw_path(PathKind::Approach, &[scene.driver_start, scene.pickup]);
        surface.fit_bounds(scene.pickup, scene.driver_start, config.bounds_padding_px);

        let arrived = simulate_approach(&mut surface, &scene, &config, &mut cancel_rx).await;

        if arrived {
            let _ = events.send(LifecycleEvent {
                generation,
                kind: EventKind::DriverArrived,
            });
        } else {
            // Torn down mid-approach: release markers and layers.
            surface.clear();
        }
    });

    TrackingHandle { cancel: cancel_tx }
}

/// Polls the surface until it reports usable dimensions. Returns `false`
/// when cancelled while waiting. After `surface_retry_limit` checks the
/// view proceeds anyway rather than staying blank forever.
async fn wait_for_surface<M: MapSurface>(
    surface: &M,
    config: &TrackingConfig,
    cancel: &mut watch::Receiver<bool>,
) -> bool {
    for _ in 0..config.surface_retry_limit {
        match surface.viewport() {
            Some((w, h)) if w > 0 && h > 0 => return true,
            _ => {}
        }
        tokio::select! {
            () = tokio::time::sleep(config.surface_retry) => {}
            _ = cancel.changed() => return false,
        }
        if *cancel.borrow() {
            return false;
        }
    }
    tracing::warn!("map surface never reported a size; mounting anyway");
    true
}

/// Advances the driver toward the pickup point until arrival or
/// cancellation. Returns `true` on arrival.
async fn simulate_approach<M: MapSurface>(
    surface: &mut M,
    scene: &TrackingScene,
    config: &TrackingConfig,
    cancel: &mut watch::Receiver<bool>,
) -> bool {
    let mut driver = scene.driver_start;

    loop {
        tokio::select! {
            () = tokio::time::sleep(config.sim_tick) => {}
            _ = cancel.changed() => return false,
        }
        if *cancel.borrow() {
            return false;
        }

        driver = driver.step_toward(&scene.pickup, config.approach_factor);
        surface.set_marker(MarkerKind::Driver, driver);
        surface.draw_path(PathKind::Approach, &[driver, scene.pickup]);

        let remaining = driver.distance_m(&scene.pickup);
        if remaining < config.arrival_threshold_m {
            tracing::info!(remaining_m = remaining, "simulated driver reached pickup");
            return true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tokio::sync::mpsc::unbounded_channel;

    use crate::surface::{RecordingSurface, SurfaceOp};

    const PICKUP: LatLng = LatLng::new(14.5995, 120.9842);
    const DESTINATION: LatLng = LatLng::new(14.6091, 121.0223);
    const DRIVER_START: LatLng = LatLng::new(14.6105, 120.9950);

    fn scene() -> TrackingScene {
        TrackingScene {
            pickup: PICKUP,
            destination: DESTINATION,
            driver_start: DRIVER_START,
        }
    }

    fn fast_config() -> TrackingConfig {
        TrackingConfig {
            surface_retry: Duration::from_millis(2),
            surface_retry_limit: 100,
            sim_tick: Duration::from_millis(1),
            approach_factor: 0.1,
            arrival_threshold_m: 30.0,
            bounds_padding_px: 80,
        }
    }

    /// Unreachable resolver: every resolve falls back to the straight line,
    /// which is all these tests need.
    fn offline_resolver() -> RouteResolver {
        RouteResolver::new("http://127.0.0.1:9", 1, "sakay-test/0.1").expect("resolver")
    }

    #[tokio::test]
    async fn first_tick_moves_driver_ten_percent_closer() {
        let (surface, log) = RecordingSurface::new();
        let (tx, mut rx) = unbounded_channel();

        let _handle =
            spawn_tracking(surface, offline_resolver(), scene(), fast_config(), 1, tx);

        rx.recv().await.expect("driver should arrive");

        let positions = log.driver_positions();
        // positions[0] is the initial placement, positions[1] the first tick.
        assert!(positions.len() > 2);
        assert_eq!(positions[0], DRIVER_START);
        let before = positions[0].distance_m(&PICKUP);
        let after = positions[1].distance_m(&PICKUP);
        assert!(
            (after / before - 0.9).abs() < 1e-3,
            "expected 0.9x distance, got {}",
            after / before
        );
    }

    #[tokio::test]
    async fn arrival_emits_driver_arrived_once() {
        let (surface, _log) = RecordingSurface::new();
        let (tx, mut rx) = unbounded_channel();

        let _handle =
            spawn_tracking(surface, offline_resolver(), scene(), fast_config(), 3, tx);

        let event = rx.recv().await.expect("driver should arrive");
        assert_eq!(event.generation, 3);
        assert_eq!(event.kind, EventKind::DriverArrived);
        assert!(rx.recv().await.is_none(), "sender dropped after arrival");
    }

    #[tokio::test]
    async fn markers_wait_for_surface_readiness() {
        let (surface, log) = RecordingSurface::with_delayed_readiness(3);
        let (tx, mut rx) = unbounded_channel();

        let _handle =
            spawn_tracking(surface, offline_resolver(), scene(), fast_config(), 1, tx);

        rx.recv().await.expect("driver should arrive");

        assert!(
            log.viewport_polls() >= 4,
            "expected at least 4 readiness polls, got {}",
            log.viewport_polls()
        );
        let ops = log.ops();
        assert!(
            matches!(ops.first(), Some(SurfaceOp::Marker(MarkerKind::Passenger, _))),
            "no marker may be placed before the surface is ready: {ops:?}"
        );
    }

    #[tokio::test]
    async fn route_and_approach_paths_are_drawn_before_simulation() {
        let (surface, log) = RecordingSurface::new();
        let (tx, mut rx) = unbounded_channel();

        let _handle =
            spawn_tracking(surface, offline_resolver(), scene(), fast_config(), 1, tx);

        rx.recv().await.expect("driver should arrive");

        let ops = log.ops();
        let route = ops.iter().find_map(|op| match op {
            SurfaceOp::Path(PathKind::Route, path) => Some(path.clone()),
            _ => None,
        });
        // Offline resolver: the route degrades to the straight line.
        assert_eq!(route, Some(vec![PICKUP, DESTINATION]));
        assert!(ops
            .iter()
            .any(|op| matches!(op, SurfaceOp::FitBounds(_, _, 80))));
    }

    #[tokio::test]
    async fn cancel_stops_simulation_without_arrival() {
        let (surface, log) = RecordingSurface::new();
        let (tx, mut rx) = unbounded_channel();

        let config = TrackingConfig {
            sim_tick: Duration::from_millis(20),
            ..fast_config()
        };
        let handle = spawn_tracking(surface, offline_resolver(), scene(), config, 1, tx);

        // Let the mount finish, then tear down mid-approach.
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(
            rx.try_recv().is_err(),
            "no DriverArrived may be emitted after teardown"
        );
        assert_eq!(
            log.ops().last(),
            Some(&SurfaceOp::Clear),
            "teardown must release markers and layers"
        );
    }

    #[test]
    fn spawned_driver_position_is_offset_from_pickup() {
        let spawn = spawn_driver_position(PICKUP);
        let distance = spawn.distance_m(&PICKUP);
        assert!(distance > 500.0, "driver spawned too close: {distance} m");
        assert!(distance < 3000.0, "driver spawned too far: {distance} m");
    }
}
