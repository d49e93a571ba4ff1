//! Map surface abstraction.
//!
//! Real map widgets refuse to initialise inside a zero-sized container and
//! must be reused across re-renders to avoid flicker, so the tracking view
//! talks to this trait instead of a concrete map: acquisition is deferred
//! until [`MapSurface::viewport`] reports a usable size, and the same
//! surface instance lives for the whole `Accepted`/`InProgress` span.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use sakay_core::LatLng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Passenger,
    Destination,
    Driver,
}

impl std::fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkerKind::Passenger => write!(f, "passenger"),
            MarkerKind::Destination => write!(f, "destination"),
            MarkerKind::Driver => write!(f, "driver"),
        }
    }
}

/// Which polyline a draw call replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// The resolved pickup-to-destination ride route.
    Route,
    /// The driver-to-pickup approach line, redrawn every simulation tick.
    Approach,
}

/// A mountable map rendering target.
///
/// Mutated only by the tracking view that owns it; the controller's state
/// machine guarantees one live tracking view per booking.
pub trait MapSurface: Send + Sync + 'static {
    /// Rendered dimensions, or `None`/zero while the target is hidden or
    /// still animating into place.
    fn viewport(&self) -> Option<(u32, u32)>;

    /// Places or moves the marker of the given kind.
    fn set_marker(&mut self, kind: MarkerKind, at: LatLng);

    /// Replaces the polyline of the given kind.
    fn draw_path(&mut self, kind: PathKind, path: &[LatLng]);

    /// Zooms/pans so both points are visible with a pixel margin.
    fn fit_bounds(&mut self, a: LatLng, b: LatLng, padding_px: u32);

    /// Releases all markers and layers.
    fn clear(&mut self);
}

/// Surface for headless use: every mutation becomes a `tracing` line.
#[derive(Debug, Default)]
pub struct TraceSurface;

impl MapSurface for TraceSurface {
    fn viewport(&self) -> Option<(u32, u32)> {
        Some((1280, 720))
    }

    fn set_marker(&mut self, kind: MarkerKind, at: LatLng) {
        tracing::info!(marker = %kind, position = %at, "marker updated");
    }

    fn draw_path(&mut self, kind: PathKind, path: &[LatLng]) {
        tracing::info!(kind = ?kind, points = path.len(), "path drawn");
    }

    fn fit_bounds(&mut self, a: LatLng, b: LatLng, padding_px: u32) {
        tracing::info!(%a, %b, padding_px, "bounds fitted");
    }

    fn clear(&mut self) {
        tracing::info!("map surface cleared");
    }
}

/// One recorded surface mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Marker(MarkerKind, LatLng),
    Path(PathKind, Vec<LatLng>),
    FitBounds(LatLng, LatLng, u32),
    Clear,
}

/// Shared view into a [`RecordingSurface`]'s history.
#[derive(Debug, Clone, Default)]
pub struct SurfaceLog {
    ops: Arc<Mutex<Vec<SurfaceOp>>>,
    viewport_polls: Arc<AtomicU32>,
}

impl SurfaceLog {
    #[must_use]
    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.ops.lock().expect("surface log poisoned").clone()
    }

    /// Number of readiness polls the surface has answered.
    #[must_use]
    pub fn viewport_polls(&self) -> u32 {
        self.viewport_polls.load(Ordering::SeqCst)
    }

    /// Positions the driver marker has been placed at, in order.
    #[must_use]
    pub fn driver_positions(&self) -> Vec<LatLng> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                SurfaceOp::Marker(MarkerKind::Driver, at) => Some(at),
                _ => None,
            })
            .collect()
    }
}

/// Scriptable surface for tests: records every mutation and can report a
/// zero-sized viewport for the first `not_ready_polls` readiness checks.
#[derive(Debug)]
pub struct RecordingSurface {
    log: SurfaceLog,
    not_ready_polls: u32,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> (Self, SurfaceLog) {
        Self::with_delayed_readiness(0)
    }

    /// The viewport reports zero size for the first `not_ready_polls` checks.
    #[must_use]
    pub fn with_delayed_readiness(not_ready_polls: u32) -> (Self, SurfaceLog) {
        let log = SurfaceLog::default();
        (
            Self {
                log: log.clone(),
                not_ready_polls,
            },
            log,
        )
    }

    fn record(&self, op: SurfaceOp) {
        self.log.ops.lock().expect("surface log poisoned").push(op);
    }
}

impl MapSurface for RecordingSurface {
    fn viewport(&self) -> Option<(u32, u32)> {
        let polls = self.log.viewport_polls.fetch_add(1, Ordering::SeqCst);
        if polls < self.not_ready_polls {
            Some((0, 0))
        } else {
            Some((800, 600))
        }
    }

    fn set_marker(&mut self, kind: MarkerKind, at: LatLng) {
        self.record(SurfaceOp::Marker(kind, at));
    }

    fn draw_path(&mut self, kind: PathKind, path: &[LatLng]) {
        self.record(SurfaceOp::Path(kind, path.to_vec()));
    }

    fn fit_bounds(&mut self, a: LatLng, b: LatLng, padding_px: u32) {
        self.record(SurfaceOp::FitBounds(a, b, padding_px));
    }

    fn clear(&mut self) {
        self.record(SurfaceOp::Clear);
    }
}
