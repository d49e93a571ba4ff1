pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod poller;
pub mod recovery;
pub mod surface;
pub mod tracking;

pub use config::{BookingConfig, TrackingConfig};
pub use controller::{LifecycleController, LifecycleState};
pub use error::BookingError;
pub use events::{EventKind, LifecycleEvent, PollOutcome};
pub use surface::{MapSurface, MarkerKind, PathKind, RecordingSurface, SurfaceLog, TraceSurface};
