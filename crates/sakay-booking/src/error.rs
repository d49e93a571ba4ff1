use thiserror::Error;

use sakay_api::ApiError;

/// Errors surfaced to the caller of the lifecycle controller.
///
/// Only user-visible failures live here: validation problems and rejected
/// submissions. Transient poll errors and route-resolution failures are
/// recovered internally and never reach the caller.
#[derive(Debug, Error)]
pub enum BookingError {
    /// The request is missing a field required before submission. No
    /// network call was made.
    #[error("incomplete booking request: missing {0}")]
    IncompleteRequest(&'static str),

    /// The requested action is not legal in the current lifecycle state.
    #[error("cannot {action} while booking is {state}")]
    InvalidState {
        action: &'static str,
        state: String,
    },

    /// The server rejected the submission (or it failed in transit). The
    /// controller has already returned to `Pending`; the caller may retry
    /// `confirm`; nothing is retried automatically.
    #[error(transparent)]
    Submit(#[from] ApiError),
}
