pub mod store;

pub use store::{RecoverySnapshot, SessionStore};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
