//! Error types for the cadence core.
//!
//! None of these are fatal. A `SessionError` always means the command was
//! refused and the session kept its last valid state; callers log it and move
//! on. A `StorageError` means the session keeps running from memory.

use cadence_ipc::RunState;
use thiserror::Error;

/// Why a command had no effect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The command is not legal in the current run state.
    #[error("cannot {action} while {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: RunState,
    },

    /// The value would break a configuration invariant.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Index outside the phase list or history.
    #[error("index {index} out of range for {collection} (length: {len})")]
    OutOfRange {
        collection: &'static str,
        index: usize,
        len: usize,
    },
}

/// Failures of the key-value persistence adapter.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not determine a data directory")]
    NoDataDir,
}

/// Result type alias for SessionError
pub type Result<T, E = SessionError> = std::result::Result<T, E>;
