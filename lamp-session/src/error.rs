//! Error types for lamp sessions

use thiserror::Error;

use lamp_transport::{TransportError, BRIGHTNESS_MAX, BRIGHTNESS_MIN};

/// Errors that can occur while driving a lamp session.
///
/// None of these are fatal to the session: a connection error leaves the
/// session disconnected (and recoverable by calling `connect` again), a
/// validation error leaves the queue untouched, and a command execution
/// failure drops only the failed command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Discovery or session establishment failed.
    ///
    /// Surfaced to the caller of `connect`; initial connect failures are not
    /// retried automatically (only disconnects of a live session are).
    #[error("Error connecting to device: {0}")]
    Connection(TransportError),

    /// An explicit brightness target outside the device range.
    #[error("Brightness level must be between {BRIGHTNESS_MIN} and {BRIGHTNESS_MAX}, got {0}")]
    InvalidBrightness(u32),

    /// A device write failed while in flight.
    ///
    /// Never surfaced to intent callers: the queue logs the failure and moves
    /// on to the next command.
    #[error("Error executing command: {0}")]
    CommandExecution(TransportError),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
