//! Error types for the transport boundary

use thiserror::Error;

use crate::property::PropertyId;

/// Errors a transport implementation can surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Device discovery found no matching device.
    #[error("Device not found on the network")]
    NotFound,

    /// Session establishment failed.
    #[error("Failed to connect to device: {0}")]
    ConnectFailed(String),

    /// An operation that requires a live session was attempted without one.
    #[error("No active session with the device")]
    NotConnected,

    /// A `set` call failed mid-flight.
    #[error("Failed to set {property}: {reason}")]
    SetFailed {
        property: PropertyId,
        reason: String,
    },

    /// The event stream was dropped by the transport.
    #[error("Device event channel has been closed")]
    ChannelClosed,
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
