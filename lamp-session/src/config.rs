//! Configuration for lamp sessions

use std::time::Duration;

/// Configuration for a [`crate::LampSession`].
///
/// The defaults match the behavior of the device this SDK was written
/// against; most callers never need to change them.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Interval between reconnection attempts after a disconnect.
    /// Default: 5 seconds
    pub reconnect_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_interval: Duration::from_secs(5),
        }
    }
}
