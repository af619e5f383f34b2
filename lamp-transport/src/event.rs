//! Push-notification events delivered by the device
//!
//! The lamp reports state changes unsolicited whenever its state moves outside
//! of a command issued through this SDK (a physical switch, another app).
//! Refresh payloads are partial: a field that did not change is simply absent.

use serde::{Deserialize, Serialize};

/// A partial state snapshot pushed by the device.
///
/// Fields set to `None` were not present in the notification and must leave
/// the corresponding cached value untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRefresh {
    /// Power state, if reported.
    pub power: Option<bool>,
    /// Brightness in device units (1-1000), if reported.
    pub brightness: Option<u32>,
}

impl StateRefresh {
    /// A refresh carrying no fields. Applying it is a no-op.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A refresh carrying both fields.
    pub fn full(power: bool, brightness: u32) -> Self {
        Self {
            power: Some(power),
            brightness: Some(brightness),
        }
    }

    /// Whether the refresh carries any field at all.
    pub fn is_empty(&self) -> bool {
        self.power.is_none() && self.brightness.is_none()
    }
}

/// An item on the device's push-notification stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The device reported a (partial) state refresh.
    Refresh(StateRefresh),
    /// The transport session dropped.
    Disconnected,
}
