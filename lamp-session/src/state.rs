//! Cached lamp state with reactive watchers
//!
//! The cache is the session's read model: it holds the last known device
//! state, fed passively from push notifications and, for brightness, from
//! optimistic or confirmed command results. It is backed by a
//! `tokio::sync::watch` channel so callers can observe changes without
//! polling.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use lamp_transport::{StateRefresh, BRIGHTNESS_MAX, BRIGHTNESS_MIN};

/// Last known state of the lamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LampState {
    /// Last known power state.
    pub is_on: bool,
    /// Last known (or optimistically targeted) brightness, in device units
    /// (1-1000). UI layers divide by 10 for a percentage.
    pub brightness: u32,
    /// Whether the transport session is currently live.
    pub connected: bool,
}

impl Default for LampState {
    fn default() -> Self {
        Self {
            is_on: false,
            // Lowest valid device unit, so readers never observe an
            // out-of-range value before the first refresh arrives.
            brightness: BRIGHTNESS_MIN,
            connected: false,
        }
    }
}

/// Shared state cache with change notification.
pub(crate) struct StateCache {
    tx: watch::Sender<LampState>,
}

impl StateCache {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(LampState::default());
        Self { tx }
    }

    /// Current state snapshot.
    pub(crate) fn get(&self) -> LampState {
        *self.tx.borrow()
    }

    /// Subscribe to state changes.
    pub(crate) fn changes(&self) -> watch::Receiver<LampState> {
        self.tx.subscribe()
    }

    /// Apply a partial refresh from the device. Fields absent in the payload
    /// are left untouched; watchers are only notified when a value changed.
    pub(crate) fn apply_refresh(&self, refresh: &StateRefresh) {
        if refresh.is_empty() {
            return;
        }

        self.tx.send_if_modified(|state| {
            let mut changed = false;

            if let Some(power) = refresh.power {
                if state.is_on != power {
                    state.is_on = power;
                    changed = true;
                }
            }

            if let Some(brightness) = refresh.brightness {
                let brightness = brightness.clamp(BRIGHTNESS_MIN, BRIGHTNESS_MAX);
                if state.brightness != brightness {
                    state.brightness = brightness;
                    changed = true;
                }
            }

            changed
        });
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.tx.send_if_modified(|state| {
            if state.connected != connected {
                state.connected = connected;
                true
            } else {
                false
            }
        });
    }

    pub(crate) fn set_brightness(&self, brightness: u32) {
        self.tx.send_if_modified(|state| {
            if state.brightness != brightness {
                state.brightness = brightness;
                true
            } else {
                false
            }
        });
    }
}
