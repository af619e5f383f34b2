//! Known device properties and their wire identifiers
//!
//! Tuya devices address state through numbered data points. The lamp exposes
//! two that this SDK controls: power (data point 20) and brightness
//! (data point 22, in device units 1-1000).

use serde::{Deserialize, Serialize};

/// Lowest brightness value the device accepts, in device units.
pub const BRIGHTNESS_MIN: u32 = 1;

/// Highest brightness value the device accepts, in device units.
pub const BRIGHTNESS_MAX: u32 = 1000;

/// A controllable lamp property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyId {
    /// Power state (on/off).
    Power,
    /// Brightness in device units (1-1000). UI layers typically divide by 10
    /// to display a percentage.
    Brightness,
}

impl PropertyId {
    /// The Tuya data-point code this property maps to on the wire.
    pub fn code(&self) -> u8 {
        match self {
            PropertyId::Power => 20,
            PropertyId::Brightness => 22,
        }
    }
}

impl std::fmt::Display for PropertyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyId::Power => write!(f, "power"),
            PropertyId::Brightness => write!(f, "brightness"),
        }
    }
}

/// A value for a [`PropertyId`] in a `set` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    Integer(u32),
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        PropertyValue::Integer(value)
    }
}
