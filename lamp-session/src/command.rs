//! Pending commands and brightness arithmetic

use lamp_transport::{PropertyId, PropertyValue, BRIGHTNESS_MAX};

/// Device units stepped per tick of a brightness adjustment.
pub(crate) const BRIGHTNESS_STEP: u32 = 10;

/// Floor for tick-based adjustments. Stricter than the hard validation floor
/// of 1 so a dial can never step the lamp fully dark.
pub(crate) const BRIGHTNESS_TICK_FLOOR: u32 = 10;

/// Which mutation a command performs. Coalescing is keyed on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommandKind {
    Power,
    Brightness,
}

/// The device write a pending command will perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SetRequest {
    Power(bool),
    Brightness {
        level: u32,
        /// Whether the cache is updated on device confirmation. Tick-based
        /// adjustments update the cache optimistically before enqueueing and
        /// set this to false; explicit sets confirm.
        confirm: bool,
    },
}

/// A queued device mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingCommand {
    pub(crate) request: SetRequest,
}

impl PendingCommand {
    pub(crate) fn power(on: bool) -> Self {
        Self {
            request: SetRequest::Power(on),
        }
    }

    pub(crate) fn brightness(level: u32, confirm: bool) -> Self {
        Self {
            request: SetRequest::Brightness { level, confirm },
        }
    }

    pub(crate) fn kind(&self) -> CommandKind {
        match self.request {
            SetRequest::Power(_) => CommandKind::Power,
            SetRequest::Brightness { .. } => CommandKind::Brightness,
        }
    }

    /// The property write this command issues.
    pub(crate) fn write(&self) -> (PropertyId, PropertyValue) {
        match self.request {
            SetRequest::Power(on) => (PropertyId::Power, PropertyValue::Bool(on)),
            SetRequest::Brightness { level, .. } => {
                (PropertyId::Brightness, PropertyValue::Integer(level))
            }
        }
    }
}

/// Step brightness up by `ticks`, clamped to the tick range.
pub(crate) fn step_up(current: u32, ticks: u32) -> u32 {
    current
        .saturating_add(BRIGHTNESS_STEP.saturating_mul(ticks))
        .clamp(BRIGHTNESS_TICK_FLOOR, BRIGHTNESS_MAX)
}

/// Step brightness down by `ticks`, clamped to the tick range.
pub(crate) fn step_down(current: u32, ticks: u32) -> u32 {
    current
        .saturating_sub(BRIGHTNESS_STEP.saturating_mul(ticks))
        .clamp(BRIGHTNESS_TICK_FLOOR, BRIGHTNESS_MAX)
}
