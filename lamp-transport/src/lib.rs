//! Transport boundary for network-controlled Tuya lamps
//!
//! This crate defines the capability surface that `lamp-session` depends on:
//! the known device properties, the push-notification event types, and the
//! [`DeviceHandle`] trait that a concrete transport implements. The transport
//! internals (discovery protocol, session encryption, framing, addressing)
//! live behind the trait and are of no concern to callers.
//!
//! # Architecture
//!
//! ```text
//! LampSession → DeviceHandle (trait) → concrete transport
//!                    ↑
//!              DeviceEvent stream (broadcast)
//! ```
//!
//! # Testing
//!
//! Enable the `test-support` feature to get [`MockDevice`], a scriptable
//! in-memory implementation used by `lamp-session`'s integration tests.

pub mod error;
pub mod event;
pub mod handle;
pub mod property;

#[cfg(any(test, feature = "test-support"))]
pub mod mock;

pub use error::TransportError;
pub use event::{DeviceEvent, StateRefresh};
pub use handle::DeviceHandle;
pub use property::{PropertyId, PropertyValue, BRIGHTNESS_MAX, BRIGHTNESS_MIN};

#[cfg(any(test, feature = "test-support"))]
pub use mock::MockDevice;
