//! The device-handle capability trait
//!
//! A concrete transport (the real Tuya protocol client, or [`crate::MockDevice`]
//! in tests) implements [`DeviceHandle`]. Sessions depend only on this trait;
//! credentials, framing and encryption stay inside the implementation.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::event::{DeviceEvent, StateRefresh};
use crate::property::{PropertyId, PropertyValue};

/// Capability surface of a single stateful lamp.
///
/// Implementations must be thread-safe: a session shares the handle between
/// its connection task, reconnect timer and command executor.
///
/// # Example
///
/// ```rust,ignore
/// let device: Arc<dyn DeviceHandle> = Arc::new(TuyaTransport::new(config));
/// device.find().await?;
/// let snapshot = device.connect().await?;
/// device.set(PropertyId::Power, PropertyValue::Bool(true)).await?;
/// ```
#[async_trait]
pub trait DeviceHandle: Send + Sync {
    /// Locate the device on the network.
    async fn find(&self) -> Result<()>;

    /// Establish a session with the device.
    ///
    /// Returns the initial state snapshot when the device pushes one during
    /// the handshake; `None` when it does not.
    async fn connect(&self) -> Result<Option<StateRefresh>>;

    /// Write a single property value to the device.
    ///
    /// Resolves once the device acknowledges the write, or fails if the
    /// session drops mid-flight. No timeout is imposed here.
    async fn set(&self, property: PropertyId, value: PropertyValue) -> Result<()>;

    /// Subscribe to the device's push-notification stream.
    ///
    /// Each call returns a fresh receiver; events are fanned out to all
    /// live receivers.
    fn events(&self) -> broadcast::Receiver<DeviceEvent>;
}
