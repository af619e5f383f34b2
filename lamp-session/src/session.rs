//! LampSession - Main entry point for the SDK
//!
//! A `LampSession` owns the complete logical connection to one lamp: the
//! cached state, the connection phase machine, and the command queue. All
//! entry points a UI layer needs live here; everything device-facing goes
//! through the [`DeviceHandle`] the session was built with.
//!
//! Intents are non-blocking: they enqueue and return immediately, and the
//! device's confirmation arrives asynchronously through the state cache.
//! Intents issued while disconnected are silently dropped; callers that need
//! to distinguish "dropped" from "queued" check [`LampSession::is_connected`]
//! first.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use lamp_transport::{DeviceHandle, BRIGHTNESS_MAX, BRIGHTNESS_MIN};

use crate::command::{step_down, step_up, PendingCommand, SetRequest};
use crate::config::SessionConfig;
use crate::connection::LinkPhase;
use crate::error::{Result, SessionError};
use crate::queue::{CommandQueue, QueueStats};
use crate::state::{LampState, StateCache};

/// A persistent logical connection to a single lamp.
///
/// Cheap to clone; clones share the same session.
///
/// # Example
///
/// ```rust,ignore
/// use lamp_session::LampSession;
///
/// let session = LampSession::new(device);
/// session.connect().await?;
///
/// session.toggle();
/// let shown = session.increase_brightness(2); // optimistic, returns immediately
/// println!("brightness: {}%", shown / 10);
/// ```
///
/// Entry points must be called from within a tokio runtime: queue drains run
/// as spawned tasks.
#[derive(Clone)]
pub struct LampSession {
    inner: Arc<SessionInner>,
}

/// Shared session internals. One instance per logical session, shared by the
/// facade, the event task, the reconnect timer and queue drains.
pub(crate) struct SessionInner {
    pub(crate) device: Arc<dyn DeviceHandle>,
    pub(crate) config: SessionConfig,
    pub(crate) cache: StateCache,
    pub(crate) queue: CommandQueue,
    pub(crate) link: Mutex<LinkPhase>,
    /// One event task per session, however many times it reconnects.
    pub(crate) event_task_started: AtomicBool,
}

impl LampSession {
    /// Create a session over a device handle with default configuration.
    pub fn new(device: Arc<dyn DeviceHandle>) -> Self {
        Self::with_config(device, SessionConfig::default())
    }

    pub fn with_config(device: Arc<dyn DeviceHandle>, config: SessionConfig) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                device,
                config,
                cache: StateCache::new(),
                queue: CommandQueue::new(),
                link: Mutex::new(LinkPhase::Disconnected),
                event_task_started: AtomicBool::new(false),
            }),
        }
    }

    // ========================================================================
    // Connection
    // ========================================================================

    /// Discover the device and establish a session.
    ///
    /// On failure the error is returned and nothing is retried; only
    /// disconnects of an established session trigger the automatic
    /// reconnect timer.
    pub async fn connect(&self) -> Result<()> {
        self.inner.establish().await
    }

    /// Whether the transport session is currently live.
    pub fn is_connected(&self) -> bool {
        self.inner.cache.get().connected
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Snapshot of the cached lamp state.
    pub fn state(&self) -> LampState {
        self.inner.cache.get()
    }

    /// Subscribe to cached-state changes (push refreshes, optimistic
    /// updates, connection transitions).
    pub fn changes(&self) -> watch::Receiver<LampState> {
        self.inner.cache.changes()
    }

    /// Last known power state.
    pub fn is_turned_on(&self) -> bool {
        self.inner.cache.get().is_on
    }

    /// Last known (or optimistically targeted) brightness in device units.
    pub fn brightness(&self) -> u32 {
        self.inner.cache.get().brightness
    }

    /// Current queue occupancy.
    pub fn queue_stats(&self) -> QueueStats {
        self.inner.queue.stats()
    }

    // ========================================================================
    // Intents
    // ========================================================================

    /// Toggle power based on the cached state.
    ///
    /// The decision uses the cached `is_on`, which only changes on device
    /// push refreshes. A second toggle issued before the device reports the
    /// first one therefore repeats the same transition; this mirrors the
    /// device's own app behavior and is intentional.
    pub fn toggle(&self) {
        let state = self.inner.cache.get();
        if !state.connected {
            tracing::debug!("Toggle ignored: device disconnected");
            return;
        }

        let target = !state.is_on;
        tracing::debug!(target, "Toggling power");
        self.inner.enqueue_and_drain(PendingCommand::power(target));
    }

    /// Step brightness up by `ticks` (10 device units each).
    ///
    /// Updates the cache optimistically and returns the new value so a UI
    /// can render without waiting for confirmation. Clamped to [10, 1000].
    /// While disconnected, returns the cached value unchanged.
    pub fn increase_brightness(&self, ticks: u32) -> u32 {
        self.adjust_brightness(ticks, step_up)
    }

    /// Step brightness down by `ticks` (10 device units each).
    ///
    /// Same contract as [`increase_brightness`](Self::increase_brightness).
    pub fn decrease_brightness(&self, ticks: u32) -> u32 {
        self.adjust_brightness(ticks, step_down)
    }

    fn adjust_brightness(&self, ticks: u32, step: fn(u32, u32) -> u32) -> u32 {
        let state = self.inner.cache.get();
        if !state.connected {
            tracing::debug!("Brightness adjustment ignored: device disconnected");
            return state.brightness;
        }

        let target = step(state.brightness, ticks);
        tracing::debug!(from = state.brightness, target, "Adjusting brightness");

        // Optimistic: the UI sees the target now, the device catches up.
        self.inner.cache.set_brightness(target);
        self.inner
            .enqueue_and_drain(PendingCommand::brightness(target, false));
        target
    }

    /// Set brightness to an explicit level in device units.
    ///
    /// Rejects levels outside [1, 1000] without touching the queue. Unlike
    /// the tick-based path, the cache is updated only once the device
    /// confirms the write. Silently dropped while disconnected.
    pub fn set_brightness(&self, level: u32) -> Result<()> {
        if !(BRIGHTNESS_MIN..=BRIGHTNESS_MAX).contains(&level) {
            return Err(SessionError::InvalidBrightness(level));
        }

        if !self.inner.cache.get().connected {
            tracing::debug!(level, "Brightness set ignored: device disconnected");
            return Ok(());
        }

        tracing::debug!(level, "Setting brightness");
        self.inner
            .enqueue_and_drain(PendingCommand::brightness(level, true));
        Ok(())
    }
}

impl SessionInner {
    /// Append a command and kick the drain. Speculative drains are cheap:
    /// they bail out when disconnected, empty, or already executing.
    pub(crate) fn enqueue_and_drain(self: &Arc<Self>, command: PendingCommand) {
        let superseded = self.queue.enqueue(command);
        if superseded > 0 {
            tracing::debug!(superseded, "Coalesced queued brightness commands");
        }
        self.spawn_drain();
    }

    pub(crate) fn spawn_drain(self: &Arc<Self>) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            inner.drain().await;
        });
    }

    /// Execute queued commands one at a time until the queue is empty, a
    /// command is already in flight, or the session disconnects.
    ///
    /// The in-flight slot in the queue is the mutual-exclusion gate for all
    /// device writes: whichever drain claims a command via `begin_next` runs
    /// it to completion, every other drain observes the occupied slot and
    /// returns. Failed commands are logged and dropped, never requeued.
    async fn drain(&self) {
        loop {
            if !self.cache.get().connected {
                return;
            }

            let Some(command) = self.queue.begin_next() else {
                return;
            };

            let (property, value) = command.write();
            tracing::debug!(%property, "Executing command");

            match self.device.set(property, value).await {
                Ok(()) => {
                    if let SetRequest::Brightness {
                        level,
                        confirm: true,
                    } = command.request
                    {
                        self.cache.set_brightness(level);
                    }
                }
                Err(e) => {
                    let e = SessionError::CommandExecution(e);
                    tracing::warn!("{}", e);
                }
            }

            self.queue.finish();
        }
    }
}
