//! Connection lifecycle: establishment, passive sync, reconnection
//!
//! One logical session moves through three phases:
//!
//! ```text
//! Disconnected ──connect()──▶ Connected ──disconnect event──▶ Reconnecting
//!      ▲                          ▲                                │
//!      └── (initial failures stay here)                            │
//!                                 └────── timer attempt succeeds ──┘
//! ```
//!
//! Entering `Reconnecting` is idempotent: however many disconnect events
//! fire, at most one reconnect timer exists. Initial `connect()` failures do
//! NOT start a timer; retrying those is the caller's call.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use lamp_transport::DeviceEvent;

use crate::error::{Result, SessionError};
use crate::session::SessionInner;

/// Connection state machine. The reconnect timer is owned by the
/// `Reconnecting` variant: it exists exactly while the phase says so.
pub(crate) enum LinkPhase {
    Disconnected,
    Reconnecting {
        /// Signals the timer task to stop when something else reconnects.
        shutdown_tx: mpsc::Sender<()>,
    },
    Connected,
}

impl SessionInner {
    /// Discover the device and establish a session.
    ///
    /// On success: seeds the cache from the handshake snapshot (when the
    /// device sent one), marks the session connected, starts the event task
    /// for this transport session, cancels any pending reconnect timer, and
    /// kicks the queue in case commands were stranded by a disconnect.
    pub(crate) async fn establish(self: &Arc<Self>) -> Result<()> {
        tracing::info!("Connecting to device...");

        self.device.find().await.map_err(SessionError::Connection)?;
        let snapshot = self
            .device
            .connect()
            .await
            .map_err(SessionError::Connection)?;

        // Subscribe before publishing the connected state so no refresh can
        // slip between the handshake and the event task.
        let events = self.device.events();

        if let Some(snapshot) = snapshot {
            tracing::debug!(?snapshot, "Seeding state from handshake snapshot");
            self.cache.apply_refresh(&snapshot);
        }
        self.cache.set_connected(true);
        self.enter_connected();

        // One long-lived event task per session: reconnects reuse it, since
        // the handle fans events out to the receiver it already holds.
        if self
            .event_task_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let inner = Arc::clone(self);
            tokio::spawn(async move {
                inner.run_event_task(events).await;
            });
        }

        tracing::info!("Device connected");
        self.spawn_drain();
        Ok(())
    }

    /// Transition to `Connected`, cancelling a pending reconnect timer.
    fn enter_connected(&self) {
        let previous = {
            let mut link = self.link.lock();
            std::mem::replace(&mut *link, LinkPhase::Connected)
        };

        if let LinkPhase::Reconnecting { shutdown_tx } = previous {
            // When the timer task itself reconnected this signals its own
            // channel, which it never reads again. Harmless.
            let _ = shutdown_tx.try_send(());
        }
    }

    /// React to a disconnect: mark the cache and enter `Reconnecting` unless
    /// a timer is already running.
    pub(crate) fn handle_disconnect(self: &Arc<Self>) {
        self.cache.set_connected(false);

        let mut link = self.link.lock();
        if matches!(*link, LinkPhase::Reconnecting { .. }) {
            tracing::debug!("Disconnect with reconnect timer already active");
            return;
        }

        tracing::info!(
            "Device disconnected, retrying every {:?}",
            self.config.reconnect_interval
        );

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            inner.run_reconnect_timer(shutdown_rx).await;
        });

        *link = LinkPhase::Reconnecting { shutdown_tx };
    }

    /// Consume push notifications for the life of the session.
    ///
    /// Disconnect events do not end the task: the reconnect machinery is
    /// idempotent and the same receiver keeps serving after a reconnect.
    /// The task ends only when the transport drops the stream for good.
    async fn run_event_task(self: Arc<Self>, mut events: broadcast::Receiver<DeviceEvent>) {
        tracing::debug!("Event task started");

        loop {
            match events.recv().await {
                Ok(DeviceEvent::Refresh(refresh)) => {
                    tracing::debug!(?refresh, "State refresh from device");
                    self.cache.apply_refresh(&refresh);
                }
                Ok(DeviceEvent::Disconnected) => {
                    self.handle_disconnect();
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event stream lagged, {} notifications skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::debug!("Event stream closed by transport");
                    self.handle_disconnect();
                    break;
                }
            }
        }

        self.event_task_started.store(false, Ordering::SeqCst);
        tracing::debug!("Event task stopped");
    }

    /// Fixed-interval reconnect attempts, unbounded, until one succeeds or
    /// the phase machine cancels the timer.
    async fn run_reconnect_timer(self: Arc<Self>, mut shutdown_rx: mpsc::Receiver<()>) {
        loop {
            tokio::select! {
                // Cancellation wins over a due tick, so a successful
                // reconnect never races an extra attempt.
                biased;
                _ = shutdown_rx.recv() => {
                    tracing::debug!("Reconnect timer cancelled");
                    break;
                }
                _ = tokio::time::sleep(self.config.reconnect_interval) => {
                    tracing::info!("Attempting to reconnect...");
                    match self.establish().await {
                        Ok(()) => break,
                        Err(e) => tracing::warn!("Reconnection attempt failed: {}", e),
                    }
                }
            }
        }
    }
}
