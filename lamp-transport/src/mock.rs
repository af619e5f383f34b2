//! Scriptable in-memory device for tests
//!
//! `MockDevice` implements [`DeviceHandle`] without touching the network.
//! Tests script discovery/connect outcomes, hold `set` calls in flight to
//! exercise queue behavior, and push refresh/disconnect events on demand.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{broadcast, Semaphore};

use crate::error::{Result, TransportError};
use crate::event::{DeviceEvent, StateRefresh};
use crate::handle::DeviceHandle;
use crate::property::{PropertyId, PropertyValue};

const EVENT_BUFFER: usize = 64;

/// A scriptable mock lamp.
///
/// Unscripted calls succeed: `find` resolves, `connect` resolves with no
/// snapshot, `set` resolves immediately (unless sets are held).
///
/// # Example
///
/// ```rust,ignore
/// let device = Arc::new(MockDevice::new());
/// device.script_connect(Ok(Some(StateRefresh::full(true, 300))));
///
/// // ... session connects through the DeviceHandle trait ...
///
/// device.push_refresh(StateRefresh { power: Some(false), brightness: None });
/// device.push_disconnected();
/// assert_eq!(device.set_calls().len(), 0);
/// ```
pub struct MockDevice {
    find_script: Mutex<VecDeque<Result<()>>>,
    connect_script: Mutex<VecDeque<Result<Option<StateRefresh>>>>,
    set_script: Mutex<VecDeque<Result<()>>>,

    find_calls: AtomicUsize,
    connect_calls: AtomicUsize,
    set_calls: Mutex<Vec<(PropertyId, PropertyValue)>>,

    /// When true, `set` blocks until a permit is released.
    hold_sets: AtomicBool,
    set_gate: Semaphore,

    /// Concurrency accounting for single-flight assertions.
    sets_in_flight: AtomicUsize,
    max_sets_in_flight: AtomicUsize,

    events_tx: broadcast::Sender<DeviceEvent>,
}

impl MockDevice {
    pub fn new() -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);

        Self {
            find_script: Mutex::new(VecDeque::new()),
            connect_script: Mutex::new(VecDeque::new()),
            set_script: Mutex::new(VecDeque::new()),
            find_calls: AtomicUsize::new(0),
            connect_calls: AtomicUsize::new(0),
            set_calls: Mutex::new(Vec::new()),
            hold_sets: AtomicBool::new(false),
            set_gate: Semaphore::new(0),
            sets_in_flight: AtomicUsize::new(0),
            max_sets_in_flight: AtomicUsize::new(0),
            events_tx,
        }
    }

    // ========================================================================
    // Scripting
    // ========================================================================

    /// Queue an outcome for the next unscripted `find` call.
    pub fn script_find(&self, outcome: Result<()>) {
        self.find_script.lock().unwrap().push_back(outcome);
    }

    /// Queue an outcome for the next unscripted `connect` call.
    pub fn script_connect(&self, outcome: Result<Option<StateRefresh>>) {
        self.connect_script.lock().unwrap().push_back(outcome);
    }

    /// Queue `count` consecutive connect failures.
    pub fn script_connect_failures(&self, count: usize) {
        let mut script = self.connect_script.lock().unwrap();
        for _ in 0..count {
            script.push_back(Err(TransportError::ConnectFailed(
                "scripted failure".to_string(),
            )));
        }
    }

    /// Queue an outcome for the next unscripted `set` call.
    pub fn script_set(&self, outcome: Result<()>) {
        self.set_script.lock().unwrap().push_back(outcome);
    }

    /// Hold subsequent `set` calls in flight until released.
    pub fn hold_sets(&self) {
        self.hold_sets.store(true, Ordering::SeqCst);
    }

    /// Release one held `set` call.
    pub fn release_set(&self) {
        self.set_gate.add_permits(1);
    }

    /// Stop holding and release all waiting `set` calls.
    pub fn release_all_sets(&self) {
        self.hold_sets.store(false, Ordering::SeqCst);
        // More permits than any test will ever hold.
        self.set_gate.add_permits(1024);
    }

    // ========================================================================
    // Event injection
    // ========================================================================

    /// Emit a state-refresh push notification.
    pub fn push_refresh(&self, refresh: StateRefresh) {
        let _ = self.events_tx.send(DeviceEvent::Refresh(refresh));
    }

    /// Emit a disconnect notification.
    pub fn push_disconnected(&self) {
        let _ = self.events_tx.send(DeviceEvent::Disconnected);
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    /// All recorded `set` calls, in arrival order. Calls are recorded when
    /// they start, before any hold gate.
    pub fn set_calls(&self) -> Vec<(PropertyId, PropertyValue)> {
        self.set_calls.lock().unwrap().clone()
    }

    /// Highest number of `set` calls observed in flight at once.
    pub fn max_concurrent_sets(&self) -> usize {
        self.max_sets_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceHandle for MockDevice {
    async fn find(&self) -> Result<()> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.find_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn connect(&self) -> Result<Option<StateRefresh>> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.connect_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None))
    }

    async fn set(&self, property: PropertyId, value: PropertyValue) -> Result<()> {
        self.set_calls.lock().unwrap().push((property, value));

        let in_flight = self.sets_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_sets_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);

        if self.hold_sets.load(Ordering::SeqCst) {
            let permit = self
                .set_gate
                .acquire()
                .await
                .map_err(|_| TransportError::ChannelClosed);
            match permit {
                Ok(permit) => permit.forget(),
                Err(e) => {
                    self.sets_in_flight.fetch_sub(1, Ordering::SeqCst);
                    return Err(e);
                }
            }
        }

        self.sets_in_flight.fetch_sub(1, Ordering::SeqCst);

        self.set_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    fn events(&self) -> broadcast::Receiver<DeviceEvent> {
        self.events_tx.subscribe()
    }
}
