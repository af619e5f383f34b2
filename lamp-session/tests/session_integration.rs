//! Integration tests for the lamp session core.
//!
//! These tests drive a `LampSession` end-to-end over a scripted `MockDevice`:
//! - connection establishment, passive sync, and reconnection
//! - single-flight execution and brightness coalescing
//! - intent behavior while disconnected
//!
//! Reconnect-timer tests run with paused time (`start_paused`) so interval
//! arithmetic is deterministic.

use std::sync::Arc;
use std::time::Duration;

use lamp_session::{
    DeviceHandle, LampSession, PropertyId, PropertyValue, QueueStats, SessionError, StateRefresh,
};
use lamp_transport::MockDevice;

// ============================================================================
// Test Helpers
// ============================================================================

fn session_over(device: &Arc<MockDevice>) -> LampSession {
    LampSession::new(Arc::clone(device) as Arc<dyn DeviceHandle>)
}

/// Let spawned tasks run without advancing virtual time.
async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

/// Poll until `condition` holds.
async fn wait_for<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Advance paused time across `n` reconnect intervals (5 s default each),
/// letting the attempt run after every tick.
async fn advance_intervals(n: u32) {
    for _ in 0..n {
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
    }
}

// ============================================================================
// Connection & passive sync
// ============================================================================

#[tokio::test]
async fn test_passive_sync_without_round_trip() {
    let device = Arc::new(MockDevice::new());
    device.script_connect(Ok(Some(StateRefresh::full(true, 300))));

    let session = session_over(&device);
    session.connect().await.unwrap();

    // Handshake snapshot seeded the cache; no command was ever sent.
    assert!(session.is_connected());
    assert!(session.is_turned_on());
    assert_eq!(session.brightness(), 300);
    assert!(device.set_calls().is_empty());

    // Partial push refresh: only the reported field changes.
    device.push_refresh(StateRefresh {
        power: Some(false),
        brightness: None,
    });
    wait_for(|| !session.is_turned_on()).await;
    assert_eq!(session.brightness(), 300);
    assert!(device.set_calls().is_empty());
}

#[tokio::test]
async fn test_connect_without_snapshot_keeps_prior_cache() {
    let device = Arc::new(MockDevice::new());
    let session = session_over(&device);

    session.connect().await.unwrap();

    let state = session.state();
    assert!(state.connected);
    assert!(!state.is_on);
    assert_eq!(state.brightness, 1);
}

#[tokio::test(start_paused = true)]
async fn test_initial_connect_failure_surfaces_and_is_not_retried() {
    let device = Arc::new(MockDevice::new());
    device.script_connect_failures(1);

    let session = session_over(&device);
    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, SessionError::Connection(_)));
    assert!(!session.is_connected());

    // No timer for initial failures: retrying is the caller's job.
    advance_intervals(4).await;
    assert_eq!(device.connect_calls(), 1);
    assert_eq!(device.find_calls(), 1);
}

// ============================================================================
// Reconnection
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_disconnect_triggers_unbounded_retry_until_success() {
    let device = Arc::new(MockDevice::new());
    let session = session_over(&device);
    session.connect().await.unwrap();
    assert_eq!(device.connect_calls(), 1);

    device.script_connect_failures(2);
    device.push_disconnected();
    settle().await;
    assert!(!session.is_connected());

    // Two failing ticks, then a successful one.
    advance_intervals(3).await;
    assert!(session.is_connected());
    assert_eq!(device.connect_calls(), 4);

    // Timer is gone after success.
    advance_intervals(3).await;
    assert_eq!(device.connect_calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_multiple_disconnect_events_share_one_timer() {
    let device = Arc::new(MockDevice::new());
    let session = session_over(&device);
    session.connect().await.unwrap();

    device.script_connect_failures(100);
    device.push_disconnected();
    device.push_disconnected();
    device.push_disconnected();
    settle().await;
    assert!(!session.is_connected());

    // One attempt per interval, however many disconnect events fired.
    advance_intervals(4).await;
    assert_eq!(device.connect_calls(), 1 + 4);
}

#[tokio::test(start_paused = true)]
async fn test_manual_reconnect_cancels_pending_timer() {
    let device = Arc::new(MockDevice::new());
    let session = session_over(&device);
    session.connect().await.unwrap();

    device.push_disconnected();
    settle().await;
    assert!(!session.is_connected());

    // Reconnect by hand before the first tick fires.
    session.connect().await.unwrap();
    assert!(session.is_connected());
    assert_eq!(device.connect_calls(), 2);

    advance_intervals(4).await;
    assert_eq!(device.connect_calls(), 2);
}

// ============================================================================
// Intents while disconnected
// ============================================================================

#[tokio::test]
async fn test_intents_silently_dropped_while_disconnected() {
    let device = Arc::new(MockDevice::new());
    let session = session_over(&device);

    session.toggle();
    assert_eq!(session.increase_brightness(3), 1);
    assert_eq!(session.decrease_brightness(3), 1);
    assert!(session.set_brightness(500).is_ok());
    settle().await;

    assert_eq!(
        session.queue_stats(),
        QueueStats {
            pending: 0,
            in_flight: false
        }
    );
    assert!(device.set_calls().is_empty());
}

// ============================================================================
// Brightness validation & confirmation
// ============================================================================

#[tokio::test]
async fn test_set_brightness_validates_range() {
    let device = Arc::new(MockDevice::new());
    let session = session_over(&device);
    session.connect().await.unwrap();
    device.hold_sets();

    assert_eq!(
        session.set_brightness(0),
        Err(SessionError::InvalidBrightness(0))
    );
    assert_eq!(
        session.set_brightness(1001),
        Err(SessionError::InvalidBrightness(1001))
    );
    assert_eq!(session.queue_stats().pending, 0);
    assert!(device.set_calls().is_empty());

    // A valid target enqueues exactly one command.
    session.set_brightness(500).unwrap();
    wait_for(|| session.queue_stats().in_flight).await;
    assert_eq!(session.queue_stats().pending, 0);
    assert_eq!(
        device.set_calls(),
        vec![(PropertyId::Brightness, PropertyValue::Integer(500))]
    );

    // Explicit sets are confirmed, not optimistic.
    assert_eq!(session.brightness(), 1);

    // Another invalid call leaves the occupied queue untouched.
    assert!(session.set_brightness(5000).is_err());
    assert_eq!(session.queue_stats().pending, 0);

    device.release_all_sets();
    wait_for(|| !session.queue_stats().in_flight).await;
    assert_eq!(session.brightness(), 500);
}

#[tokio::test]
async fn test_tick_adjustments_are_optimistic() {
    let device = Arc::new(MockDevice::new());
    device.script_connect(Ok(Some(StateRefresh::full(true, 500))));

    let session = session_over(&device);
    session.connect().await.unwrap();
    device.hold_sets();

    // The returned value is visible immediately, before any device ack.
    assert_eq!(session.increase_brightness(2), 520);
    assert_eq!(session.brightness(), 520);
    wait_for(|| session.queue_stats().in_flight).await;

    assert_eq!(session.decrease_brightness(1), 510);
    assert_eq!(session.brightness(), 510);

    device.release_all_sets();
    wait_for(|| {
        let stats = session.queue_stats();
        stats.pending == 0 && !stats.in_flight
    })
    .await;

    assert_eq!(
        device.set_calls(),
        vec![
            (PropertyId::Brightness, PropertyValue::Integer(520)),
            (PropertyId::Brightness, PropertyValue::Integer(510)),
        ]
    );
}

// ============================================================================
// Coalescing & single-flight
// ============================================================================

#[tokio::test]
async fn test_rapid_brightness_targets_coalesce_to_newest() {
    let device = Arc::new(MockDevice::new());
    let session = session_over(&device);
    session.connect().await.unwrap();
    device.hold_sets();

    session.set_brightness(100).unwrap();
    wait_for(|| session.queue_stats().in_flight).await;

    // Two targets queued behind the in-flight command: only the newest
    // survives; the in-flight command is untouched.
    session.set_brightness(200).unwrap();
    session.set_brightness(400).unwrap();
    assert_eq!(
        session.queue_stats(),
        QueueStats {
            pending: 1,
            in_flight: true
        }
    );

    device.release_all_sets();
    wait_for(|| {
        let stats = session.queue_stats();
        stats.pending == 0 && !stats.in_flight
    })
    .await;

    // 100 ran to completion, 200 was superseded before it started.
    assert_eq!(
        device.set_calls(),
        vec![
            (PropertyId::Brightness, PropertyValue::Integer(100)),
            (PropertyId::Brightness, PropertyValue::Integer(400)),
        ]
    );
    assert_eq!(session.brightness(), 400);
}

#[tokio::test]
async fn test_double_toggle_repeats_stale_transition() {
    let device = Arc::new(MockDevice::new());
    device.script_connect(Ok(Some(StateRefresh::full(true, 300))));

    let session = session_over(&device);
    session.connect().await.unwrap();
    device.hold_sets();

    // Both toggles decide from the cached `is_on`, which only a push
    // refresh updates: both command the same transition. Preserved from
    // the device's own app behavior.
    session.toggle();
    wait_for(|| session.queue_stats().in_flight).await;
    session.toggle();

    device.release_all_sets();
    wait_for(|| {
        let stats = session.queue_stats();
        stats.pending == 0 && !stats.in_flight
    })
    .await;

    assert_eq!(
        device.set_calls(),
        vec![
            (PropertyId::Power, PropertyValue::Bool(false)),
            (PropertyId::Power, PropertyValue::Bool(false)),
        ]
    );
    assert!(session.is_turned_on());

    // Once the device reports the new state, toggling flips direction.
    device.push_refresh(StateRefresh {
        power: Some(false),
        brightness: None,
    });
    wait_for(|| !session.is_turned_on()).await;

    session.toggle();
    wait_for(|| device.set_calls().len() == 3).await;
    assert_eq!(
        device.set_calls()[2],
        (PropertyId::Power, PropertyValue::Bool(true))
    );
}

#[tokio::test]
async fn test_failed_command_is_dropped_and_queue_advances() {
    let device = Arc::new(MockDevice::new());
    let session = session_over(&device);
    session.connect().await.unwrap();

    device.script_set(Err(lamp_session::TransportError::SetFailed {
        property: PropertyId::Power,
        reason: "session dropped".to_string(),
    }));

    session.toggle();
    wait_for(|| {
        device.set_calls().len() == 1 && !session.queue_stats().in_flight
    })
    .await;

    // The failure was dropped, not retried; the next command runs normally.
    session.set_brightness(300).unwrap();
    wait_for(|| device.set_calls().len() == 2 && !session.queue_stats().in_flight).await;

    assert_eq!(session.queue_stats().pending, 0);
    assert_eq!(session.brightness(), 300);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_flight_under_interleaved_intents() {
    let device = Arc::new(MockDevice::new());
    device.script_connect(Ok(Some(StateRefresh::full(true, 500))));

    let session = session_over(&device);
    session.connect().await.unwrap();
    device.hold_sets();

    let mut workers = Vec::new();
    for worker in 0..8u32 {
        let session = session.clone();
        workers.push(tokio::spawn(async move {
            for i in 0..50u32 {
                match (worker + i) % 4 {
                    0 => session.toggle(),
                    1 => {
                        session.increase_brightness(1);
                    }
                    2 => {
                        session.decrease_brightness(2);
                    }
                    _ => {
                        let level = 10 + (worker * 50 + i) % 991;
                        session.set_brightness(level).unwrap();
                    }
                }
                if i % 7 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        }));
    }
    for worker in workers {
        worker.await.unwrap();
    }

    // Feed the held queue until it runs dry.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        device.release_set();
        tokio::task::yield_now().await;

        let stats = session.queue_stats();
        if stats.pending == 0 && !stats.in_flight {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "queue did not drain"
        );
    }

    assert_eq!(device.max_concurrent_sets(), 1);
    assert!((10..=1000).contains(&session.brightness()));
}

// ============================================================================
// Queue behavior across disconnects
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_stranded_commands_drain_after_reconnect() {
    let device = Arc::new(MockDevice::new());
    device.script_connect(Ok(Some(StateRefresh::full(true, 300))));

    let session = session_over(&device);
    session.connect().await.unwrap();
    device.hold_sets();

    session.toggle();
    wait_for(|| session.queue_stats().in_flight).await;
    session.set_brightness(500).unwrap();
    assert_eq!(session.queue_stats().pending, 1);

    device.push_disconnected();
    settle().await;
    assert!(!session.is_connected());

    // The in-flight command runs to completion; the pending one is stranded
    // while disconnected.
    device.release_all_sets();
    wait_for(|| !session.queue_stats().in_flight).await;
    assert_eq!(session.queue_stats().pending, 1);

    // Reconnect self-heals the queue.
    advance_intervals(1).await;
    assert!(session.is_connected());
    wait_for(|| session.queue_stats().pending == 0 && !session.queue_stats().in_flight).await;

    let calls = device.set_calls();
    assert_eq!(
        calls.last(),
        Some(&(PropertyId::Brightness, PropertyValue::Integer(500)))
    );
    assert_eq!(session.brightness(), 500);
}
