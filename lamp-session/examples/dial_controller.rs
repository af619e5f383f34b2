//! Drives a lamp session the way a physical dial controller would:
//! rotation steps brightness, pressing the dial toggles power, and a tap
//! jumps straight to a preset level.
//!
//! Runs against the in-memory mock device so it works without hardware:
//!
//! ```bash
//! cargo run --example dial_controller
//! ```

use std::sync::Arc;
use std::time::Duration;

use lamp_session::{DeviceHandle, LampSession, LoggingMode, StateRefresh};
use lamp_transport::MockDevice;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    lamp_session::init_logging(LoggingMode::Development)?;

    let device = Arc::new(MockDevice::new());
    device.script_connect(Ok(Some(StateRefresh::full(true, 500))));

    let session = LampSession::new(Arc::clone(&device) as Arc<dyn DeviceHandle>);
    session.connect().await?;
    println!("Connected. {}", describe(&session));

    // Watch state changes in the background, like a display would.
    let mut changes = session.changes();
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let state = *changes.borrow_and_update();
            println!(
                "  [display] power={} brightness={} connected={}",
                state.is_on, state.brightness, state.connected
            );
        }
    });

    // Rotate the dial clockwise a few detents.
    println!("Rotating dial +3 ticks");
    let target = session.increase_brightness(3);
    println!("  optimistic target: {}", target);
    settle().await;

    // Rotate back.
    println!("Rotating dial -5 ticks");
    session.decrease_brightness(5);
    settle().await;

    // Tap the touchscreen: jump to a preset.
    println!("Tap: preset 800");
    session.set_brightness(800)?;
    settle().await;

    // Press the dial: toggle power. The cached power state only changes
    // once the device pushes a refresh, so simulate that ack too.
    println!("Pressing dial (toggle off)");
    session.toggle();
    settle().await;
    device.push_refresh(StateRefresh {
        power: Some(false),
        brightness: None,
    });
    settle().await;

    println!("Done. {}", describe(&session));
    println!("Device received {} commands:", device.set_calls().len());
    for (property, value) in device.set_calls() {
        println!("  set {} = {:?}", property, value);
    }

    Ok(())
}

fn describe(session: &LampSession) -> String {
    let state = session.state();
    format!(
        "power={} brightness={} connected={}",
        state.is_on, state.brightness, state.connected
    )
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}
