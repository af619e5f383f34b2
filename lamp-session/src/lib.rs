//! Lamp session management
//!
//! A persistent logical connection to a single network-controlled lamp, with
//! all mutating commands serialized through a single-flight queue so
//! concurrent callers never race to change device state and transient
//! network failures never corrupt command order.
//!
//! # Features
//!
//! - **Connection lifecycle**: connect with caller-owned retry, automatic
//!   fixed-interval reconnection after disconnects
//! - **Passive sync**: device push notifications keep the cached state
//!   current without round trips
//! - **Single-flight queue**: at most one in-flight device write, FIFO
//!   ordering, rapid brightness adjustments coalesced to the newest target
//! - **Reactive state**: observe cached-state changes via `tokio::sync::watch`
//!
//! # Architecture
//!
//! ```text
//! UI intents → LampSession → CommandQueue → DeviceHandle.set
//!                  ▲                             │
//!              StateCache ◀── push refreshes ◀───┘
//! ```
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lamp_session::{LampSession, LoggingMode};
//!
//! lamp_session::init_logging(LoggingMode::Development)?;
//!
//! let session = LampSession::new(Arc::new(transport));
//! session.connect().await?;
//!
//! session.toggle();
//! let value = session.increase_brightness(1);
//! println!("brightness: {}%", value / 10);
//!
//! // React to confirmed changes
//! let mut changes = session.changes();
//! while changes.changed().await.is_ok() {
//!     let state = *changes.borrow();
//!     println!("on: {}, brightness: {}", state.is_on, state.brightness);
//! }
//! ```

mod command;
mod config;
mod connection;
mod queue;
mod session;
mod state;

// Error types
mod error;

// Logging infrastructure
pub mod logging;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use queue::QueueStats;
pub use session::LampSession;
pub use state::LampState;

pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};

// Transport boundary types callers interact with directly
pub use lamp_transport::{
    DeviceEvent, DeviceHandle, PropertyId, PropertyValue, StateRefresh, TransportError,
    BRIGHTNESS_MAX, BRIGHTNESS_MIN,
};
