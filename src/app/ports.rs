//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ RouterService (domain)
//! ```
//!
//! Driven adapters (presence sensor, cylinder valves, event sinks, host link,
//! storage) implement these traits.  The
//! [`RouterService`](super::service::RouterService) consumes them via
//! generics, so the domain core never touches hardware directly.

use crate::error::{ActuatorError, SensorError};
use crate::fsm::context::Actuator;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this once per tick.
pub trait SensorPort {
    /// Debounced part-presence reading.  `now_ms` drives the settle timer.
    fn is_object_present(&mut self, now_ms: u64) -> Result<bool, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command the cylinder valves.
pub trait ActuatorPort {
    /// Energise (`on == true`) or vent one cylinder.
    fn set_actuator(&mut self, which: Actuator, on: bool) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / host link)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (log, serial line).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

/// Fan one event out to two sinks, in order.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &super::events::AppEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

// ───────────────────────────────────────────────────────────────
// Host link (driven adapter: domain → serial)
// ───────────────────────────────────────────────────────────────

/// Raw outbound line to the analysis controller.  The implementation
/// appends the line terminator.
pub trait HostLink {
    fn send_line(&mut self, line: &str);
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.  Only the boot counter lives here.
///
/// Keys are namespaced to prevent collisions between subsystems.  Writes
/// must be atomic; the ESP-IDF NVS API guarantees this natively.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Stored bytes could not be decoded.
    Corrupted,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::Corrupted => write!(f, "stored value corrupted"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
