//! Unified error types for the router firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level loop's error handling uniform.  All variants are `Copy` so they
//! can be passed through the fault monitor and service without allocation.

use core::fmt;

use crate::config::ConfigError;
use crate::serial::command::CommandError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The presence sensor could not be read.
    Sensor(SensorError),
    /// A cylinder valve could not be driven.
    Actuator(ActuatorError),
    /// A latched hardware fault holds the station in `Error`.
    Fault(FaultKind),
    /// A host line could not be parsed.
    Command(CommandError),
    /// Settings failed validation.
    Config(ConfigError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Fault(e) => write!(f, "fault: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// GPIO read returned an error.
    GpioReadFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioReadFailed => write!(f, "GPIO read failed"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed on the named cylinder's valve pin.
    GpioWriteFailed(crate::fsm::context::Actuator),
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed(which) => write!(f, "GPIO write failed ({})", which.as_str()),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Hardware faults
// ---------------------------------------------------------------------------

/// Faults are accumulated in a bitfield by the fault monitor so that
/// simultaneous faults are tracked together.  Any set bit holds the router in
/// `Error` until the host clears it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultKind {
    /// Presence sensor GPIO read failed.
    SensorReadFailed = 0b0000_0001,
    /// A cylinder valve GPIO write failed.
    ActuatorWriteFailed = 0b0000_0010,
    /// Fault raised by an outside collaborator (e.g. air-pressure switch).
    External = 0b0000_0100,
}

impl FaultKind {
    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorReadFailed => write!(f, "sensor read failed"),
            Self::ActuatorWriteFailed => write!(f, "actuator write failed"),
            Self::External => write!(f, "external fault"),
        }
    }
}

impl From<FaultKind> for Error {
    fn from(e: FaultKind) -> Self {
        Self::Fault(e)
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
