//! Actuator drivers and peripheral helpers.

pub mod cylinder;
pub mod debounce;
pub mod watchdog;
