//! Pneumatic cylinder driver (5/2 solenoid valve via MOSFET, active HIGH).
//!
//! Energising the valve extends the cylinder; de-energising vents it and the
//! spring return retracts it.  There is no position feedback; the service
//! remembers the last level each valve accepted.
//!
//! ## Safety contract
//!
//! The driver is a dumb actuator.  Interlocks (all valves off in `Lowering`
//! and `Error`) are enforced by the state machine.

use embedded_hal::digital::OutputPin;

use crate::error::ActuatorError;
use crate::fsm::context::Actuator;

pub struct Cylinder<P: OutputPin> {
    which: Actuator,
    pin: P,
}

impl<P: OutputPin> Cylinder<P> {
    /// Wrap a valve pin.  The pin is not driven until the first `set`.
    pub fn new(which: Actuator, pin: P) -> Self {
        Self { which, pin }
    }

    /// Energise (`true`) or vent (`false`) the valve.
    pub fn set(&mut self, extend: bool) -> Result<(), ActuatorError> {
        let result = if extend {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|_| ActuatorError::GpioWriteFailed(self.which))
    }
}
