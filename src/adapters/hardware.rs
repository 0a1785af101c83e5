//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the presence sensor and the three cylinder drivers, exposing them
//! through [`SensorPort`] and [`ActuatorPort`].  Generic over
//! `embedded-hal` pins, so the same adapter runs on ESP-IDF GPIO drivers
//! and on host-side fakes.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::cylinder::Cylinder;
use crate::error::{ActuatorError, SensorError};
use crate::fsm::context::Actuator;
use crate::sensors::presence::PresenceSensor;

/// Concrete adapter that combines all station hardware behind port traits.
pub struct HardwareAdapter<S, O>
where
    S: InputPin,
    O: OutputPin,
{
    presence: PresenceSensor<S>,
    push: Cylinder<O>,
    riser: Cylinder<O>,
    ejection: Cylinder<O>,
}

impl<S, O> HardwareAdapter<S, O>
where
    S: InputPin,
    O: OutputPin,
{
    pub fn new(
        presence: PresenceSensor<S>,
        push: Cylinder<O>,
        riser: Cylinder<O>,
        ejection: Cylinder<O>,
    ) -> Self {
        Self {
            presence,
            push,
            riser,
            ejection,
        }
    }

    fn cylinder(&mut self, which: Actuator) -> &mut Cylinder<O> {
        match which {
            Actuator::Push => &mut self.push,
            Actuator::Riser => &mut self.riser,
            Actuator::Ejection => &mut self.ejection,
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<S: InputPin, O: OutputPin> SensorPort for HardwareAdapter<S, O> {
    fn is_object_present(&mut self, now_ms: u64) -> Result<bool, SensorError> {
        self.presence.read(now_ms)
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<S: InputPin, O: OutputPin> ActuatorPort for HardwareAdapter<S, O> {
    fn set_actuator(&mut self, which: Actuator, on: bool) -> Result<(), ActuatorError> {
        self.cylinder(which).set(on)
    }
}
