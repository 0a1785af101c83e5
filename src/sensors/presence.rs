//! Part-presence sensor at the station inlet.
//!
//! NPN proximity switch, open collector, wired to a pulled-up GPIO.  The
//! output sinks to LOW while a part is in front of the sensor.  Raw levels
//! pass through a [`Debouncer`] before the state machine sees them.

use embedded_hal::digital::InputPin;

use crate::drivers::debounce::Debouncer;
use crate::error::SensorError;

pub struct PresenceSensor<P: InputPin> {
    pin: P,
    debouncer: Debouncer,
}

impl<P: InputPin> PresenceSensor<P> {
    /// Start in the "clear" state; a part already present at boot is
    /// reported once the settle interval has elapsed.
    pub fn new(pin: P, debounce_ms: u32) -> Self {
        Self {
            pin,
            debouncer: Debouncer::new(debounce_ms, false),
        }
    }

    /// Sample the pin and return the debounced presence.
    pub fn read(&mut self, now_ms: u64) -> Result<bool, SensorError> {
        let raw_present = self
            .pin
            .is_low()
            .map_err(|_| SensorError::GpioReadFailed)?;
        if let Some(present) = self.debouncer.update(raw_present, now_ms) {
            log::debug!("Presence sensor settled: {}", present);
        }
        Ok(self.debouncer.stable())
    }
}
