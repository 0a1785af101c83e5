//! Task watchdog for the control loop.
//!
//! If the loop stops feeding it, the chip resets. Valve outputs come up low
//! after reset, so a hung loop always ends with every cylinder vented.

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::{
    esp, esp_task_wdt_add, esp_task_wdt_config_t, esp_task_wdt_reconfigure, esp_task_wdt_reset,
};

use crate::error::Error;

/// Default stall limit, well above the 10 ms control period.
pub const WATCHDOG_TIMEOUT_MS: u32 = 5_000;

/// Held by the control loop; only [`Watchdog::arm`] builds one.
pub struct Watchdog {
    _armed: (),
}

impl Watchdog {
    /// Reconfigure the TWDT and subscribe the calling task.
    pub fn arm(timeout_ms: u32) -> Result<Self, Error> {
        if timeout_ms == 0 {
            return Err(Error::Init("watchdog timeout must be > 0"));
        }

        #[cfg(feature = "espidf")]
        {
            let cfg = esp_task_wdt_config_t {
                timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            // SAFETY: the config outlives the call; IDF copies it.
            if let Err(e) = esp!(unsafe { esp_task_wdt_reconfigure(&cfg) }) {
                log::warn!("Watchdog: reconfigure failed ({}), keeping boot settings", e);
            }
            // SAFETY: a null handle subscribes the calling task.
            esp!(unsafe { esp_task_wdt_add(core::ptr::null_mut()) }).map_err(|e| {
                log::error!("Watchdog: subscribe failed ({})", e);
                Error::Init("watchdog subscribe failed")
            })?;
            log::info!("Watchdog: armed, {}ms, panic on trigger", timeout_ms);
        }

        #[cfg(not(feature = "espidf"))]
        log::debug!("Watchdog(sim): {}ms, no-op", timeout_ms);

        Ok(Self { _armed: () })
    }

    /// Reset the countdown for the calling task.
    pub fn feed(&self) {
        #[cfg(feature = "espidf")]
        // SAFETY: only touches the calling task's TWDT entry, which `arm`
        // registered.
        unsafe {
            esp_task_wdt_reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(matches!(Watchdog::arm(0), Err(Error::Init(_))));
    }

    #[test]
    fn sim_watchdog_arms_and_feeds() {
        let wd = Watchdog::arm(WATCHDOG_TIMEOUT_MS).unwrap();
        wd.feed();
    }
}
