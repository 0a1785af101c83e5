//! Hardware fault monitor.
//!
//! The monitor accumulates a latched fault bitmask.  The service consults it
//! each tick: any set bit forces the FSM into `Error`, where every cylinder
//! is vented.
//!
//! ## Fault lifecycle
//!
//! 1. A GPIO read or write fails, or the host reports an outside fault.
//! 2. The monitor sets the corresponding bit.
//! 3. The service forces `Error`; `error_enter` closes all valves.
//! 4. The bit stays set.  There is no automatic recovery.
//! 5. The host `RESET` command clears every bit and the service forces `Idle`.
//!
//! Multiple simultaneous faults are tracked together.

use crate::error::FaultKind;
use log::{error, info};

/// Latched fault bitmask.
#[derive(Debug, Default)]
pub struct FaultMonitor {
    faults: u8,
}

impl FaultMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch a fault.  Returns `true` if the bit was newly set.
    pub fn raise(&mut self, fault: FaultKind) -> bool {
        if self.has_fault(fault) {
            return false;
        }
        error!("FAULT SET: {fault}");
        self.faults |= fault.mask();
        true
    }

    /// Clear every latched fault.
    pub fn clear_all(&mut self) {
        if self.faults != 0 {
            info!("FAULTS CLEARED: 0b{:08b}", self.faults);
        }
        self.faults = 0;
    }

    /// Current fault bitmask.
    pub fn faults(&self) -> u8 {
        self.faults
    }

    /// Check if a specific fault is active.
    pub fn has_fault(&self, fault: FaultKind) -> bool {
        self.faults & fault.mask() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faults_accumulate_and_latch() {
        let mut m = FaultMonitor::new();
        assert_eq!(m.faults(), 0);

        assert!(m.raise(FaultKind::SensorReadFailed));
        assert!(!m.raise(FaultKind::SensorReadFailed));
        assert!(m.raise(FaultKind::External));

        assert!(m.has_fault(FaultKind::SensorReadFailed));
        assert!(m.has_fault(FaultKind::External));
        assert!(!m.has_fault(FaultKind::ActuatorWriteFailed));
        assert_eq!(m.faults(), 0b101);
    }

    #[test]
    fn clear_all_drops_every_bit() {
        let mut m = FaultMonitor::new();
        m.raise(FaultKind::ActuatorWriteFailed);
        m.raise(FaultKind::External);
        m.clear_all();
        assert_eq!(m.faults(), 0);
        assert!(m.raise(FaultKind::External), "bits latch again after a clear");
    }
}
