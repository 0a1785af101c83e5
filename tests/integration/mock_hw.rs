//! Mock station hardware for integration tests.
//!
//! Records every valve write so tests can assert on the full command
//! history without touching real GPIO.  The presence reading is set
//! directly by the test; no debouncing happens here.

use sortrouter::app::events::AppEvent;
use sortrouter::app::ports::{ActuatorPort, EventSink, HostLink, SensorPort};
use sortrouter::error::{ActuatorError, SensorError};
use sortrouter::fsm::context::{Actuator, ActuatorState};

// ── MockHardware ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockHardware {
    pub present: bool,
    pub sensor_fails: bool,
    pub failing_valve: Option<Actuator>,
    pub writes: Vec<(Actuator, bool)>,
    /// Physical valve levels after the last successful writes.
    pub valves: ActuatorState,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self, which: Actuator) -> bool {
        self.valves.get(which)
    }
}

impl SensorPort for MockHardware {
    fn is_object_present(&mut self, _now_ms: u64) -> Result<bool, SensorError> {
        if self.sensor_fails {
            return Err(SensorError::GpioReadFailed);
        }
        Ok(self.present)
    }
}

impl ActuatorPort for MockHardware {
    fn set_actuator(&mut self, which: Actuator, on: bool) -> Result<(), ActuatorError> {
        if self.failing_valve == Some(which) {
            return Err(ActuatorError::GpioWriteFailed(which));
        }
        self.writes.push((which, on));
        self.valves.set(which, on);
        Ok(())
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct EventRecorder {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for EventRecorder {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Host link capture ─────────────────────────────────────────

#[derive(Default)]
pub struct CapturedLink {
    pub lines: Vec<String>,
}

impl HostLink for CapturedLink {
    fn send_line(&mut self, line: &str) {
        self.lines.push(line.to_owned());
    }
}
