//! Shared mutable context threaded through every FSM handler.
//!
//! `RouterContext` is the single struct that state handlers read from and
//! write to: the latest sensor reading, the actuator intent, timing, the
//! configuration, and the outbound notices produced by entry actions.

use serde::Serialize;

use crate::config::RouterConfig;

/// Maximum outbound notices queued between two drains by the service.
pub const NOTICE_QUEUE_CAP: usize = 4;

// ---------------------------------------------------------------------------
// Actuators
// ---------------------------------------------------------------------------

/// The three pneumatic cylinders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actuator {
    Push,
    Riser,
    Ejection,
}

impl Actuator {
    pub const ALL: [Actuator; 3] = [Self::Push, Self::Riser, Self::Ejection];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Riser => "riser",
            Self::Ejection => "ejection",
        }
    }
}

/// Last commanded level of each cylinder valve.
///
/// A cache of intent, not a read-back: the cylinders have no position
/// feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ActuatorState {
    pub push: bool,
    pub riser: bool,
    pub ejection: bool,
}

impl ActuatorState {
    /// All valves closed.
    pub fn all_off() -> Self {
        Self::default()
    }

    pub fn get(&self, which: Actuator) -> bool {
        match which {
            Actuator::Push => self.push,
            Actuator::Riser => self.riser,
            Actuator::Ejection => self.ejection,
        }
    }

    pub fn set(&mut self, which: Actuator, on: bool) {
        match which {
            Actuator::Push => self.push = on,
            Actuator::Riser => self.riser = on,
            Actuator::Ejection => self.ejection = on,
        }
    }

    pub fn any_on(&self) -> bool {
        self.push || self.riser || self.ejection
    }
}

// ---------------------------------------------------------------------------
// Outbound notices
// ---------------------------------------------------------------------------

/// Requests to the host raised by state entry actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Part is raised and waiting for an eject/pass verdict.
    AnalysisRequested,
    /// Part was pushed through without analysis.
    NonAnalysisCycle,
    /// A raise finished after analysis mode was switched off.
    AnalysisSkipped,
}

// ---------------------------------------------------------------------------
// RouterContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct RouterContext {
    // -- Timing --
    /// Monotonic time of the current tick or event (ms since boot).
    pub now_ms: u64,
    /// When the current state was entered.  Written by the engine before
    /// the entry action runs.
    pub state_entered_ms: u64,
    /// When the current cycle left `Idle`; `None` while idle.
    pub cycle_started_ms: Option<u64>,
    /// Dwell time captured by the current state's entry action.
    pub state_duration_ms: u32,

    // -- Sensor data --
    /// Debounced part-presence reading.  Updated before each FSM tick.
    pub object_present: bool,

    // -- Actuator outputs --
    /// Valve levels to be applied after the FSM tick.
    pub commands: ActuatorState,

    // -- Configuration --
    pub config: RouterConfig,

    // -- Outbound --
    /// Notices awaiting delivery to the host.
    pub notices: heapless::Vec<Notice, NOTICE_QUEUE_CAP>,
}

impl RouterContext {
    /// Create a new context with the given configuration.
    pub fn new(config: RouterConfig) -> Self {
        Self {
            now_ms: 0,
            state_entered_ms: 0,
            cycle_started_ms: None,
            state_duration_ms: 0,
            object_present: false,
            commands: ActuatorState::all_off(),
            config,
            notices: heapless::Vec::new(),
        }
    }

    /// Milliseconds elapsed since the current state was entered.
    pub fn elapsed_in_state_ms(&self) -> u64 {
        self.now_ms.saturating_sub(self.state_entered_ms)
    }

    /// True once the dwell captured at state entry has elapsed.
    pub fn dwell_elapsed(&self) -> bool {
        self.elapsed_in_state_ms() >= u64::from(self.state_duration_ms)
    }

    /// Queue a notice for the host.
    pub fn notify(&mut self, notice: Notice) {
        if self.notices.push(notice).is_err() {
            log::warn!("notice queue full, dropping {:?}", notice);
        }
    }
}
