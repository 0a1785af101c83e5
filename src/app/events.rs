//! Outbound application events.
//!
//! The [`RouterService`](super::service::RouterService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log them, turn them into protocol lines
//! for the analysis controller, or record them in a test.

use serde::Serialize;

use crate::config::ConfigUpdate;
use crate::error::Error;
use crate::fsm::{CycleState, Input};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The application service has started (carries initial state).
    Started(CycleState),

    /// The FSM transitioned between states.
    StateChanged { from: CycleState, to: CycleState },

    /// A part is raised and the host must send a verdict.
    AnalysisRequested,

    /// A part passed through with analysis disabled.
    NonAnalysisCycle,

    /// A raised part was lowered unanalysed because analysis mode was
    /// switched off while it rose.
    AnalysisSkipped,

    /// The debounced presence reading changed.
    SensorChanged(bool),

    /// A verdict or abort arrived in a state that has no use for it.
    InputIgnored { input: Input, state: CycleState },

    /// A host-tunable setting changed value.
    ConfigUpdated(ConfigUpdate),

    /// Status snapshot (periodic, on transition, or on request).
    Status(StatusReport),

    /// One or more hardware faults were latched (bitmask).
    FaultDetected(u8),

    /// Faults were cleared by the host and the router is idle again.
    FaultCleared,

    /// A host command could not be carried out.
    CommandRejected(Error),
}

/// Point-in-time snapshot sent as the `STATE {json}` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub status: CycleState,
    pub sensor: bool,
    pub push: bool,
    pub riser: bool,
    pub ejection: bool,
    pub analysis_mode: bool,
    pub push_time: u32,
    pub riser_time: u32,
    pub ejection_time: u32,
    /// Time since the current cycle left `Idle`; 0 while idle.
    pub cycle_ms: u64,
    /// Completed cycles since boot.
    pub cycles: u32,
    pub boot_count: u32,
    /// Latched fault bitmask.
    pub faults: u8,
}
