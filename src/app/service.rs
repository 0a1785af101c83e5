//! Application service: the hexagonal core.
//!
//! [`RouterService`] owns the FSM, the fault monitor, and the shared
//! context.  It exposes a clean, hardware-agnostic API.  All I/O flows
//! through port traits injected at call sites, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌─────────────────────────┐ ──▶ EventSink
//!                 │      RouterService      │
//! ActuatorPort ◀──│  FSM · Fault monitor    │
//!                 └─────────────────────────┘
//! ```
//!
//! Time is passed in as milliseconds since boot on every call; the service
//! never reads a clock itself.

use log::{debug, info, warn};

use crate::config::{ConfigError, ConfigUpdate, RouterConfig};
use crate::error::{ActuatorError, FaultKind};
use crate::fsm::context::{Actuator, ActuatorState, Notice, RouterContext};
use crate::fsm::states::build_state_table;
use crate::fsm::{CycleState, Dispatch, Fsm, Input, Transition};
use crate::safety::FaultMonitor;

use super::commands::AppCommand;
use super::events::{AppEvent, StatusReport};
use super::ports::{ActuatorPort, EventSink, SensorPort};

// ───────────────────────────────────────────────────────────────
// RouterService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct RouterService {
    fsm: Fsm,
    ctx: RouterContext,
    faults: FaultMonitor,
    /// Levels the valves are known to hold after the last successful write.
    applied: ActuatorState,
    last_status_ms: u64,
    cycles: u32,
    boot_count: u32,
}

impl RouterService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: RouterConfig) -> Self {
        let ctx = RouterContext::new(config);
        let fsm = Fsm::new(build_state_table(), CycleState::Idle);

        Self {
            fsm,
            ctx,
            faults: FaultMonitor::new(),
            // Assume energised until the first write confirms otherwise, so
            // `start` drives every valve low.
            applied: ActuatorState {
                push: true,
                riser: true,
                ejection: true,
            },
            last_status_ms: 0,
            cycles: 0,
            boot_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the FSM in `Idle` and vent every cylinder.
    pub fn start(
        &mut self,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        self.ctx.now_ms = now_ms;
        self.last_status_ms = now_ms;
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("RouterService started in {:?}", self.fsm.current_state());

        self.settle(None, hw, sink);
        self.emit_status(sink);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: read sensor → FSM → actuators → events.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`], which avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        self.ctx.now_ms = now_ms;

        // 1. Read the presence sensor via SensorPort
        match hw.is_object_present(now_ms) {
            Ok(present) => {
                if present != self.ctx.object_present {
                    self.ctx.object_present = present;
                    sink.emit(&AppEvent::SensorChanged(present));
                    self.emit_status(sink);
                }
            }
            Err(e) => {
                warn!("Presence sensor read failed: {e}");
                self.latch_fault(FaultKind::SensorReadFailed, sink);
            }
        }

        // 2. FSM tick (pure state logic)
        let transition = self.fsm.tick(&mut self.ctx);

        // 3. Apply actuator commands and report
        self.settle(transition, hw, sink);

        // 4. Heartbeat
        let interval = u64::from(self.ctx.config.status_interval_ms);
        if now_ms.saturating_sub(self.last_status_ms) >= interval {
            self.emit_status(sink);
        }
    }

    // ── Asynchronous inputs ───────────────────────────────────

    /// Deliver the analysis verdict.  Only `WaitingForAnalysis` acts on it.
    pub fn submit_analysis_result(
        &mut self,
        eject: bool,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Dispatch {
        self.dispatch_input(Input::Verdict { eject }, now_ms, hw, sink)
    }

    /// Abort the pending analysis.  Only `WaitingForAnalysis` acts on it.
    pub fn request_abort(
        &mut self,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Dispatch {
        self.dispatch_input(Input::Abort, now_ms, hw, sink)
    }

    /// Change one host-tunable setting.  Returns `Ok(true)` if the value
    /// changed; an unchanged value emits nothing.
    ///
    /// Durations take effect at the next entry of the state that uses them.
    pub fn update_config(
        &mut self,
        update: ConfigUpdate,
        sink: &mut impl EventSink,
    ) -> Result<bool, ConfigError> {
        update.validate()?;
        let changed = self.ctx.config.apply(update);
        if changed {
            info!("Config {} updated: {:?}", update.field().key(), update);
            sink.emit(&AppEvent::ConfigUpdated(update));
        }
        Ok(changed)
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command from the host link.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> crate::error::Result<()> {
        match cmd {
            AppCommand::AnalysisResult { eject } => {
                self.submit_analysis_result(eject, now_ms, hw, sink);
            }
            AppCommand::AbortAnalysis => {
                self.request_abort(now_ms, hw, sink);
            }
            AppCommand::ApplySettings(updates) => {
                // Nothing is applied unless everything validates.
                for update in &updates {
                    update.validate()?;
                }
                for update in updates {
                    self.update_config(update, sink)?;
                }
            }
            AppCommand::ReportState => {
                self.ctx.now_ms = now_ms;
                self.emit_status(sink);
            }
            AppCommand::ClearFault => {
                self.ctx.now_ms = now_ms;
                self.clear_faults(hw, sink);
            }
            AppCommand::InjectFault(kind) => {
                self.ctx.now_ms = now_ms;
                self.latch_fault(kind, sink);
                self.settle(None, hw, sink);
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a status snapshot from the current context.
    pub fn status_report(&self) -> StatusReport {
        let cfg = &self.ctx.config;
        let cmds = &self.ctx.commands;
        StatusReport {
            status: self.fsm.current_state(),
            sensor: self.ctx.object_present,
            push: cmds.push,
            riser: cmds.riser,
            ejection: cmds.ejection,
            analysis_mode: cfg.analysis_mode,
            push_time: cfg.push_time_ms,
            riser_time: cfg.riser_time_ms,
            ejection_time: cfg.ejection_time_ms,
            cycle_ms: self.cycle_elapsed_ms(self.ctx.now_ms),
            cycles: self.cycles,
            boot_count: self.boot_count,
            faults: self.faults.faults(),
        }
    }

    /// Current FSM state.
    pub fn state(&self) -> CycleState {
        self.fsm.current_state()
    }

    /// Last commanded cylinder levels.
    pub fn actuators(&self) -> ActuatorState {
        self.ctx.commands
    }

    /// Live configuration.
    pub fn config(&self) -> &RouterConfig {
        &self.ctx.config
    }

    /// Time since the current cycle left `Idle`; 0 while idle.
    pub fn cycle_elapsed_ms(&self, now_ms: u64) -> u64 {
        self.ctx
            .cycle_started_ms
            .map_or(0, |started| now_ms.saturating_sub(started))
    }

    /// Current latched fault bitmask (0 = no faults).
    pub fn fault_flags(&self) -> u8 {
        self.faults.faults()
    }

    /// Completed cycles since startup.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Record the persisted boot count for status reports.
    pub fn set_boot_count(&mut self, count: u32) {
        self.boot_count = count;
    }

    // ── Internal ──────────────────────────────────────────────

    fn dispatch_input(
        &mut self,
        input: Input,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Dispatch {
        self.ctx.now_ms = now_ms;
        let outcome = self.fsm.dispatch(input, &mut self.ctx);
        match outcome {
            Dispatch::Ignored(state) => {
                debug!("Ignoring {:?} in {:?}", input, state);
                sink.emit(&AppEvent::InputIgnored { input, state });
            }
            Dispatch::Applied(transition) => self.settle(transition, hw, sink),
        }
        outcome
    }

    /// Write changed valves, announce the transition, flush notices.
    fn settle(
        &mut self,
        transition: Option<Transition>,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        let written = self.apply_actuators(hw);

        if let Some(t) = transition {
            self.announce(t, sink);
        }

        let notices = core::mem::take(&mut self.ctx.notices);
        for notice in notices {
            sink.emit(&match notice {
                Notice::AnalysisRequested => AppEvent::AnalysisRequested,
                Notice::NonAnalysisCycle => AppEvent::NonAnalysisCycle,
                Notice::AnalysisSkipped => AppEvent::AnalysisSkipped,
            });
        }

        if written.is_err() {
            self.latch_fault(FaultKind::ActuatorWriteFailed, sink);
            // Vent whatever still accepts writes; the rest retries next tick.
            let _ = self.apply_actuators(hw);
        }
    }

    /// Translate FSM actuator commands into port calls.  Only valves whose
    /// commanded level differs from the last confirmed write are touched.
    fn apply_actuators(&mut self, hw: &mut impl ActuatorPort) -> Result<(), ActuatorError> {
        let mut first_err = None;
        for which in Actuator::ALL {
            let want = self.ctx.commands.get(which);
            if self.applied.get(which) == want {
                continue;
            }
            match hw.set_actuator(which, want) {
                Ok(()) => self.applied.set(which, want),
                Err(e) => {
                    debug!("Cylinder {} write failed: {e}", which.as_str());
                    first_err.get_or_insert(e);
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn latch_fault(&mut self, kind: FaultKind, sink: &mut impl EventSink) {
        if self.faults.raise(kind) {
            sink.emit(&AppEvent::FaultDetected(self.faults.faults()));
        }
        if let Some(t) = self.fsm.force_transition(CycleState::Error, &mut self.ctx) {
            self.announce(t, sink);
        }
    }

    fn clear_faults(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        if self.fsm.current_state() != CycleState::Error {
            info!("Reset requested with no fault latched, ignoring");
            return;
        }
        self.faults.clear_all();
        sink.emit(&AppEvent::FaultCleared);
        let transition = self.fsm.force_transition(CycleState::Idle, &mut self.ctx);
        self.settle(transition, hw, sink);
    }

    fn announce(&mut self, t: Transition, sink: &mut impl EventSink) {
        if t.from == CycleState::Lowering && t.to == CycleState::Idle {
            self.cycles = self.cycles.saturating_add(1);
        }
        sink.emit(&AppEvent::StateChanged {
            from: t.from,
            to: t.to,
        });
        self.emit_status(sink);
    }

    fn emit_status(&mut self, sink: &mut impl EventSink) {
        self.last_status_ms = self.ctx.now_ms;
        sink.emit(&AppEvent::Status(self.status_report()));
    }
}
