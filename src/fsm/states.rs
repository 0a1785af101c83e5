//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  IDLE ──[part present]──▶ WAITING_FOR_PUSH ──[sensor delay]──▶ PUSHING
//!    ▲                                                             │
//!    │                                   [clear + push time, analysis on]
//!    │                                                             ▼
//!    │        [clear + push time, analysis off]                RAISING
//!    │                       │                                     │
//!    │                       │                              [riser time]
//!    │                       ▼                                     ▼
//!    └──[cycle delay]──── LOWERING ◀──[pass / abort / timeout]── WAITING_FOR_ANALYSIS
//!                            ▲                                     │
//!                            └────[ejection time]── EJECTING ◀──[eject]
//!
//!  Any state ──[hardware fault]──▶ ERROR ──[host reset]──▶ IDLE
//! ```

use super::context::{Actuator, ActuatorState, Notice, RouterContext};
use super::{CycleState, Input, StateDescriptor};
use log::{debug, info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; CycleState::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: CycleState::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
            on_input: None,
        },
        // Index 1: WaitingForPush
        StateDescriptor {
            id: CycleState::WaitingForPush,
            name: "WaitingForPush",
            on_enter: Some(waiting_for_push_enter),
            on_exit: None,
            on_update: waiting_for_push_update,
            on_input: None,
        },
        // Index 2: Pushing
        StateDescriptor {
            id: CycleState::Pushing,
            name: "Pushing",
            on_enter: Some(pushing_enter),
            on_exit: Some(pushing_exit),
            on_update: pushing_update,
            on_input: None,
        },
        // Index 3: Raising
        StateDescriptor {
            id: CycleState::Raising,
            name: "Raising",
            on_enter: Some(raising_enter),
            on_exit: None,
            on_update: raising_update,
            on_input: None,
        },
        // Index 4: WaitingForAnalysis
        StateDescriptor {
            id: CycleState::WaitingForAnalysis,
            name: "WaitingForAnalysis",
            on_enter: Some(waiting_for_analysis_enter),
            on_exit: None,
            on_update: waiting_for_analysis_update,
            on_input: Some(waiting_for_analysis_input),
        },
        // Index 5: Ejecting
        StateDescriptor {
            id: CycleState::Ejecting,
            name: "Ejecting",
            on_enter: Some(ejecting_enter),
            on_exit: Some(ejecting_exit),
            on_update: ejecting_update,
            on_input: None,
        },
        // Index 6: Lowering
        StateDescriptor {
            id: CycleState::Lowering,
            name: "Lowering",
            on_enter: Some(lowering_enter),
            on_exit: None,
            on_update: lowering_update,
            on_input: None,
        },
        // Index 7: Error
        StateDescriptor {
            id: CycleState::Error,
            name: "Error",
            on_enter: Some(error_enter),
            on_exit: None,
            on_update: error_update,
            on_input: None,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut RouterContext) {
    ctx.commands = ActuatorState::all_off();
    ctx.cycle_started_ms = None;
}

fn idle_update(ctx: &mut RouterContext) -> Option<CycleState> {
    if ctx.object_present {
        info!("Idle: part detected");
        return Some(CycleState::WaitingForPush);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  WAITING_FOR_PUSH state
// ═══════════════════════════════════════════════════════════════════════════

fn waiting_for_push_enter(ctx: &mut RouterContext) {
    ctx.cycle_started_ms = Some(ctx.now_ms);
    ctx.state_duration_ms = ctx.config.sensor_delay_ms;
}

fn waiting_for_push_update(ctx: &mut RouterContext) -> Option<CycleState> {
    ctx.dwell_elapsed().then_some(CycleState::Pushing)
}

// ═══════════════════════════════════════════════════════════════════════════
//  PUSHING state
// ═══════════════════════════════════════════════════════════════════════════

fn pushing_enter(ctx: &mut RouterContext) {
    ctx.commands.set(Actuator::Push, true);
    ctx.state_duration_ms = ctx.config.push_time_ms;
}

fn pushing_exit(ctx: &mut RouterContext) {
    ctx.commands.set(Actuator::Push, false);
}

fn pushing_update(ctx: &mut RouterContext) -> Option<CycleState> {
    // The part must have left the sensor and the stroke must be complete.
    if ctx.object_present || !ctx.dwell_elapsed() {
        return None;
    }

    if ctx.config.analysis_mode {
        Some(CycleState::Raising)
    } else {
        ctx.notify(Notice::NonAnalysisCycle);
        Some(CycleState::Lowering)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  RAISING state
// ═══════════════════════════════════════════════════════════════════════════

fn raising_enter(ctx: &mut RouterContext) {
    ctx.commands.set(Actuator::Riser, true);
    ctx.state_duration_ms = ctx.config.riser_time_ms;
}

fn raising_update(ctx: &mut RouterContext) -> Option<CycleState> {
    if !ctx.dwell_elapsed() {
        return None;
    }

    if ctx.config.analysis_mode {
        Some(CycleState::WaitingForAnalysis)
    } else {
        warn!("Raising: analysis mode turned off mid-raise, lowering");
        ctx.notify(Notice::AnalysisSkipped);
        Some(CycleState::Lowering)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  WAITING_FOR_ANALYSIS state
// ═══════════════════════════════════════════════════════════════════════════

fn waiting_for_analysis_enter(ctx: &mut RouterContext) {
    ctx.state_duration_ms = ctx.config.analysis_timeout_ms;
    ctx.notify(Notice::AnalysisRequested);
}

fn waiting_for_analysis_update(ctx: &mut RouterContext) -> Option<CycleState> {
    if ctx.dwell_elapsed() {
        warn!(
            "WaitingForAnalysis: no verdict after {}ms, passing part",
            ctx.state_duration_ms
        );
        return Some(CycleState::Lowering);
    }
    None
}

fn waiting_for_analysis_input(ctx: &mut RouterContext, input: Input) -> Option<CycleState> {
    debug!(
        "WaitingForAnalysis: {:?} after {}ms",
        input,
        ctx.elapsed_in_state_ms()
    );
    match input {
        Input::Verdict { eject: true } => Some(CycleState::Ejecting),
        Input::Verdict { eject: false } | Input::Abort => Some(CycleState::Lowering),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  EJECTING state
// ═══════════════════════════════════════════════════════════════════════════

fn ejecting_enter(ctx: &mut RouterContext) {
    ctx.commands.set(Actuator::Ejection, true);
    ctx.state_duration_ms = ctx.config.ejection_time_ms;
}

fn ejecting_exit(ctx: &mut RouterContext) {
    ctx.commands.set(Actuator::Ejection, false);
}

fn ejecting_update(ctx: &mut RouterContext) -> Option<CycleState> {
    ctx.dwell_elapsed().then_some(CycleState::Lowering)
}

// ═══════════════════════════════════════════════════════════════════════════
//  LOWERING state
// ═══════════════════════════════════════════════════════════════════════════

fn lowering_enter(ctx: &mut RouterContext) {
    // Unconditional: whichever path led here, every valve closes.
    ctx.commands = ActuatorState::all_off();
    ctx.state_duration_ms = ctx.config.cycle_delay_ms;
}

fn lowering_update(ctx: &mut RouterContext) -> Option<CycleState> {
    if !ctx.dwell_elapsed() {
        return None;
    }
    if let Some(started) = ctx.cycle_started_ms {
        info!("Cycle complete in {}ms", ctx.now_ms.saturating_sub(started));
    }
    Some(CycleState::Idle)
}

// ═══════════════════════════════════════════════════════════════════════════
//  ERROR state
// ═══════════════════════════════════════════════════════════════════════════

fn error_enter(ctx: &mut RouterContext) {
    ctx.commands = ActuatorState::all_off();
    warn!("ERROR state: all cylinders de-energised, waiting for host reset");
}

/// Only a forced transition leaves `Error`.
fn error_update(_ctx: &mut RouterContext) -> Option<CycleState> {
    None
}
