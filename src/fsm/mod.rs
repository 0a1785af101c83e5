//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern in Rust:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                           │
//! │  ┌────────────────────┬──────────┬─────────┬───────────┬────────────┐ │
//! │  │ CycleState         │ on_enter │ on_exit │ on_update │ on_input   │ │
//! │  ├────────────────────┼──────────┼─────────┼───────────┼────────────┤ │
//! │  │ Idle               │ fn(ctx)  │ -       │ fn(ctx)   │ -          │ │
//! │  │ WaitingForPush     │ fn(ctx)  │ -       │ fn(ctx)   │ -          │ │
//! │  │ Pushing            │ fn(ctx)  │ fn(ctx) │ fn(ctx)   │ -          │ │
//! │  │ Raising            │ fn(ctx)  │ -       │ fn(ctx)   │ -          │ │
//! │  │ WaitingForAnalysis │ fn(ctx)  │ -       │ fn(ctx)   │ fn(ctx, i) │ │
//! │  │ Ejecting           │ fn(ctx)  │ fn(ctx) │ fn(ctx)   │ -          │ │
//! │  │ Lowering           │ fn(ctx)  │ -       │ fn(ctx)   │ -          │ │
//! │  │ Error              │ fn(ctx)  │ -       │ fn(ctx)   │ -          │ │
//! │  └────────────────────┴──────────┴─────────┴───────────┴────────────┘ │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.  If it
//! returns `Some(next)`, the engine runs `on_exit` for the current state,
//! stamps the entry time, then runs `on_enter` for the next.
//!
//! Asynchronous host inputs (analysis verdict, abort) are one-shot: they are
//! handed to the current state's `on_input` and never stored.  A state with
//! no `on_input` ignores them.

pub mod context;
pub mod states;

use context::RouterContext;
use log::info;
use serde::Serialize;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Every state the router can be in.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum CycleState {
    Idle = 0,
    WaitingForPush = 1,
    Pushing = 2,
    Raising = 3,
    WaitingForAnalysis = 4,
    Ejecting = 5,
    Lowering = 6,
    Error = 7,
}

impl CycleState {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 8;

    pub const ALL: [CycleState; Self::COUNT] = [
        Self::Idle,
        Self::WaitingForPush,
        Self::Pushing,
        Self::Raising,
        Self::WaitingForAnalysis,
        Self::Ejecting,
        Self::Lowering,
        Self::Error,
    ];

    /// Convert a table index back to `CycleState`.  Panics on out-of-range
    /// in debug builds; returns `Error` in release.
    pub fn from_index(idx: usize) -> Self {
        match Self::ALL.get(idx) {
            Some(state) => *state,
            None => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Error
            }
        }
    }

    /// Name used on the serial link.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::WaitingForPush => "WAITING_FOR_PUSH",
            Self::Pushing => "PUSHING",
            Self::Raising => "RAISING",
            Self::WaitingForAnalysis => "WAITING_FOR_ANALYSIS",
            Self::Ejecting => "EJECTING",
            Self::Lowering => "LOWERING",
            Self::Error => "ERROR",
        }
    }
}

// ---------------------------------------------------------------------------
// One-shot inputs
// ---------------------------------------------------------------------------

/// Asynchronous inputs delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Analysis verdict: `eject == true` diverts the part.
    Verdict { eject: bool },
    /// Operator/host abort of the pending analysis.
    Abort,
}

/// A completed state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CycleState,
    pub to: CycleState,
}

/// Outcome of handing an [`Input`] to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The current state accepted the input.
    Applied(Option<Transition>),
    /// The current state has no use for the input; nothing changed.
    Ignored(CycleState),
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut RouterContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut RouterContext) -> Option<CycleState>;

/// Signature for the one-shot input handler.
pub type StateInputFn = fn(&mut RouterContext, Input) -> Option<CycleState>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array without heap or `dyn`.
pub struct StateDescriptor {
    pub id: CycleState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
    pub on_input: Option<StateInputFn>,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table and the index of the active state.  Time comes in
/// through `ctx.now_ms`, set by the caller before each `tick` or `dispatch`.
pub struct Fsm {
    /// Fixed-size table indexed by `CycleState as usize`.
    table: [StateDescriptor; CycleState::COUNT],
    /// Index of the currently active state.
    current: usize,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; CycleState::COUNT], initial: CycleState) -> Self {
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Stamp the entry time and run the initial `on_enter`.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut RouterContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        ctx.state_entered_ms = ctx.now_ms;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    ///
    /// At most one transition happens per tick.
    pub fn tick(&mut self, ctx: &mut RouterContext) -> Option<Transition> {
        let next = (self.table[self.current].on_update)(ctx)?;
        Some(self.transition(next, ctx))
    }

    /// Hand a one-shot input to the current state.
    pub fn dispatch(&mut self, input: Input, ctx: &mut RouterContext) -> Dispatch {
        let Some(handler) = self.table[self.current].on_input else {
            return Dispatch::Ignored(self.current_state());
        };
        let next = handler(ctx, input);
        Dispatch::Applied(next.map(|id| self.transition(id, ctx)))
    }

    /// Force an immediate transition (used by the fault monitor to jump to
    /// `Error`, and by the host reset to leave it).
    pub fn force_transition(
        &mut self,
        next: CycleState,
        ctx: &mut RouterContext,
    ) -> Option<Transition> {
        (next as usize != self.current).then(|| self.transition(next, ctx))
    }

    /// The current state's identity.
    pub fn current_state(&self) -> CycleState {
        CycleState::from_index(self.current)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: CycleState, ctx: &mut RouterContext) -> Transition {
        let next_idx = next_id as usize;
        let from = self.current_state();

        info!(
            "FSM transition: {} -> {} @ {}ms",
            self.table[self.current].name, self.table[next_idx].name, ctx.now_ms
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        ctx.state_entered_ms = ctx.now_ms;
        ctx.state_duration_ms = 0;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }

        Transition { from, to: next_id }
    }
}
