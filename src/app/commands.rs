//! Inbound commands to the application service.
//!
//! These represent actions requested by the analysis controller over the
//! serial link (or by a test harness) that the
//! [`RouterService`](super::service::RouterService) interprets and acts upon.

use crate::config::ConfigUpdate;
use crate::error::FaultKind;

/// Most updates a single `SETTINGS` line can carry.
pub const MAX_UPDATES: usize = 4;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Analysis verdict for the raised part.
    AnalysisResult { eject: bool },

    /// Give up on the pending analysis and lower the part.
    AbortAnalysis,

    /// Validated settings, applied in order.
    ApplySettings(heapless::Vec<ConfigUpdate, MAX_UPDATES>),

    /// Send an immediate status snapshot.
    ReportState,

    /// Clear latched faults and return to `Idle`.
    ClearFault,

    /// Latch a fault reported by an outside collaborator.
    InjectFault(FaultKind),
}
