//! Outbound line rendering.
//!
//! Maps application events to the text protocol the analysis controller
//! reads.  Events with no protocol meaning render to `None`.
//!
//! | Event                | Line                                  |
//! |----------------------|---------------------------------------|
//! | `AnalysisRequested`  | `SLAVE_REQUEST ANALYSIS_START`        |
//! | `NonAnalysisCycle`   | `SLAVE_REQUEST NON_ANALYSIS_CYCLE`    |
//! | `Status`             | `STATE {json}`                        |
//! | `SensorChanged`      | `DEBUG: ...`                          |
//! | `InputIgnored`       | `WARNING ...`                         |
//! | `AnalysisSkipped`    | `WARNING Unexpected state: ...`       |
//! | `FaultDetected`      | `ERROR ...`                           |
//! | `CommandRejected`    | `ERROR ...` / `WARNING ...`           |

use core::fmt::Write;

use crate::app::events::{AppEvent, StatusReport};
use crate::error::Error;
use crate::fsm::Input;
use crate::serial::command::CommandError;

pub const ANALYSIS_START: &str = "SLAVE_REQUEST ANALYSIS_START";
pub const NON_ANALYSIS_CYCLE: &str = "SLAVE_REQUEST NON_ANALYSIS_CYCLE";

/// Render `event` as one protocol line, without terminator.
pub fn render(event: &AppEvent) -> Option<String> {
    let mut line = String::new();
    match event {
        AppEvent::AnalysisRequested => line.push_str(ANALYSIS_START),
        AppEvent::NonAnalysisCycle => line.push_str(NON_ANALYSIS_CYCLE),
        AppEvent::AnalysisSkipped => {
            line.push_str("WARNING Unexpected state: RAISING in non-analysis mode");
        }
        AppEvent::Status(report) => return state_line(report),
        AppEvent::SensorChanged(true) => line.push_str("DEBUG: Object detected"),
        AppEvent::SensorChanged(false) => line.push_str("DEBUG: Object cleared"),
        AppEvent::InputIgnored { input, state } => {
            let what = match input {
                Input::Verdict { .. } => "analysis result",
                Input::Abort => "abort",
            };
            let _ = write!(
                line,
                "WARNING Ignoring {what} - not in waiting state ({})",
                state.as_str()
            );
        }
        AppEvent::ConfigUpdated(update) => {
            let _ = write!(line, "DEBUG: Setting {} updated", update.field().key());
        }
        AppEvent::FaultDetected(mask) => {
            let _ = write!(line, "ERROR Fault latched (faults=0x{mask:02X}), send RESET to clear");
        }
        AppEvent::FaultCleared => line.push_str("DEBUG: Faults cleared"),
        AppEvent::CommandRejected(err) => rejection(&mut line, err),
        AppEvent::Started(_) | AppEvent::StateChanged { .. } => return None,
    }
    Some(line)
}

/// `STATE {json}`.
pub fn state_line(report: &StatusReport) -> Option<String> {
    match serde_json::to_string(report) {
        Ok(json) => Some(format!("STATE {json}")),
        Err(e) => {
            log::error!("STATE serialisation failed: {e}");
            None
        }
    }
}

fn rejection(line: &mut String, err: &Error) {
    let _ = match err {
        Error::Command(CommandError::Settings(e)) => {
            write!(line, "ERROR Failed to parse settings: {e}")
        }
        Error::Config(e) => write!(line, "WARNING Settings rejected: {e}"),
        Error::Command(e) => write!(line, "ERROR {e}"),
        other => write!(line, "ERROR {other}"),
    };
}
