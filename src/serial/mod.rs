//! Host serial protocol: line framing, command parsing, event rendering.
//!
//! ```text
//!  UART bytes ──▶ LineReader ──▶ parse_line ──▶ RouterService::handle_command
//!  AppEvent   ──▶ report::render ──▶ HostLink::send_line ──▶ UART
//! ```

pub mod command;
pub mod line;
pub mod report;

use crate::app::events::AppEvent;
use crate::app::ports::{ActuatorPort, EventSink};
use crate::app::service::RouterService;
use crate::error::Result;

/// Parse one host line and hand the command to the service.
///
/// Rejections are reported through `sink` as well as returned, so the host
/// always hears back about a line it got wrong.
pub fn dispatch_line(
    line: &str,
    now_ms: u64,
    app: &mut RouterService,
    hw: &mut impl ActuatorPort,
    sink: &mut impl EventSink,
) -> Result<()> {
    log::debug!("RX | {}", line);
    let outcome = command::parse_line(line)
        .map_err(Into::into)
        .and_then(|cmd| app.handle_command(cmd, now_ms, hw, sink));

    if let Err(e) = outcome {
        sink.emit(&AppEvent::CommandRejected(e));
    }
    outcome
}
