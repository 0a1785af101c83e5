//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (ESP-IDF logger on target, whatever the test harness
//! installs on host).

use log::{debug, error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Status(s) => {
                debug!(
                    "STATUS | {} | sensor={} | push={} riser={} ejection={} | \
                     cycle={}ms | cycles={} | faults=0b{:08b}",
                    s.status.as_str(),
                    s.sensor,
                    s.push,
                    s.riser,
                    s.ejection,
                    s.cycle_ms,
                    s.cycles,
                    s.faults,
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::AnalysisRequested => {
                info!("ANALYSIS | verdict requested");
            }
            AppEvent::NonAnalysisCycle => {
                info!("ANALYSIS | skipped (analysis mode off)");
            }
            AppEvent::AnalysisSkipped => {
                warn!("ANALYSIS | raise ended with analysis mode off, lowering");
            }
            AppEvent::SensorChanged(present) => {
                debug!("SENSOR | present={}", present);
            }
            AppEvent::InputIgnored { input, state } => {
                warn!("INPUT | {:?} ignored in {:?}", input, state);
            }
            AppEvent::ConfigUpdated(update) => {
                info!("CONFIG | {:?}", update);
            }
            AppEvent::FaultDetected(flags) => {
                error!("FAULT | detected, flags=0b{:08b}", flags);
            }
            AppEvent::FaultCleared => {
                info!("FAULT | all cleared");
            }
            AppEvent::CommandRejected(e) => {
                warn!("COMMAND | rejected: {}", e);
            }
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
        }
    }
}
