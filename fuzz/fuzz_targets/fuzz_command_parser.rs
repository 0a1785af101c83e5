//! Fuzz target: `parse_line` → `RouterService::handle_command`
//!
//! Every line the parser accepts is executed against a fresh service with
//! inert hardware.  Neither step may panic, and settings that parse must
//! leave a configuration that still validates.
//!
//! cargo fuzz run fuzz_command_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use sortrouter::app::events::AppEvent;
use sortrouter::app::ports::{ActuatorPort, EventSink};
use sortrouter::app::service::RouterService;
use sortrouter::config::RouterConfig;
use sortrouter::error::ActuatorError;
use sortrouter::fsm::context::Actuator;
use sortrouter::serial::command::parse_line;

struct Inert;

impl ActuatorPort for Inert {
    fn set_actuator(&mut self, _which: Actuator, _on: bool) -> Result<(), ActuatorError> {
        Ok(())
    }
}

impl EventSink for Inert {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(cmd) = parse_line(line) else {
        return;
    };

    let mut app = RouterService::new(RouterConfig::default());
    let (mut hw, mut sink) = (Inert, Inert);
    app.start(0, &mut hw, &mut sink);
    let _ = app.handle_command(cmd, 1, &mut hw, &mut sink);
    assert!(app.config().validate().is_ok(), "accepted settings broke config");
});
