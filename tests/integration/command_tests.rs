//! Integration tests: host lines → dispatcher → RouterService → host lines.

use sortrouter::adapters::serial_sink::SerialEventSink;
use sortrouter::app::events::AppEvent;
use sortrouter::app::service::RouterService;
use sortrouter::config::RouterConfig;
use sortrouter::error::Error;
use sortrouter::fsm::CycleState;
use sortrouter::fsm::context::Actuator;
use sortrouter::serial::dispatch_line;
use sortrouter::serial::line::{LineEvent, LineReader};

use crate::mock_hw::{CapturedLink, EventRecorder, MockHardware};

type Sink = (EventRecorder, SerialEventSink<CapturedLink>);

fn setup() -> (RouterService, MockHardware, Sink) {
    let mut app = RouterService::new(RouterConfig::default());
    let mut hw = MockHardware::new();
    let mut sink = (
        EventRecorder::new(),
        SerialEventSink::new(CapturedLink::default()),
    );
    app.start(0, &mut hw, &mut sink);
    sink.0.clear();
    sink.1.link_mut().lines.clear();
    (app, hw, sink)
}

fn host_lines(sink: &mut Sink) -> Vec<String> {
    std::mem::take(&mut sink.1.link_mut().lines)
}

#[test]
fn settings_line_updates_config() {
    let (mut app, mut hw, mut sink) = setup();
    dispatch_line(
        r#"SETTINGS {"pushTime":2000,"riserTime":1500,"ejectionTime":500,"analysisMode":false}"#,
        10,
        &mut app,
        &mut hw,
        &mut sink,
    )
    .unwrap();

    let cfg = app.config();
    assert_eq!(cfg.push_time_ms, 2000);
    assert_eq!(cfg.riser_time_ms, 1500);
    assert_eq!(cfg.ejection_time_ms, 500);
    assert!(!cfg.analysis_mode);
    assert_eq!(
        sink.0.count(|e| matches!(e, AppEvent::ConfigUpdated(_))),
        4
    );
}

#[test]
fn bad_settings_change_nothing_and_reply_with_error() {
    let (mut app, mut hw, mut sink) = setup();
    let before = app.config().clone();

    for line in [
        "SETTINGS {pushTime: 5",
        r#"SETTINGS {"pushTime":"slow"}"#,
        r#"SETTINGS {"pushTime":1000,"ejectionTime":999999}"#,
    ] {
        let result = dispatch_line(line, 10, &mut app, &mut hw, &mut sink);
        assert!(matches!(result, Err(Error::Command(_))), "{line}");
    }

    assert_eq!(app.config(), &before);
    let lines = host_lines(&mut sink);
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| l.starts_with("ERROR Failed to parse settings")));
}

#[test]
fn get_state_replies_with_json_snapshot() {
    let (mut app, mut hw, mut sink) = setup();
    app.set_boot_count(4);
    dispatch_line("GET_STATE", 10, &mut app, &mut hw, &mut sink).unwrap();

    let lines = host_lines(&mut sink);
    assert_eq!(lines.len(), 1);
    let json = lines[0].strip_prefix("STATE ").unwrap();
    let v: serde_json::Value = serde_json::from_str(json).unwrap();
    assert_eq!(v["status"], "IDLE");
    assert_eq!(v["bootCount"], 4);
    assert_eq!(v["push"], false);
}

#[test]
fn unknown_command_is_reported() {
    let (mut app, mut hw, mut sink) = setup();
    let result = dispatch_line("MOTOR_ON", 10, &mut app, &mut hw, &mut sink);
    assert!(result.is_err());
    assert_eq!(host_lines(&mut sink), ["ERROR unknown command"]);
}

#[test]
fn stray_verdict_gets_a_warning_line() {
    let (mut app, mut hw, mut sink) = setup();
    dispatch_line("ANALYSIS_RESULT TRUE", 10, &mut app, &mut hw, &mut sink).unwrap();
    assert_eq!(app.state(), CycleState::Idle);
    assert_eq!(
        host_lines(&mut sink),
        ["WARNING Ignoring analysis result - not in waiting state (IDLE)"]
    );
}

#[test]
fn full_cycle_over_the_wire() {
    let (mut app, mut hw, mut sink) = setup();
    let mut reader = LineReader::new();

    hw.present = true;
    app.tick(0, &mut hw, &mut sink);
    app.tick(300, &mut hw, &mut sink);
    hw.present = false;
    app.tick(3300, &mut hw, &mut sink);
    app.tick(6300, &mut hw, &mut sink);

    let lines = host_lines(&mut sink);
    assert_eq!(
        lines.iter().filter(|l| *l == "SLAVE_REQUEST ANALYSIS_START").count(),
        1
    );
    assert!(
        lines
            .iter()
            .any(|l| l.contains(r#""status":"WAITING_FOR_ANALYSIS""#))
    );

    // Verdict arrives split across two UART reads, CRLF-terminated.
    for chunk in [&b"ANALYSIS_RE"[..], &b"SULT 1\r\n"[..]] {
        for &b in chunk {
            if let Some(LineEvent::Line(line)) = reader.push(b) {
                dispatch_line(line, 6500, &mut app, &mut hw, &mut sink).unwrap();
            }
        }
    }
    assert_eq!(app.state(), CycleState::Ejecting);
    assert!(hw.is_on(Actuator::Ejection));
}

#[test]
fn reset_line_recovers_from_fault() {
    let (mut app, mut hw, mut sink) = setup();
    hw.sensor_fails = true;
    app.tick(10, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::Error);
    assert!(
        host_lines(&mut sink)
            .iter()
            .any(|l| l.starts_with("ERROR Fault latched"))
    );

    hw.sensor_fails = false;
    dispatch_line("RESET", 20, &mut app, &mut hw, &mut sink).unwrap();
    assert_eq!(app.state(), CycleState::Idle);
    assert_eq!(app.fault_flags(), 0);
    assert!(sink.0.events.contains(&AppEvent::FaultCleared));

    // Cycles run normally afterwards.
    hw.present = true;
    app.tick(30, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::WaitingForPush);
}
