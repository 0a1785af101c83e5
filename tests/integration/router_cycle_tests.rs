//! Integration tests: RouterService → FSM → valves, full sorting cycles.

use sortrouter::app::events::AppEvent;
use sortrouter::app::service::RouterService;
use sortrouter::config::{ConfigUpdate, RouterConfig};
use sortrouter::error::FaultKind;
use sortrouter::fsm::context::Actuator;
use sortrouter::fsm::{CycleState, Dispatch, Input};

use crate::mock_hw::{EventRecorder, MockHardware};

// ── Helpers ───────────────────────────────────────────────────

fn setup(config: RouterConfig) -> (RouterService, MockHardware, EventRecorder) {
    let mut app = RouterService::new(config);
    let mut hw = MockHardware::new();
    let mut sink = EventRecorder::new();
    app.start(0, &mut hw, &mut sink);
    sink.clear();
    hw.writes.clear();
    (app, hw, sink)
}

fn visited(sink: &EventRecorder) -> Vec<CycleState> {
    sink.events
        .iter()
        .filter_map(|e| match e {
            AppEvent::StateChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect()
}

fn analysis_requests(sink: &EventRecorder) -> usize {
    sink.count(|e| matches!(e, AppEvent::AnalysisRequested))
}

/// Run a part in at t=0, clear the sensor at t=500, and stop once the
/// router waits for a verdict (t=6300).
fn run_to_analysis(app: &mut RouterService, hw: &mut MockHardware, sink: &mut EventRecorder) {
    hw.present = true;
    app.tick(0, hw, sink);
    app.tick(300, hw, sink);
    hw.present = false;
    app.tick(500, hw, sink);
    app.tick(3300, hw, sink);
    app.tick(6300, hw, sink);
    assert_eq!(app.state(), CycleState::WaitingForAnalysis);
}

// ── Reference cycle ───────────────────────────────────────────

#[test]
fn eject_cycle_follows_reference_timeline() {
    let (mut app, mut hw, mut sink) = setup(RouterConfig::default());

    hw.present = true;
    app.tick(0, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::WaitingForPush);

    app.tick(299, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::WaitingForPush);
    app.tick(300, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::Pushing);
    assert!(hw.is_on(Actuator::Push));

    hw.present = false;
    app.tick(500, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::Pushing);

    app.tick(3300, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::Raising);
    assert!(!hw.is_on(Actuator::Push));
    assert!(hw.is_on(Actuator::Riser));

    app.tick(6300, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::WaitingForAnalysis);
    assert_eq!(analysis_requests(&sink), 1);

    app.tick(6400, &mut hw, &mut sink);
    assert_eq!(analysis_requests(&sink), 1);

    let outcome = app.submit_analysis_result(true, 6500, &mut hw, &mut sink);
    assert!(matches!(outcome, Dispatch::Applied(Some(_))));
    assert_eq!(app.state(), CycleState::Ejecting);
    assert!(hw.is_on(Actuator::Ejection));

    app.tick(7500, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::Lowering);
    assert!(!hw.is_on(Actuator::Ejection));
    assert!(!hw.is_on(Actuator::Riser));

    app.tick(8500, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::Idle);
    assert_eq!(app.cycles(), 1);
    assert_eq!(app.cycle_elapsed_ms(9000), 0);

    assert_eq!(
        visited(&sink),
        [
            CycleState::WaitingForPush,
            CycleState::Pushing,
            CycleState::Raising,
            CycleState::WaitingForAnalysis,
            CycleState::Ejecting,
            CycleState::Lowering,
            CycleState::Idle,
        ]
    );
}

#[test]
fn pass_verdict_skips_ejection() {
    let (mut app, mut hw, mut sink) = setup(RouterConfig::default());
    run_to_analysis(&mut app, &mut hw, &mut sink);

    app.submit_analysis_result(false, 7000, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::Lowering);
    assert!(!hw.is_on(Actuator::Riser));
    app.tick(8000, &mut hw, &mut sink);

    let states = visited(&sink);
    assert!(!states.contains(&CycleState::Ejecting));
    assert_eq!(states.last(), Some(&CycleState::Idle));
    assert!(hw.writes.iter().all(|(which, _)| *which != Actuator::Ejection));
}

#[test]
fn non_analysis_cycle_bypasses_riser() {
    let config = RouterConfig {
        analysis_mode: false,
        ..RouterConfig::default()
    };
    let (mut app, mut hw, mut sink) = setup(config);

    hw.present = true;
    app.tick(0, &mut hw, &mut sink);
    app.tick(300, &mut hw, &mut sink);
    hw.present = false;
    app.tick(3300, &mut hw, &mut sink);
    app.tick(4300, &mut hw, &mut sink);

    assert_eq!(
        visited(&sink),
        [
            CycleState::WaitingForPush,
            CycleState::Pushing,
            CycleState::Lowering,
            CycleState::Idle,
        ]
    );
    assert_eq!(sink.count(|e| matches!(e, AppEvent::NonAnalysisCycle)), 1);
    assert_eq!(analysis_requests(&sink), 0);
    assert!(hw.writes.iter().all(|(which, _)| *which == Actuator::Push));
}

// ── Timeout and abort ─────────────────────────────────────────

#[test]
fn missing_verdict_times_out_to_lowering() {
    let (mut app, mut hw, mut sink) = setup(RouterConfig::default());
    run_to_analysis(&mut app, &mut hw, &mut sink);

    app.tick(16_299, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::WaitingForAnalysis);
    app.tick(16_300, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::Lowering);
    assert!(!hw.is_on(Actuator::Riser));

    // A late verdict changes nothing.
    let outcome = app.submit_analysis_result(true, 16_400, &mut hw, &mut sink);
    assert_eq!(outcome, Dispatch::Ignored(CycleState::Lowering));
    assert!(!hw.is_on(Actuator::Ejection));
    assert!(sink.events.contains(&AppEvent::InputIgnored {
        input: Input::Verdict { eject: true },
        state: CycleState::Lowering,
    }));
}

#[test]
fn verdict_at_deadline_wins_over_timeout() {
    let (mut app, mut hw, mut sink) = setup(RouterConfig::default());
    run_to_analysis(&mut app, &mut hw, &mut sink);

    // Host lines are handled before the tick in the same loop iteration.
    app.submit_analysis_result(true, 16_300, &mut hw, &mut sink);
    app.tick(16_300, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::Ejecting);
    assert!(hw.is_on(Actuator::Ejection));
}

#[test]
fn abort_lowers_and_releases_riser() {
    let (mut app, mut hw, mut sink) = setup(RouterConfig::default());
    run_to_analysis(&mut app, &mut hw, &mut sink);

    app.request_abort(7000, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::Lowering);
    assert!(!hw.is_on(Actuator::Riser));
}

#[test]
fn abort_outside_analysis_is_ignored() {
    let (mut app, mut hw, mut sink) = setup(RouterConfig::default());
    hw.present = true;
    app.tick(0, &mut hw, &mut sink);
    app.tick(300, &mut hw, &mut sink);

    let outcome = app.request_abort(400, &mut hw, &mut sink);
    assert_eq!(outcome, Dispatch::Ignored(CycleState::Pushing));
    assert!(hw.is_on(Actuator::Push));
}

// ── Configuration ─────────────────────────────────────────────

#[test]
fn riser_time_change_applies_to_next_raise_only() {
    let (mut app, mut hw, mut sink) = setup(RouterConfig::default());
    hw.present = true;
    app.tick(0, &mut hw, &mut sink);
    app.tick(300, &mut hw, &mut sink);
    hw.present = false;
    app.tick(3300, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::Raising);

    app.update_config(ConfigUpdate::RiserTime(10_000), &mut sink)
        .unwrap();
    app.tick(6300, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::WaitingForAnalysis);
    assert_eq!(app.config().riser_time_ms, 10_000);

    app.submit_analysis_result(false, 6400, &mut hw, &mut sink);
    app.tick(7400, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::Idle);

    // Second part: the raise now lasts 10 s.
    hw.present = true;
    app.tick(8000, &mut hw, &mut sink);
    app.tick(8300, &mut hw, &mut sink);
    hw.present = false;
    app.tick(11_300, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::Raising);

    app.tick(14_300, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::Raising);
    app.tick(21_299, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::Raising);
    app.tick(21_300, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::WaitingForAnalysis);
}

#[test]
fn disabling_analysis_mid_raise_lowers_without_request() {
    let (mut app, mut hw, mut sink) = setup(RouterConfig::default());
    hw.present = true;
    app.tick(0, &mut hw, &mut sink);
    app.tick(300, &mut hw, &mut sink);
    hw.present = false;
    app.tick(3300, &mut hw, &mut sink);

    app.update_config(ConfigUpdate::AnalysisMode(false), &mut sink)
        .unwrap();
    app.tick(6300, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::Lowering);
    assert_eq!(analysis_requests(&sink), 0);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::AnalysisSkipped)), 1);
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn valve_fault_mid_cycle_vents_everything_until_reset() {
    let (mut app, mut hw, mut sink) = setup(RouterConfig::default());
    hw.present = true;
    app.tick(0, &mut hw, &mut sink);
    app.tick(300, &mut hw, &mut sink);
    hw.present = false;
    app.tick(3300, &mut hw, &mut sink);
    assert!(hw.is_on(Actuator::Riser));

    hw.failing_valve = Some(Actuator::Riser);
    app.tick(6300, &mut hw, &mut sink);
    app.submit_analysis_result(true, 6400, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::Ejecting);

    // Ejecting exits to Lowering, whose riser release fails.
    app.tick(7400, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::Error);
    assert_eq!(app.fault_flags(), FaultKind::ActuatorWriteFailed.mask());
    assert!(!hw.is_on(Actuator::Ejection));
    assert!(hw.is_on(Actuator::Riser), "stuck valve still reported high");

    // The vent is retried every tick; once the pin recovers it lands.
    hw.failing_valve = None;
    app.tick(7410, &mut hw, &mut sink);
    assert!(!hw.is_on(Actuator::Riser));
    assert_eq!(app.state(), CycleState::Error);

    // Parts arriving while faulted are not processed.
    hw.present = true;
    app.tick(8000, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::Error);
}

#[test]
fn verdict_in_error_is_ignored() {
    let (mut app, mut hw, mut sink) = setup(RouterConfig::default());
    hw.sensor_fails = true;
    app.tick(10, &mut hw, &mut sink);
    assert_eq!(app.state(), CycleState::Error);

    let outcome = app.submit_analysis_result(true, 20, &mut hw, &mut sink);
    assert_eq!(outcome, Dispatch::Ignored(CycleState::Error));
    assert!(!hw.is_on(Actuator::Ejection));
}
