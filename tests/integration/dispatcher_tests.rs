//! Integration tests for the remote-method → dispatcher → outputs chain.

use crate::mock_hw::{MockHardware, OutputCall};

use loadctl::adapters::hardware::HardwareAdapter;
use loadctl::app::commands::CommandEnvelope;
use loadctl::app::dispatcher::CommandDispatcher;
use loadctl::app::events::CommandResponse;
use loadctl::app::state::DeviceState;
use loadctl::config::{BrightnessPolicy, DeviceConfig};
use loadctl::encoder::{BankLines, RelayPattern};

fn invoke(
    dispatcher: &CommandDispatcher,
    state: &mut DeviceState,
    hw: &mut MockHardware,
    name: &str,
    payload: &str,
) -> CommandResponse {
    dispatcher.handle(&CommandEnvelope::new(name, payload.as_bytes()), state, hw)
}

fn setup() -> (CommandDispatcher, DeviceState, MockHardware) {
    let config = DeviceConfig::default();
    (
        CommandDispatcher::new(&config),
        DeviceState::new(&config),
        MockHardware::new(),
    )
}

// ── Telemetry control ─────────────────────────────────────────

#[test]
fn stop_then_start_toggles_sending() {
    let (d, mut state, mut hw) = setup();

    let r = invoke(&d, &mut state, &mut hw, "stop", "");
    assert_eq!(r.status, 200);
    assert!(!state.sending_enabled());

    let r = invoke(&d, &mut state, &mut hw, "start", "");
    assert_eq!(r.body, br#"{"status":200}"#);
    assert!(state.sending_enabled());
    assert!(hw.calls.is_empty(), "start/stop never touch outputs");
}

#[test]
fn repeated_start_is_idempotent() {
    let (d, mut state, mut hw) = setup();

    for _ in 0..2 {
        let r = invoke(&d, &mut state, &mut hw, "start", "");
        assert_eq!(r.status, 200);
        assert!(state.sending_enabled());
    }
    assert_eq!(state, DeviceState::new(&DeviceConfig::default()));
    assert!(hw.calls.is_empty());
}

#[test]
fn interval_changes_period() {
    let (d, mut state, mut hw) = setup();
    let r = invoke(&d, &mut state, &mut hw, "interval", r#"{"interval":5000}"#);
    assert_eq!(r.status, 200);
    assert_eq!(state.interval_ms(), 5000);
}

#[test]
fn malformed_interval_is_rejected_without_side_effects() {
    let (d, mut state, mut hw) = setup();
    let before = state.clone();

    for payload in ["", "{}", "[7]", r#"{"interval":"fast"}"#, r#"{"interval":-5}"#] {
        let r = invoke(&d, &mut state, &mut hw, "interval", payload);
        assert_eq!(r.status, 400, "payload {payload:?}");
    }
    assert_eq!(state, before);
}

#[test]
fn unknown_method_returns_404() {
    let (d, mut state, mut hw) = setup();
    let before = state.clone();

    let r = invoke(&d, &mut state, &mut hw, "frobulate", "{}");
    assert_eq!(r.status, 404);
    assert_eq!(r.body, br#"{"status":404}"#);
    assert_eq!(state, before);
    assert!(hw.calls.is_empty());
}

// ── Indicator ─────────────────────────────────────────────────

#[test]
fn update_toggles_indicator_each_call() {
    let (d, mut state, mut hw) = setup();

    invoke(&d, &mut state, &mut hw, "update", "");
    assert_eq!(hw.indicator(), Some(true));
    invoke(&d, &mut state, &mut hw, "update", "");
    assert_eq!(hw.indicator(), Some(false));
    assert!(!state.led_on());
}

#[test]
fn pwm_is_accepted_and_ignored() {
    let (d, mut state, mut hw) = setup();
    let r = invoke(&d, &mut state, &mut hw, "pwm", r#"{"duty":10}"#);
    assert_eq!(r.status, 200);
    assert!(hw.calls.is_empty());
}

// ── Load selection ────────────────────────────────────────────

#[test]
fn data_with_breakpoint_drives_relays_and_dimmer() {
    let (d, mut state, mut hw) = setup();
    let r = invoke(
        &d,
        &mut state,
        &mut hw,
        "data",
        r#"{"resistance":47,"brightness":128}"#,
    );

    assert_eq!(r.status, 200);
    assert_eq!(
        hw.calls,
        vec![
            OutputCall::Relays(RelayPattern::Discrete(BankLines::from_mask(0b00010))),
            OutputCall::Brightness(128),
        ]
    );
}

#[test]
fn unmapped_resistance_keeps_lines_and_reports_422() {
    let config = DeviceConfig::default();
    let d = CommandDispatcher::new(&config);
    let mut state = DeviceState::new(&config);
    let mut hw = HardwareAdapter::new(&config);

    let env = CommandEnvelope::new("data", r#"{"resistance":9,"brightness":10}"#);
    assert_eq!(d.handle(&env, &mut state, &mut hw).status, 200);
    let lines = hw.relays().lines();

    let env = CommandEnvelope::new("data", r#"{"resistance":12,"brightness":20}"#);
    let r = d.handle(&env, &mut state, &mut hw);
    assert_eq!(r.status, 422);
    assert!(hw.relays().bank_select());
    assert_eq!(hw.relays().lines(), lines);
    assert_eq!(hw.brightness(), 20);
}

#[test]
fn continuous_resistance_releases_bank_and_reports_501() {
    let (d, mut state, mut hw) = setup();
    let r = invoke(
        &d,
        &mut state,
        &mut hw,
        "data",
        r#"{"resistance":25000,"brightness":64}"#,
    );
    assert_eq!(r.status, 501);
    assert_eq!(hw.calls[0], OutputCall::Relays(RelayPattern::Continuous));
    assert_eq!(hw.brightness(), Some(64));
}

#[test]
fn malformed_data_has_no_side_effects() {
    let (d, mut state, mut hw) = setup();
    for payload in [
        "",
        "not json",
        "[47, 10]",
        r#"{"resistance":47}"#,
        r#"{"brightness":47}"#,
        r#"{"resistance":"47","brightness":1}"#,
        r#"{"resistance":null,"brightness":1}"#,
    ] {
        let r = invoke(&d, &mut state, &mut hw, "data", payload);
        assert_eq!(r.status, 400, "payload {payload:?}");
    }
    assert!(hw.calls.is_empty());
}

#[test]
fn brightness_clamps_by_default() {
    let (d, mut state, mut hw) = setup();
    invoke(&d, &mut state, &mut hw, "data", r#"{"resistance":4,"brightness":300}"#);
    assert_eq!(hw.brightness(), Some(255));
    invoke(&d, &mut state, &mut hw, "data", r#"{"resistance":4,"brightness":-3}"#);
    assert_eq!(hw.brightness(), Some(0));
    invoke(&d, &mut state, &mut hw, "data", r#"{"resistance":4,"brightness":99.9}"#);
    assert_eq!(hw.brightness(), Some(99));
}

#[test]
fn brightness_reject_policy_refuses_out_of_range() {
    let config = DeviceConfig {
        brightness_policy: BrightnessPolicy::Reject,
        ..DeviceConfig::default()
    };
    let d = CommandDispatcher::new(&config);
    let mut state = DeviceState::new(&config);
    let mut hw = MockHardware::new();

    let r = invoke(&d, &mut state, &mut hw, "data", r#"{"resistance":4,"brightness":256}"#);
    assert_eq!(r.status, 400);
    assert!(hw.calls.is_empty());

    let r = invoke(&d, &mut state, &mut hw, "data", r#"{"resistance":4,"brightness":255}"#);
    assert_eq!(r.status, 200);
    assert_eq!(hw.brightness(), Some(255));
}
