//! Integration tests for the comms loop: telemetry pacing, link
//! recovery and method delivery through the messaging callbacks.

use crate::mock_hw::{Inbound, ManualClock, MockHardware, MockHub, MockLink};

use loadctl::adapters::hardware::HardwareAdapter;
use loadctl::adapters::iothub::IotHubAdapter;
use loadctl::adapters::wifi::WifiAdapter;
use loadctl::app::ports::{Clock, SendConfirmation, TwinUpdate};
use loadctl::comms::{CommsLoop, LinkState};
use loadctl::config::{Credentials, DeviceConfig};
use loadctl::sensors::voltage;

const CS: &str = "HostName=h.azure-devices.net;DeviceId=dev1;SharedAccessSignature=sig";

fn credentials() -> Credentials {
    Credentials::new("LabNet", "password123", CS).unwrap()
}

/// Comms loop brought up at t = 0 against mocks.
fn connected() -> (CommsLoop, ManualClock, MockLink, MockHub, MockHardware) {
    let clock = ManualClock::at(0);
    let mut link = MockLink::default();
    let mut hub = MockHub::default();
    let mut comms = CommsLoop::new(&DeviceConfig::default(), &credentials());
    comms.establish(&clock, &mut link, &mut hub);
    (comms, clock, link, hub, MockHardware::new())
}

// ── Bring-up ──────────────────────────────────────────────────

#[test]
fn establish_retries_with_bounded_timeout() {
    let clock = ManualClock::at(0);
    let mut link = MockLink {
        fail_next: 2,
        ..Default::default()
    };
    let mut hub = MockHub::default();
    let mut comms = CommsLoop::new(&DeviceConfig::default(), &credentials());

    comms.establish(&clock, &mut link, &mut hub);

    assert_eq!(link.attempts, 3);
    assert!(link.timeouts.iter().all(|&t| t == 10_000));
    assert_eq!(hub.inits, 1);
    assert_eq!(hub.connection_strings, vec![CS.to_owned()]);
    assert_eq!(comms.link_state(), LinkState::Connected);
}

#[test]
fn missing_wifi_credentials_never_stop_the_loop() {
    let config = DeviceConfig::default();
    let clock = ManualClock::at(0);
    let creds = Credentials::new("", "", CS).unwrap();
    let mut wifi = WifiAdapter::new(&creds);
    let mut hub = IotHubAdapter::new(&config.model_id);
    let mut hw = HardwareAdapter::new(&config);
    let mut comms = CommsLoop::new(&config, &creds);

    comms.establish(&clock, &mut wifi, &mut hub);
    assert_eq!(comms.link_state(), LinkState::Disconnected);
    assert!(!comms.transport_ready());

    for _ in 0..5 {
        comms.tick(clock.advance(100), &mut wifi, &mut hub, &mut hw);
    }
    assert_eq!(comms.link_state(), LinkState::Disconnected);
    assert_eq!(hub.sim_opens(), 0);
}

// ── Telemetry pacing ──────────────────────────────────────────

#[test]
fn telemetry_ids_increase_every_interval() {
    let (mut comms, clock, mut link, mut hub, mut hw) = connected();
    hw.voltage = 81.0;

    comms.tick(clock.advance(1999), &mut link, &mut hub, &mut hw);
    assert!(hub.published.is_empty());

    comms.tick(clock.advance(1), &mut link, &mut hub, &mut hw);
    comms.tick(clock.advance(2000), &mut link, &mut hub, &mut hw);

    let msgs = hub.published_json();
    assert_eq!(msgs.len(), 2);
    assert_eq!(msgs[0]["messageId"], 1);
    assert_eq!(msgs[1]["messageId"], 2);
    assert_eq!(msgs[0]["voltage"].as_f64(), Some(81.0));
    assert_eq!(hw.samples, 2);
}

#[test]
fn stop_suppresses_telemetry_until_start() {
    let (mut comms, clock, mut link, mut hub, mut hw) = connected();

    hub.invoke("stop", "");
    comms.tick(clock.advance(100), &mut link, &mut hub, &mut hw);
    comms.tick(clock.advance(5000), &mut link, &mut hub, &mut hw);
    assert!(hub.published.is_empty());
    assert_eq!(hw.samples, 0);

    hub.invoke("start", "");
    comms.tick(clock.advance(100), &mut link, &mut hub, &mut hw);
    comms.tick(clock.advance(100), &mut link, &mut hub, &mut hw);
    assert_eq!(hub.published.len(), 1);
    assert_eq!(hub.published_json()[0]["messageId"], 1);
}

#[test]
fn interval_command_changes_pacing() {
    let (mut comms, clock, mut link, mut hub, mut hw) = connected();

    hub.invoke("interval", r#"{"interval":5000}"#);
    comms.tick(clock.advance(100), &mut link, &mut hub, &mut hw);
    assert_eq!(hub.last_response().unwrap().status, 200);

    comms.tick(clock.advance(2000), &mut link, &mut hub, &mut hw);
    assert!(hub.published.is_empty());

    comms.tick(clock.advance(2900), &mut link, &mut hub, &mut hw);
    assert_eq!(hub.published.len(), 1);
}

#[test]
fn publish_failure_still_consumes_id() {
    let (mut comms, clock, mut link, mut hub, mut hw) = connected();
    hub.fail_publish = true;
    comms.tick(clock.advance(2000), &mut link, &mut hub, &mut hw);
    hub.fail_publish = false;
    comms.tick(clock.advance(2000), &mut link, &mut hub, &mut hw);

    assert_eq!(hub.published_json()[0]["messageId"], 2);
}

// ── Link recovery ─────────────────────────────────────────────

#[test]
fn link_loss_reconnects_instead_of_publishing() {
    let (mut comms, clock, mut link, mut hub, mut hw) = connected();

    link.up = false;
    link.unreachable = true;
    comms.tick(clock.advance(100), &mut link, &mut hub, &mut hw);
    assert_eq!(comms.link_state(), LinkState::Disconnected);
    let checks = hub.checks;

    let attempts = link.attempts;
    comms.tick(clock.advance(5000), &mut link, &mut hub, &mut hw);
    assert!(hub.published.is_empty());
    assert_eq!(link.attempts, attempts + 1);
    assert_eq!(hub.checks, checks, "no polling while the link is down");

    link.unreachable = false;
    comms.tick(clock.advance(100), &mut link, &mut hub, &mut hw);
    assert_eq!(comms.link_state(), LinkState::Connected);
    assert!(hub.published.is_empty());

    comms.tick(clock.advance(100), &mut link, &mut hub, &mut hw);
    assert_eq!(hub.published.len(), 1);
    assert_eq!(hub.inits, 1, "transport initialised exactly once");
}

// ── Callbacks ─────────────────────────────────────────────────

#[test]
fn non_method_callbacks_leave_state_alone() {
    let (mut comms, clock, mut link, mut hub, mut hw) = connected();
    let before = comms.state().clone();

    hub.inbound.push_back(Inbound::Confirmation(SendConfirmation::Ok));
    hub.inbound.push_back(Inbound::Confirmation(SendConfirmation::Error));
    hub.inbound.push_back(Inbound::Message(b"hello".to_vec()));
    hub.inbound.push_back(Inbound::Twin(TwinUpdate::Partial, b"{}".to_vec()));
    comms.tick(clock.advance(10), &mut link, &mut hub, &mut hw);

    assert!(hub.inbound.is_empty());
    assert_eq!(comms.state(), &before);
    assert!(hw.calls.is_empty());
}

#[test]
fn unknown_method_answered_with_404() {
    let (mut comms, clock, mut link, mut hub, mut hw) = connected();
    hub.invoke("frobulate", "{}");
    comms.tick(clock.advance(10), &mut link, &mut hub, &mut hw);
    assert_eq!(hub.last_response().unwrap().status, 404);
}

// ── End to end on the simulated adapters ──────────────────────

#[test]
fn simulated_board_samples_suspended_and_replies_on_hub() {
    let config = DeviceConfig::default();
    let clock = ManualClock::at(0);
    let mut wifi = WifiAdapter::new(&credentials());
    let mut hub = IotHubAdapter::new(&config.model_id);
    let mut hw = HardwareAdapter::new(&config);
    let mut comms = CommsLoop::new(&config, &credentials());

    voltage::sim_set_voltage_adc(400);
    comms.establish(&clock, &mut wifi, &mut hub);

    hub.sim_invoke_method("data", "7", br#"{"resistance":36,"brightness":200}"#);
    comms.tick(clock.advance(2000), &mut wifi, &mut hub, &mut hw);

    assert!(voltage::sim_last_read_guarded());
    assert_eq!(hw.relays().lines(), [false, false, false, true, true]);
    assert_eq!(hw.brightness(), 200);

    let outbox = hub.sim_outbox().to_vec();
    let telemetry = outbox
        .iter()
        .find(|(t, _)| t == "devices/dev1/messages/events/")
        .unwrap();
    let v: serde_json::Value = serde_json::from_slice(&telemetry.1).unwrap();
    assert_eq!(v["messageId"], 1);
    assert_eq!(v["voltage"].as_f64(), Some(150.0));

    let (topic, body) = outbox.last().unwrap();
    assert_eq!(topic, "$iothub/methods/res/200/?$rid=7");
    assert_eq!(body, br#"{"status":200}"#);

    wifi.sim_drop_link();
    comms.tick(clock.advance(10), &mut wifi, &mut hub, &mut hw);
    comms.tick(clock.now_ms() + 10, &mut wifi, &mut hub, &mut hw);
    assert_eq!(comms.link_state(), LinkState::Connected);
    assert_eq!(hub.sim_opens(), 1);
}
