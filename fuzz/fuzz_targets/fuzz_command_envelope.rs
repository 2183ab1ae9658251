//! Fuzz target: `CommandDispatcher::handle`
//!
//! Splits the input into a method name and a payload and drives it
//! through the dispatcher.  Asserts that it never panics, always answers
//! with a known status, and leaves the state untouched on rejection.
//!
//! cargo fuzz run fuzz_command_envelope

#![no_main]

use libfuzzer_sys::fuzz_target;
use loadctl::app::commands::{Command, CommandEnvelope};
use loadctl::app::dispatcher::CommandDispatcher;
use loadctl::app::state::DeviceState;
use loadctl::adapters::hardware::HardwareAdapter;
use loadctl::config::DeviceConfig;

const NAMES: [&str; 7] = ["start", "stop", "update", "pwm", "interval", "data", "frobulate"];

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else { return };

    let config = DeviceConfig::default();
    let dispatcher = CommandDispatcher::new(&config);
    let mut state = DeviceState::new(&config);
    let mut hw = HardwareAdapter::new(&config);
    let before = state.clone();

    let env = CommandEnvelope::new(NAMES[selector as usize % NAMES.len()], payload);
    let parsed = Command::parse(&env);
    let resp = dispatcher.handle(&env, &mut state, &mut hw);

    assert!(matches!(resp.status, 200 | 400 | 404 | 422 | 501));
    if parsed.is_err() {
        assert_eq!(state, before, "rejected command changed state");
        assert!(!hw.relays().bank_select(), "rejected command drove relays");
    }
});
