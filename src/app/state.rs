//! Live device state shared by the dispatcher and the comms loop.
//!
//! One instance exists per process.  The [`CommsLoop`](crate::comms::CommsLoop)
//! owns it and lends it by `&mut` to the dispatcher while inbound
//! messages are being polled, so there is always a single writer.

use crate::config::DeviceConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    sending_enabled: bool,
    interval_ms: u32,
    /// Identifier for the next telemetry message.  Starts at 1.
    message_counter: u64,
    led_on: bool,
}

impl DeviceState {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            sending_enabled: config.sending_enabled,
            interval_ms: config.telemetry_interval_ms,
            message_counter: 1,
            led_on: config.indicator_on,
        }
    }

    pub fn sending_enabled(&self) -> bool {
        self.sending_enabled
    }

    pub fn set_sending_enabled(&mut self, enabled: bool) {
        self.sending_enabled = enabled;
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn set_interval_ms(&mut self, interval_ms: u32) {
        self.interval_ms = interval_ms;
    }

    pub fn led_on(&self) -> bool {
        self.led_on
    }

    /// Flip the indicator and return the new level.
    pub fn toggle_led(&mut self) -> bool {
        self.led_on = !self.led_on;
        self.led_on
    }

    /// Identifier the next telemetry message will carry.
    pub fn peek_message_id(&self) -> u64 {
        self.message_counter
    }

    /// Take the next message identifier (post-increment).
    pub fn next_message_id(&mut self) -> u64 {
        let id = self.message_counter;
        self.message_counter = self.message_counter.saturating_add(1);
        id
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new(&DeviceConfig::default())
    }
}
