//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the voltage sensor and every output driver, exposing them
//! through [`SensorPort`] and [`OutputPort`].  This is the only module
//! in the system that touches actual hardware.  On non-espidf targets,
//! the underlying drivers use cfg-gated simulation stubs.

use crate::app::ports::{OutputPort, SensorPort};
use crate::config::DeviceConfig;
use crate::drivers::dimmer::Dimmer;
use crate::drivers::relay_bank::RelayBank;
use crate::drivers::status_led::StatusLed;
use crate::encoder::RelayPattern;
use crate::sensors::voltage::VoltageSensor;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    voltage: VoltageSensor,
    relays: RelayBank,
    dimmer: Dimmer,
    led: StatusLed,
}

impl HardwareAdapter {
    /// Mirror the power-on levels programmed by `hw_init`.
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            voltage: VoltageSensor::new(),
            relays: RelayBank::new(),
            dimmer: Dimmer::new(config.initial_brightness),
            led: StatusLed::new(config.indicator_on),
        }
    }

    pub fn relays(&self) -> &RelayBank {
        &self.relays
    }

    pub fn brightness(&self) -> u8 {
        self.dimmer.duty()
    }

    pub fn indicator_on(&self) -> bool {
        self.led.is_on()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for HardwareAdapter {
    fn sample_voltage(&mut self) -> f32 {
        self.voltage.read().voltage
    }
}

// ── OutputPort implementation ─────────────────────────────────

impl OutputPort for HardwareAdapter {
    fn apply_relays(&mut self, pattern: RelayPattern) {
        self.relays.apply(pattern);
    }

    fn set_brightness(&mut self, level: u8) {
        self.dimmer.set(level);
    }

    fn set_indicator(&mut self, on: bool) {
        self.led.set(on);
    }
}
