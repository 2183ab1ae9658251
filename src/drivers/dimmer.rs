//! Brightness dimmer driver.
//!
//! One LEDC PWM channel (CH0, 10 kHz) on the dimmer pin.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: writes the LEDC duty via hw_init.
//! On host/test: tracks the duty in-memory only.

use crate::drivers::hw_init;

pub struct Dimmer {
    duty: u8,
}

impl Dimmer {
    /// `initial` must match the duty hw_init programmed at boot.
    pub fn new(initial: u8) -> Self {
        Self { duty: initial }
    }

    pub fn set(&mut self, duty: u8) {
        hw_init::ledc_set(hw_init::LEDC_CH_DIMMER, duty);
        self.duty = duty;
    }

    pub fn duty(&self) -> u8 {
        self.duty
    }
}
