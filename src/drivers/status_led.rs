//! On-board indicator LED driver.
//!
//! A plain GPIO output, toggled by the `update` remote method.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the LED pin via hw_init.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::pins;

pub struct StatusLed {
    on: bool,
}

impl StatusLed {
    pub fn new(on: bool) -> Self {
        Self { on }
    }

    pub fn set(&mut self, on: bool) {
        hw_init::gpio_write(pins::ONBOARD_LED_GPIO, on);
        self.on = on;
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}
