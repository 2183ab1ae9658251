//! Six-relay resistor bank driver.
//!
//! Relay 0 selects the discrete bank (HIGH) or the continuous path
//! (LOW).  Relays 1–5 switch the resistor combination.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the relay GPIOs via hw_init helpers.
//! On host/test: tracks levels in-memory only.

use crate::drivers::hw_init;
use crate::encoder::RelayPattern;
use crate::pins;

pub struct RelayBank {
    bank_select: bool,
    lines: [bool; 5],
}

impl RelayBank {
    /// All relays start released, matching the power-on pin state.
    pub fn new() -> Self {
        Self {
            bank_select: false,
            lines: [false; 5],
        }
    }

    /// Drive relay 0 per the pattern; relays 1–5 only when it carries levels.
    pub fn apply(&mut self, pattern: RelayPattern) {
        self.bank_select = pattern.bank_select();
        hw_init::gpio_write(pins::RELAY_BANK_SELECT_GPIO, self.bank_select);

        if let Some(lines) = pattern.lines() {
            self.lines = lines.levels();
            for (&gpio, &high) in pins::RELAY_LINE_GPIOS.iter().zip(self.lines.iter()) {
                hw_init::gpio_write(gpio, high);
            }
        }
    }

    pub fn bank_select(&self) -> bool {
        self.bank_select
    }

    /// Current levels of relays 1–5.
    pub fn lines(&self) -> [bool; 5] {
        self.lines
    }
}

impl Default for RelayBank {
    fn default() -> Self {
        Self::new()
    }
}
