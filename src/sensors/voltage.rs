//! Load voltage sensor.
//!
//! Reads the divider output on ADC1 CH6 (12-bit, 0 dB attenuation) and
//! scales it to the reported voltage figure: `raw / 4 + 50`, integer
//! division.  The conversion runs with the scheduler suspended.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1_CH6 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static `AtomicU16` for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use crate::drivers::critical::SchedulerSuspendGuard;
#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

#[cfg(not(target_os = "espidf"))]
static SIM_VOLTAGE_ADC: AtomicU16 = AtomicU16::new(0);

/// Set by the sim read path when it observed the scheduler suspended.
#[cfg(not(target_os = "espidf"))]
static SIM_READ_GUARDED: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_voltage_adc(raw: u16) {
    SIM_VOLTAGE_ADC.store(raw, Ordering::Relaxed);
}

/// Whether the most recent sim ADC read ran under a suspension guard.
#[cfg(not(target_os = "espidf"))]
pub fn sim_last_read_guarded() -> bool {
    SIM_READ_GUARDED.load(Ordering::Relaxed)
}

/// Raw offset added after scaling.
const VOLTAGE_OFFSET: u16 = 50;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoltageReading {
    pub raw: u16,
    pub voltage: f32,
}

pub struct VoltageSensor {
    last: Option<VoltageReading>,
}

impl VoltageSensor {
    pub fn new() -> Self {
        Self { last: None }
    }

    pub fn read(&mut self) -> VoltageReading {
        let raw = {
            let _guard = SchedulerSuspendGuard::new();
            self.read_adc()
        };
        let reading = VoltageReading {
            raw,
            voltage: raw_to_voltage(raw),
        };
        self.last = Some(reading);
        reading
    }

    /// Most recent reading, if any.
    pub fn last(&self) -> Option<VoltageReading> {
        self.last
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> u16 {
        hw_init::adc1_read(hw_init::ADC1_CH_VOLTAGE)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> u16 {
        SIM_READ_GUARDED.store(crate::drivers::critical::is_suspended(), Ordering::Relaxed);
        SIM_VOLTAGE_ADC.load(Ordering::Relaxed)
    }
}

impl Default for VoltageSensor {
    fn default() -> Self {
        Self::new()
    }
}

pub fn raw_to_voltage(raw: u16) -> f32 {
    f32::from(raw / 4 + VOLTAGE_OFFSET)
}
