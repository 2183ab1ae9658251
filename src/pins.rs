//! GPIO / peripheral pin assignments for the load-control board (ESP32-WROOM).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Relay bank
// ---------------------------------------------------------------------------

/// Relay 0: selects the discrete resistor bank (HIGH) or the continuous
/// potentiometer path (LOW).
pub const RELAY_BANK_SELECT_GPIO: i32 = 12;

/// Relays 1–5: resistor combination lines, in pattern order.
pub const RELAY_LINE_GPIOS: [i32; 5] = [25, 26, 27, 32, 33];

/// Total relay outputs driven by the board (bank select + pattern lines).
pub const RELAY_COUNT: usize = 1 + RELAY_LINE_GPIOS.len();

// ---------------------------------------------------------------------------
// Dimmer (LEDC PWM)
// ---------------------------------------------------------------------------

/// PWM output feeding the brightness stage.
pub const DIMMER_PWM_GPIO: i32 = 4;
/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC base frequency for the dimmer (10 kHz).
pub const DIMMER_PWM_FREQ_HZ: u32 = 10_000;

// ---------------------------------------------------------------------------
// Voltage sense (ADC1)
// ---------------------------------------------------------------------------

/// Load voltage divider.  GPIO 34 is ADC1 channel 6 on the ESP32.
pub const VOLTAGE_ADC_GPIO: i32 = 34;

// ---------------------------------------------------------------------------
// Status indicator
// ---------------------------------------------------------------------------

/// On-board LED, toggled by the `update` remote method.
pub const ONBOARD_LED_GPIO: i32 = 2;
