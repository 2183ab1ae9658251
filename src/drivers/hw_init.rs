//! One-shot hardware peripheral initialization.
//!
//! Configures the voltage ADC channel, the relay and indicator GPIO
//! outputs, and the dimmer LEDC timer/channel using raw ESP-IDF sys calls.
//! Called once from `main()` before the comms task starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc) => write!(f, "LEDC timer/channel config failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

use crate::config::DeviceConfig;

/// Bring up every peripheral the core drives.  All relay lines start LOW.
#[cfg(target_os = "espidf")]
pub fn init_peripherals(config: &DeviceConfig) -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the comms task exists; single-threaded.
    unsafe {
        init_adc()?;
        init_gpio_outputs(config.indicator_on)?;
        init_ledc(config)?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(_config: &DeviceConfig) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

/// ADC1 channel wired to [`pins::VOLTAGE_ADC_GPIO`] (GPIO 34).
pub const ADC1_CH_VOLTAGE: u32 = 6;

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// comms-task sampling path.  `init_adc()` completes before the comms
/// task is spawned.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    // 0 dB attenuation: the divider keeps the sense node under ~1.1 V.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_0,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };

    let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), ADC1_CH_VOLTAGE, &chan_cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    info!("hw_init: ADC1 configured (CH{}=voltage, GPIO {})", ADC1_CH_VOLTAGE, pins::VOLTAGE_ADC_GPIO);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> u16 {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract: written once during init_adc()
    // before this function is reachable; comms-task access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return 0;
    }
    raw.max(0) as u16
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> u16 {
    0
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs(indicator_on: bool) -> Result<(), HwInitError> {
    let mut output_pins = [0i32; pins::RELAY_COUNT + 1];
    output_pins[0] = pins::RELAY_BANK_SELECT_GPIO;
    output_pins[1..pins::RELAY_COUNT].copy_from_slice(&pins::RELAY_LINE_GPIOS);
    output_pins[pins::RELAY_COUNT] = pins::ONBOARD_LED_GPIO;

    for &pin in &output_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
        unsafe { gpio_set_level(pin as gpio_num_t, 0) };
    }
    unsafe { gpio_set_level(pins::ONBOARD_LED_GPIO as gpio_num_t, u32::from(indicator_on)) };

    info!("hw_init: relay + indicator outputs configured (all relays LOW)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // pin was configured in init_gpio_outputs(). Comms task only.
    unsafe { gpio_set_level(pin as gpio_num_t, if high { 1 } else { 0 }); }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── LEDC PWM ─────────────────────────────────────────────────

pub const LEDC_CH_DIMMER: u32 = 0;

#[cfg(target_os = "espidf")]
unsafe fn init_ledc(config: &DeviceConfig) -> Result<(), HwInitError> {
    let initial_duty = config.initial_brightness;
    // Timer 0: dimmer (10 kHz, 8-bit by default)
    let timer0 = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: config.pwm_resolution_bits as ledc_timer_bit_t,
        freq_hz: config.pwm_freq_hz,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    let ret = unsafe { ledc_timer_config(&timer0) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcInitFailed(ret)); }

    let ret = unsafe { ledc_channel_config(&ledc_channel_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        channel: LEDC_CH_DIMMER,
        timer_sel: ledc_timer_t_LEDC_TIMER_0,
        gpio_num: pins::DIMMER_PWM_GPIO,
        duty: u32::from(initial_duty),
        hpoint: 0,
        ..Default::default()
    }) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcInitFailed(ret)); }

    info!(
        "hw_init: LEDC configured (dimmer=CH{}, {} Hz, {}-bit, duty {})",
        LEDC_CH_DIMMER, config.pwm_freq_hz, config.pwm_resolution_bits, initial_duty
    );
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u8) {
    // SAFETY: LEDC channel was configured in init_ledc(); duty register
    // writes are race-free since only the comms task calls this function.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, u32::from(duty));
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u32, _duty: u8) {}
