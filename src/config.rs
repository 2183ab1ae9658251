//! Device configuration parameters
//!
//! All tunable parameters for the load-control core.  Nothing here is
//! persisted: every boot starts from [`DeviceConfig::default`] and the
//! remote `start`/`stop`/`interval` methods adjust the live state only.

use core::fmt;

use serde::{Deserialize, Serialize};

/// How out-of-range brightness requests are handled by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrightnessPolicy {
    /// Saturate to `0..=255`.
    Clamp,
    /// Refuse the whole `data` command with status 400.
    Reject,
}

/// Core device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    // --- Telemetry ---
    /// Milliseconds between telemetry messages
    pub telemetry_interval_ms: u32,
    /// Whether telemetry is published from boot, before any `start`
    pub sending_enabled: bool,

    // --- Timing ---
    /// Comms loop polling period (milliseconds)
    pub poll_period_ms: u32,
    /// Bounded timeout for a single WiFi connect attempt (milliseconds)
    pub connect_timeout_ms: u32,

    // --- Outputs ---
    /// Dimmer LEDC frequency (Hz)
    pub pwm_freq_hz: u32,
    /// Dimmer LEDC duty resolution (bits)
    pub pwm_resolution_bits: u32,
    /// Duty written to the dimmer at power-on
    pub initial_brightness: u8,
    pub brightness_policy: BrightnessPolicy,
    /// On-board LED level at power-on
    pub indicator_on: bool,

    // --- Messaging ---
    /// Model identifier reported to the IoT hub
    pub model_id: heapless::String<32>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        let mut model_id = heapless::String::new();
        let _ = model_id.push_str("ENEE101-ESP32");

        Self {
            telemetry_interval_ms: 2000,
            sending_enabled: true,

            poll_period_ms: 100,
            connect_timeout_ms: 10_000,

            pwm_freq_hz: crate::pins::DIMMER_PWM_FREQ_HZ,
            pwm_resolution_bits: crate::pins::PWM_RESOLUTION_BITS,
            initial_brightness: 255,
            brightness_policy: BrightnessPolicy::Clamp,
            indicator_on: false,

            model_id,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

/// Network and hub credentials, baked in at build time.
///
/// Set `LOADCTL_WIFI_SSID`, `LOADCTL_WIFI_PASSWORD` and
/// `LOADCTL_CONNECTION_STRING` in the build environment.
#[derive(Clone, Default)]
pub struct Credentials {
    pub wifi_ssid: heapless::String<32>,
    pub wifi_password: heapless::String<64>,
    pub connection_string: heapless::String<256>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsError {
    SsidTooLong,
    PasswordTooLong,
    ConnectionStringTooLong,
}

impl fmt::Display for CredentialsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SsidTooLong => write!(f, "SSID longer than 32 bytes"),
            Self::PasswordTooLong => write!(f, "WiFi password longer than 64 bytes"),
            Self::ConnectionStringTooLong => write!(f, "connection string longer than 256 bytes"),
        }
    }
}

impl Credentials {
    pub fn new(ssid: &str, password: &str, connection_string: &str) -> Result<Self, CredentialsError> {
        let mut c = Self::default();
        c.wifi_ssid
            .push_str(ssid)
            .map_err(|_| CredentialsError::SsidTooLong)?;
        c.wifi_password
            .push_str(password)
            .map_err(|_| CredentialsError::PasswordTooLong)?;
        c.connection_string
            .push_str(connection_string)
            .map_err(|_| CredentialsError::ConnectionStringTooLong)?;
        Ok(c)
    }

    /// Credentials captured from the build environment (empty if unset).
    pub fn from_build_env() -> Result<Self, CredentialsError> {
        Self::new(
            option_env!("LOADCTL_WIFI_SSID").unwrap_or(""),
            option_env!("LOADCTL_WIFI_PASSWORD").unwrap_or(""),
            option_env!("LOADCTL_CONNECTION_STRING").unwrap_or(""),
        )
    }
}

// Never print secrets.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("wifi_ssid", &self.wifi_ssid)
            .field("wifi_password", &"<redacted>")
            .field("connection_string", &"<redacted>")
            .finish()
    }
}
