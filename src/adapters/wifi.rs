//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`], the hexagonal boundary for network
//! connectivity.  Each `connect()` is a single bounded attempt; retry
//! policy belongs to the comms loop.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.

use log::{info, warn};

use crate::app::ports::{ConnectivityError, ConnectivityPort};
use crate::config::Credentials;

/// Link status poll period during a connect attempt.
#[cfg(target_os = "espidf")]
const POLL_MS: u32 = 50;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() {
        return Err(ConnectivityError::NoCredentials);
    }
    if ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    attempts: u32,
    #[cfg(target_os = "espidf")]
    wifi: esp_idf_svc::wifi::EspWifi<'static>,
    #[cfg(target_os = "espidf")]
    configured: bool,
    /// Simulation: link level and scripted failures.
    #[cfg(not(target_os = "espidf"))]
    sim_up: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_fail_next: u32,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(
        modem: esp_idf_hal::modem::Modem,
        sysloop: esp_idf_svc::eventloop::EspSystemEventLoop,
        nvs: Option<esp_idf_svc::nvs::EspDefaultNvsPartition>,
        credentials: &Credentials,
    ) -> Result<Self, ConnectivityError> {
        let wifi = esp_idf_svc::wifi::EspWifi::new(modem, sysloop, nvs).map_err(|e| {
            log::error!("WiFi: driver init failed: {:?}", e);
            ConnectivityError::ConnectionFailed
        })?;
        Ok(Self {
            ssid: credentials.wifi_ssid.clone(),
            password: credentials.wifi_password.clone(),
            attempts: 0,
            wifi,
            configured: false,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            ssid: credentials.wifi_ssid.clone(),
            password: credentials.wifi_password.clone(),
            attempts: 0,
            sim_up: false,
            sim_fail_next: 0,
        }
    }

    /// Connect attempts made so far, successful or not.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, timeout_ms: u32) -> Result<(), ConnectivityError> {
        use esp_idf_hal::delay::FreeRtos;
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        if !self.configured {
            let auth_method = if self.password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            };
            let config = Configuration::Client(ClientConfiguration {
                ssid: self
                    .ssid
                    .as_str()
                    .try_into()
                    .map_err(|_| ConnectivityError::InvalidSsid)?,
                password: self
                    .password
                    .as_str()
                    .try_into()
                    .map_err(|_| ConnectivityError::InvalidPassword)?,
                auth_method,
                ..Default::default()
            });
            self.wifi
                .set_configuration(&config)
                .map_err(|_| ConnectivityError::ConnectionFailed)?;
            self.wifi
                .start()
                .map_err(|_| ConnectivityError::ConnectionFailed)?;
            self.configured = true;
        }

        self.wifi
            .connect()
            .map_err(|_| ConnectivityError::ConnectionFailed)?;

        let mut waited = 0;
        while waited < timeout_ms {
            if self.wifi.is_up().unwrap_or(false) {
                return Ok(());
            }
            FreeRtos::delay_ms(POLL_MS);
            waited += POLL_MS;
        }

        // Abandon this attempt so the next connect() starts clean.
        let _ = self.wifi.disconnect();
        Err(ConnectivityError::Timeout)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, _timeout_ms: u32) -> Result<(), ConnectivityError> {
        if self.sim_fail_next > 0 {
            self.sim_fail_next -= 1;
            return Err(ConnectivityError::Timeout);
        }
        self.sim_up = true;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_up
    }
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    /// Make the next `n` connect attempts time out.
    pub fn sim_fail_next(&mut self, n: u32) {
        self.sim_fail_next = n;
    }

    /// Drop the link as if the AP went away.
    pub fn sim_drop_link(&mut self) {
        self.sim_up = false;
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self, timeout_ms: u32) -> Result<(), ConnectivityError> {
        validate_ssid(&self.ssid)?;
        validate_password(&self.password)?;

        self.attempts = self.attempts.saturating_add(1);
        info!("WiFi: connecting to '{}' (attempt {})", self.ssid, self.attempts);

        match self.platform_connect(timeout_ms) {
            Ok(()) => {
                info!("WiFi: connected");
                Ok(())
            }
            Err(e) => {
                warn!("WiFi: {}", e);
                Err(e)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
