//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ CommandDispatcher / CommsLoop (domain)
//! ```
//!
//! Driven adapters (relay bank, dimmer, ADC, WiFi, IoT hub client, clock)
//! implement these traits.  The domain consumes them via generics, so the
//! core never touches hardware or sockets directly.

use core::fmt;

use crate::encoder::RelayPattern;

use super::commands::CommandEnvelope;
use super::events::CommandResponse;

// ───────────────────────────────────────────────────────────────
// Output port (driven adapter: domain → relays / PWM / indicator)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to drive outputs.
pub trait OutputPort {
    /// Drive relay 0 and, when the pattern carries them, relays 1–5.
    /// Lines the pattern does not carry keep their current level.
    fn apply_relays(&mut self, pattern: RelayPattern);

    /// Set the dimmer duty (0–255).
    fn set_brightness(&mut self, level: u8);

    /// Set the on-board indicator LED.
    fn set_indicator(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain the load voltage.
pub trait SensorPort {
    /// Sample the voltage channel.  Implementations must suspend task
    /// preemption for the duration of the conversion.
    fn sample_voltage(&mut self) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Connectivity port (driven adapter: domain ↔ WiFi station)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    /// The link did not come up within the attempt's timeout.
    Timeout,
    ConnectionFailed,
}

impl ConnectivityError {
    /// Credential problems never clear on their own; link problems might.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::ConnectionFailed)
    }
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::Timeout => write!(f, "WiFi connect timed out"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

pub trait ConnectivityPort {
    /// One connection attempt, blocking for at most `timeout_ms`.
    fn connect(&mut self, timeout_ms: u32) -> Result<(), ConnectivityError>;

    /// Current link status as reported by the driver.
    fn is_connected(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Messaging port (driven adapter: domain ↔ IoT hub)
// ───────────────────────────────────────────────────────────────

/// Delivery outcome reported for a published telemetry message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendConfirmation {
    Ok,
    Error,
}

/// Kind of device-twin document received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwinUpdate {
    /// Full twin document (response to a twin GET).
    Complete,
    /// Desired-properties patch.
    Partial,
}

/// Callbacks the messaging transport delivers during [`MessagingPort::check`].
///
/// All four run synchronously on the caller's thread.
pub trait MessagingHandler {
    fn on_send_confirmation(&mut self, result: SendConfirmation);

    /// Cloud-to-device message.
    fn on_message(&mut self, payload: &[u8]);

    fn on_twin_update(&mut self, update: TwinUpdate, payload: &[u8]);

    /// Remote method invocation; the returned response is sent back to
    /// the invoker by the transport.
    fn on_method(&mut self, envelope: &CommandEnvelope) -> CommandResponse;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagingError {
    /// Connection string is missing a required key or is malformed.
    InvalidCredentials(&'static str),
    /// Transport has not been initialised yet.
    NotInitialised,
    /// Client could not be created or subscribed.
    InitFailed,
    PublishFailed,
}

impl fmt::Display for MessagingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials(why) => write!(f, "invalid connection string: {}", why),
            Self::NotInitialised => write!(f, "messaging transport not initialised"),
            Self::InitFailed => write!(f, "messaging transport init failed"),
            Self::PublishFailed => write!(f, "publish failed"),
        }
    }
}

pub trait MessagingPort {
    /// Create the client from `connection_string` and register for method,
    /// twin and cloud-to-device traffic.  Called once per process.
    fn init(&mut self, connection_string: &str) -> Result<(), MessagingError>;

    /// Publish a telemetry payload.
    fn publish(&mut self, payload: &[u8]) -> Result<(), MessagingError>;

    /// Deliver every pending inbound event to `handler`.
    fn check(&mut self, handler: &mut dyn MessagingHandler);
}
