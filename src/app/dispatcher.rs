//! Command dispatcher: the remote-method state machine.
//!
//! ```text
//!  CommandEnvelope ──▶ Command::parse ──▶ ┌──────────────────┐ ──▶ DeviceState
//!                                         │ CommandDispatcher │
//!                     CommandResponse ◀── └──────────────────┘ ──▶ OutputPort
//! ```
//!
//! Dispatch is stateless: every effect lands either in the borrowed
//! [`DeviceState`] or on the [`OutputPort`].  It performs no network I/O
//! and completes before the transport callback that invoked it returns.

use log::{info, warn};

use crate::config::{BrightnessPolicy, DeviceConfig};
use crate::encoder::{self, RelayPattern};

use super::commands::{Command, CommandEnvelope};
use super::events::CommandResponse;
use super::ports::OutputPort;
use super::state::DeviceState;

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
/// `data` accepted, but the resistance has no wired combination.
pub const STATUS_UNMAPPED_RESISTANCE: u16 = 422;
/// `data` accepted, but continuous-mode control is not implemented.
pub const STATUS_CONTINUOUS_UNSUPPORTED: u16 = 501;

pub struct CommandDispatcher {
    brightness_policy: BrightnessPolicy,
}

impl CommandDispatcher {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            brightness_policy: config.brightness_policy,
        }
    }

    /// Handle one invocation and build the response for the invoker.
    pub fn handle(
        &self,
        envelope: &CommandEnvelope,
        state: &mut DeviceState,
        out: &mut impl OutputPort,
    ) -> CommandResponse {
        info!("Trying to invoke method '{}'", envelope.name);

        let status = match Command::parse(envelope) {
            Ok(cmd) => self.execute(cmd, state, out),
            Err(e) => {
                warn!("Rejected method '{}': {}", envelope.name, e);
                e.status()
            }
        };

        CommandResponse::with_status(status)
    }

    fn execute(&self, cmd: Command, state: &mut DeviceState, out: &mut impl OutputPort) -> u16 {
        match cmd {
            Command::Start => {
                state.set_sending_enabled(true);
                info!("Started sending telemetry messages");
                STATUS_OK
            }
            Command::Stop => {
                state.set_sending_enabled(false);
                info!("Stopped sending telemetry messages");
                STATUS_OK
            }
            Command::Update => {
                let on = state.toggle_led();
                out.set_indicator(on);
                info!("Toggled on-board LED ({})", if on { "on" } else { "off" });
                STATUS_OK
            }
            Command::Pwm => STATUS_OK,
            Command::Interval { interval_ms } => {
                state.set_interval_ms(interval_ms);
                info!("Changed telemetry interval to {}ms", interval_ms);
                STATUS_OK
            }
            Command::Data {
                resistance,
                brightness,
            } => self.apply_data(resistance, brightness, out),
        }
    }

    fn apply_data(&self, resistance: f64, brightness: f64, out: &mut impl OutputPort) -> u16 {
        let Some(level) = self.brightness_level(brightness) else {
            warn!("Brightness {} outside 0..=255, rejected", brightness);
            return STATUS_BAD_REQUEST;
        };

        let pattern = encoder::encode(resistance);
        out.apply_relays(pattern);
        out.set_brightness(level);
        info!("Load set: {} ohm -> {:?}, brightness {}", resistance, pattern, level);

        match pattern {
            RelayPattern::Discrete(_) => STATUS_OK,
            RelayPattern::Unmapped => {
                warn!("{} ohm has no relay combination; lines 1-5 unchanged", resistance);
                STATUS_UNMAPPED_RESISTANCE
            }
            RelayPattern::Continuous => {
                warn!("{} ohm needs the continuous path, which is not driven", resistance);
                STATUS_CONTINUOUS_UNSUPPORTED
            }
        }
    }

    /// Duty for a requested brightness under the configured policy.
    /// Fractional levels truncate toward zero.
    fn brightness_level(&self, brightness: f64) -> Option<u8> {
        let in_range = (0.0..=255.0).contains(&brightness);
        match self.brightness_policy {
            BrightnessPolicy::Clamp => Some(brightness.clamp(0.0, 255.0) as u8),
            BrightnessPolicy::Reject if in_range => Some(brightness as u8),
            BrightnessPolicy::Reject => None,
        }
    }
}
