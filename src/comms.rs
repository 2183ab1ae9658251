//! Connectivity & telemetry loop.
//!
//! Owns the live [`DeviceState`] and drives the three duties of the
//! comms task: periodic telemetry, link recovery and inbound-message
//! polling.  Remote methods arrive through the messaging port's
//! callbacks and are handed to the [`CommandDispatcher`] on this same
//! thread, so the state is lent by `&mut` and never locked.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    CommsLoop::tick(now)                      │
//! │                                                              │
//! │  Connected ∧ sending ∧ interval elapsed?                     │
//! │        │ yes                         │ no                    │
//! │        ▼                             ▼                       │
//! │  SensorPort::sample_voltage    Disconnected?                 │
//! │  MessagingPort::publish          │ yes                       │
//! │                                  ▼                           │
//! │                         ConnectivityPort::connect            │
//! │                         (+ transport init, once)             │
//! │                                                              │
//! │  link up?  ── yes ──▶ MessagingPort::check(bridge)           │
//! │     │                      │ on_method                       │
//! │     no                     ▼                                 │
//! │     ▼               CommandDispatcher::handle                │
//! │  Disconnected              │                                 │
//! │                            ▼                                 │
//! │                  DeviceState / OutputPort                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use log::{error, info, warn};

use crate::app::commands::CommandEnvelope;
use crate::app::dispatcher::CommandDispatcher;
use crate::app::events::{CommandResponse, TelemetrySample};
use crate::app::ports::{
    Clock, ConnectivityPort, MessagingHandler, MessagingPort, OutputPort, SendConfirmation,
    SensorPort, TwinUpdate,
};
use crate::app::state::DeviceState;
use crate::config::{Credentials, DeviceConfig};

// ═══════════════════════════════════════════════════════════════
//  Link state
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    /// Bring-up in progress (only observed inside [`CommsLoop::establish`]).
    Connecting,
    Connected,
}

// ═══════════════════════════════════════════════════════════════
//  Comms loop
// ═══════════════════════════════════════════════════════════════

pub struct CommsLoop {
    state: DeviceState,
    dispatcher: CommandDispatcher,
    link: LinkState,
    /// Uptime (ms) of the last telemetry send, or of bring-up.
    last_send_ms: u64,
    transport_ready: bool,
    connection_string: heapless::String<256>,
    connect_timeout_ms: u32,
}

impl CommsLoop {
    pub fn new(config: &DeviceConfig, credentials: &Credentials) -> Self {
        Self {
            state: DeviceState::new(config),
            dispatcher: CommandDispatcher::new(config),
            link: LinkState::Disconnected,
            last_send_ms: 0,
            transport_ready: false,
            connection_string: credentials.connection_string.clone(),
            connect_timeout_ms: config.connect_timeout_ms,
        }
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn link_state(&self) -> LinkState {
        self.link
    }

    pub fn transport_ready(&self) -> bool {
        self.transport_ready
    }

    /// Bring the link up, then the messaging transport.
    ///
    /// Timed-out or failed connects are retried back to back until one
    /// succeeds.  Errors that return immediately (bad credentials) leave
    /// the loop `Disconnected`, and [`tick`](Self::tick) keeps retrying
    /// once per poll period.  A failed transport init is likewise retried
    /// by `tick`.  Nothing here is fatal.
    pub fn establish(
        &mut self,
        clock: &impl Clock,
        link: &mut impl ConnectivityPort,
        messaging: &mut impl MessagingPort,
    ) {
        self.link = LinkState::Connecting;
        info!("Connecting to WiFi...");

        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            match link.connect(self.connect_timeout_ms) {
                Ok(()) => break,
                Err(e) if e.is_retryable() => {
                    warn!("WiFi connect attempt {} failed: {}", attempt, e);
                }
                Err(e) => {
                    error!("WiFi connect failed: {}; retrying from the comms loop", e);
                    self.link = LinkState::Disconnected;
                    self.last_send_ms = clock.now_ms();
                    return;
                }
            }
        }

        self.link = LinkState::Connected;
        info!("WiFi connected after {} attempt(s)", attempt);

        self.init_transport(messaging);
        self.last_send_ms = clock.now_ms();
    }

    /// One pass of the comms task.  Call every `poll_period_ms`.
    pub fn tick<H>(
        &mut self,
        now_ms: u64,
        link: &mut impl ConnectivityPort,
        messaging: &mut impl MessagingPort,
        hw: &mut H,
    ) where
        H: SensorPort + OutputPort,
    {
        let due = now_ms.saturating_sub(self.last_send_ms) >= u64::from(self.state.interval_ms());

        if self.link == LinkState::Connected
            && self.transport_ready
            && self.state.sending_enabled()
            && due
        {
            self.last_send_ms = now_ms;
            self.send_telemetry(messaging, hw);
        } else if self.link == LinkState::Disconnected {
            self.reconnect(link, messaging);
        } else if self.link == LinkState::Connected && !self.transport_ready {
            self.init_transport(messaging);
        }

        if link.is_connected() {
            let mut bridge = CallbackBridge {
                dispatcher: &self.dispatcher,
                state: &mut self.state,
                out: hw,
            };
            messaging.check(&mut bridge);
        } else if self.link != LinkState::Disconnected {
            warn!("WiFi link lost");
            self.link = LinkState::Disconnected;
        }
    }

    fn send_telemetry(&mut self, messaging: &mut impl MessagingPort, sensor: &mut impl SensorPort) {
        let voltage = sensor.sample_voltage();
        let sample = TelemetrySample {
            id: self.state.next_message_id(),
            voltage,
        };

        let payload = match sample.to_json() {
            Ok(p) => p,
            Err(e) => {
                error!("Telemetry {} not serialised: {}", sample.id, e);
                return;
            }
        };

        match messaging.publish(&payload) {
            Ok(()) => info!("Sending message {}", String::from_utf8_lossy(&payload)),
            Err(e) => warn!("Telemetry {} not sent: {}", sample.id, e),
        }
    }

    fn reconnect(&mut self, link: &mut impl ConnectivityPort, messaging: &mut impl MessagingPort) {
        if let Err(e) = link.connect(self.connect_timeout_ms) {
            warn!("WiFi reconnect failed: {}", e);
            return;
        }

        self.link = LinkState::Connected;
        info!("WiFi reconnected");

        self.init_transport(messaging);
    }

    /// Initialise the transport unless that already succeeded once.
    fn init_transport(&mut self, messaging: &mut impl MessagingPort) {
        if self.transport_ready {
            return;
        }
        match messaging.init(&self.connection_string) {
            Ok(()) => {
                self.transport_ready = true;
                info!("IoT hub transport initialised");
            }
            Err(e) => error!("IoT hub transport init failed: {}", e),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Callback bridge
// ═══════════════════════════════════════════════════════════════

/// Receives transport callbacks during `check()` and routes method
/// invocations to the dispatcher.
struct CallbackBridge<'a, O> {
    dispatcher: &'a CommandDispatcher,
    state: &'a mut DeviceState,
    out: &'a mut O,
}

impl<O: OutputPort> MessagingHandler for CallbackBridge<'_, O> {
    fn on_send_confirmation(&mut self, result: SendConfirmation) {
        match result {
            SendConfirmation::Ok => info!("Message sent to IoT hub"),
            SendConfirmation::Error => error!("Failed to send message to IoT hub"),
        }
    }

    fn on_message(&mut self, payload: &[u8]) {
        info!("Message received: {}", String::from_utf8_lossy(payload));
    }

    fn on_twin_update(&mut self, update: TwinUpdate, payload: &[u8]) {
        info!("Twin update ({:?}): {}", update, String::from_utf8_lossy(payload));
    }

    fn on_method(&mut self, envelope: &CommandEnvelope) -> CommandResponse {
        self.dispatcher.handle(envelope, self.state, self.out)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
