//! Mock adapters for integration tests.
//!
//! Records every output call and every message so tests can assert on
//! the full history without touching real GPIO, PWM or sockets.

use std::cell::Cell;
use std::collections::VecDeque;

use loadctl::app::commands::CommandEnvelope;
use loadctl::app::events::CommandResponse;
use loadctl::app::ports::{
    Clock, ConnectivityError, ConnectivityPort, MessagingError, MessagingHandler, MessagingPort,
    OutputPort, SendConfirmation, SensorPort, TwinUpdate,
};
use loadctl::encoder::RelayPattern;

// ── Output call record ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputCall {
    Relays(RelayPattern),
    Brightness(u8),
    Indicator(bool),
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<OutputCall>,
    pub voltage: f32,
    pub samples: u32,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            voltage: 50.0,
            samples: 0,
        }
    }

    pub fn last_call(&self) -> Option<&OutputCall> {
        self.calls.last()
    }

    pub fn brightness(&self) -> Option<u8> {
        self.calls.iter().rev().find_map(|c| match c {
            OutputCall::Brightness(b) => Some(*b),
            _ => None,
        })
    }

    pub fn indicator(&self) -> Option<bool> {
        self.calls.iter().rev().find_map(|c| match c {
            OutputCall::Indicator(on) => Some(*on),
            _ => None,
        })
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputPort for MockHardware {
    fn apply_relays(&mut self, pattern: RelayPattern) {
        self.calls.push(OutputCall::Relays(pattern));
    }

    fn set_brightness(&mut self, level: u8) {
        self.calls.push(OutputCall::Brightness(level));
    }

    fn set_indicator(&mut self, on: bool) {
        self.calls.push(OutputCall::Indicator(on));
    }
}

impl SensorPort for MockHardware {
    fn sample_voltage(&mut self) -> f32 {
        self.samples += 1;
        self.voltage
    }
}

// ── MockLink ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MockLink {
    pub up: bool,
    /// Connect attempts that will time out before one succeeds.
    pub fail_next: u32,
    /// When set, every connect attempt times out.
    pub unreachable: bool,
    pub attempts: u32,
    pub timeouts: Vec<u32>,
}

impl ConnectivityPort for MockLink {
    fn connect(&mut self, timeout_ms: u32) -> Result<(), ConnectivityError> {
        self.attempts += 1;
        self.timeouts.push(timeout_ms);
        if self.unreachable {
            return Err(ConnectivityError::Timeout);
        }
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(ConnectivityError::Timeout);
        }
        self.up = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.up
    }
}

// ── MockHub ───────────────────────────────────────────────────

pub enum Inbound {
    Method(CommandEnvelope),
    Message(Vec<u8>),
    Twin(TwinUpdate, Vec<u8>),
    Confirmation(SendConfirmation),
}

#[derive(Default)]
pub struct MockHub {
    pub inits: u32,
    pub connection_strings: Vec<String>,
    pub published: Vec<Vec<u8>>,
    pub inbound: VecDeque<Inbound>,
    pub responses: Vec<(String, CommandResponse)>,
    pub checks: u32,
    pub fail_publish: bool,
}

#[allow(dead_code)]
impl MockHub {
    pub fn invoke(&mut self, name: &str, payload: &str) {
        self.inbound
            .push_back(Inbound::Method(CommandEnvelope::new(name, payload.as_bytes())));
    }

    pub fn published_json(&self) -> Vec<serde_json::Value> {
        self.published
            .iter()
            .map(|p| serde_json::from_slice(p).unwrap())
            .collect()
    }

    pub fn last_response(&self) -> Option<&CommandResponse> {
        self.responses.last().map(|(_, r)| r)
    }
}

impl MessagingPort for MockHub {
    fn init(&mut self, connection_string: &str) -> Result<(), MessagingError> {
        self.inits += 1;
        self.connection_strings.push(connection_string.to_owned());
        Ok(())
    }

    fn publish(&mut self, payload: &[u8]) -> Result<(), MessagingError> {
        if self.fail_publish {
            return Err(MessagingError::PublishFailed);
        }
        self.published.push(payload.to_vec());
        Ok(())
    }

    fn check(&mut self, handler: &mut dyn MessagingHandler) {
        self.checks += 1;
        while let Some(event) = self.inbound.pop_front() {
            match event {
                Inbound::Method(env) => {
                    let resp = handler.on_method(&env);
                    self.responses.push((env.name.clone(), resp));
                }
                Inbound::Message(data) => handler.on_message(&data),
                Inbound::Twin(kind, data) => handler.on_twin_update(kind, &data),
                Inbound::Confirmation(c) => handler.on_send_confirmation(c),
            }
        }
    }
}

// ── ManualClock ───────────────────────────────────────────────

#[derive(Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn at(ms: u64) -> Self {
        Self { now: Cell::new(ms) }
    }

    pub fn advance(&self, ms: u64) -> u64 {
        self.now.set(self.now.get() + ms);
        self.now.get()
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}
