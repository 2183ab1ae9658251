//! Inbound remote method invocations.
//!
//! The messaging transport hands the core a [`CommandEnvelope`], the
//! method name plus its raw JSON payload.  [`Command::parse`] decodes it
//! into a typed [`Command`] that the
//! [`CommandDispatcher`](super::dispatcher::CommandDispatcher) acts upon.
//! Payload fields are validated here; nothing defaults silently.

use core::fmt;

use serde::Deserialize;
use serde::de::DeserializeOwned;

/// A named remote invocation as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEnvelope {
    pub name: String,
    pub payload: Vec<u8>,
}

impl CommandEnvelope {
    pub fn new(name: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }
}

/// Commands the device understands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Resume telemetry publication.
    Start,
    /// Pause telemetry publication.
    Stop,
    /// Toggle the on-board indicator.
    Update,
    /// Reserved; accepted and ignored.
    Pwm,
    /// Change the telemetry period.
    Interval { interval_ms: u32 },
    /// Select a load resistance and a dimmer level.
    Data { resistance: f64, brightness: f64 },
}

/// Why an envelope could not be turned into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Method name is not part of the command set.
    Unknown(String),
    /// Payload is not a JSON object.
    MalformedPayload,
    /// A required payload field is absent (or `null`).
    MissingField(&'static str),
    /// A payload field has the wrong type, range or is not finite.
    InvalidField(&'static str),
}

impl CommandError {
    /// Status code reported to the invoker.
    pub fn status(&self) -> u16 {
        match self {
            Self::Unknown(_) => 404,
            Self::MalformedPayload | Self::MissingField(_) | Self::InvalidField(_) => 400,
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(name) => write!(f, "unknown method '{}'", name),
            Self::MalformedPayload => write!(f, "payload is not a JSON object"),
            Self::MissingField(field) => write!(f, "missing field '{}'", field),
            Self::InvalidField(field) => write!(f, "invalid field '{}'", field),
        }
    }
}

// ── Payload shapes ────────────────────────────────────────────

#[derive(Deserialize)]
struct IntervalPayload {
    interval: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct DataPayload {
    resistance: Option<serde_json::Value>,
    brightness: Option<serde_json::Value>,
}

/// Derived struct decoding also takes arrays by position, so the
/// payload must be checked to be an object before it is mapped.
fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T, CommandError> {
    let value: serde_json::Value =
        serde_json::from_slice(payload).map_err(|_| CommandError::MalformedPayload)?;
    if !value.is_object() {
        return Err(CommandError::MalformedPayload);
    }
    serde_json::from_value(value).map_err(|_| CommandError::MalformedPayload)
}

fn required<'v>(
    value: Option<&'v serde_json::Value>,
    field: &'static str,
) -> Result<&'v serde_json::Value, CommandError> {
    match value {
        None | Some(serde_json::Value::Null) => Err(CommandError::MissingField(field)),
        Some(v) => Ok(v),
    }
}

fn finite_number(value: &serde_json::Value, field: &'static str) -> Result<f64, CommandError> {
    value
        .as_f64()
        .filter(|n| n.is_finite())
        .ok_or(CommandError::InvalidField(field))
}

impl Command {
    /// Decode an envelope.  Payloads of parameterless commands are ignored.
    pub fn parse(envelope: &CommandEnvelope) -> Result<Self, CommandError> {
        match envelope.name.as_str() {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "update" => Ok(Self::Update),
            "pwm" => Ok(Self::Pwm),
            "interval" => {
                let p: IntervalPayload = decode(&envelope.payload)?;
                let interval_ms = required(p.interval.as_ref(), "interval")?
                    .as_u64()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or(CommandError::InvalidField("interval"))?;
                Ok(Self::Interval { interval_ms })
            }
            "data" => {
                let p: DataPayload = decode(&envelope.payload)?;
                let resistance =
                    finite_number(required(p.resistance.as_ref(), "resistance")?, "resistance")?;
                let brightness =
                    finite_number(required(p.brightness.as_ref(), "brightness")?, "brightness")?;
                Ok(Self::Data {
                    resistance,
                    brightness,
                })
            }
            other => Err(CommandError::Unknown(other.to_owned())),
        }
    }
}
