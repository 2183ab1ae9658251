//! Outbound messages produced by the application core.
//!
//! [`TelemetrySample`] is built by the comms loop every telemetry tick;
//! [`CommandResponse`] is the synchronous answer to a remote method.
//! Both serialise to the JSON shapes the cloud side expects.

use serde::Serialize;

/// One voltage reading, published as `{"messageId":<id>,"voltage":<v>}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TelemetrySample {
    #[serde(rename = "messageId")]
    pub id: u64,
    pub voltage: f32,
}

impl TelemetrySample {
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[derive(Serialize)]
struct StatusBody {
    status: u16,
}

/// Answer to a remote method invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    pub status: u16,
    /// Always `{"status":<status>}`; empty only if serialisation failed.
    pub body: Vec<u8>,
}

impl CommandResponse {
    pub fn with_status(status: u16) -> Self {
        let body = serde_json::to_vec(&StatusBody { status }).unwrap_or_else(|e| {
            log::warn!("response body for status {} dropped: {}", status, e);
            Vec::new()
        });
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
