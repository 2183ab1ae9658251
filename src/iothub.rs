//! Azure IoT Hub MQTT mapping.
//!
//! Pure string handling shared by the messaging adapter and its tests:
//! connection-string parsing, topic builders and inbound topic
//! classification.  No I/O.
//!
//! ```text
//!   device → hub   devices/{id}/messages/events/
//!                  $iothub/methods/res/{status}/?$rid={rid}
//!                  $iothub/twin/GET/?$rid={rid}
//!
//!   hub → device   devices/{id}/messages/devicebound/...
//!                  $iothub/methods/POST/{name}/?$rid={rid}
//!                  $iothub/twin/res/{status}/?$rid={rid}
//!                  $iothub/twin/PATCH/properties/desired/?$version={v}
//! ```

use crate::app::ports::MessagingError;

/// MQTT API version sent in the username.
pub const API_VERSION: &str = "2021-04-12";

/// TLS MQTT port of the hub.
pub const MQTT_PORT: u16 = 8883;

pub const METHODS_SUBSCRIPTION: &str = "$iothub/methods/POST/#";
pub const TWIN_RESPONSE_SUBSCRIPTION: &str = "$iothub/twin/res/#";
pub const TWIN_PATCH_SUBSCRIPTION: &str = "$iothub/twin/PATCH/properties/desired/#";

const METHOD_PREFIX: &str = "$iothub/methods/POST/";
const TWIN_RES_PREFIX: &str = "$iothub/twin/res/";
const TWIN_PATCH_PREFIX: &str = "$iothub/twin/PATCH/properties/desired/";
const RID_MARKER: &str = "?$rid=";

// ───────────────────────────────────────────────────────────────
// Connection string
// ───────────────────────────────────────────────────────────────

/// Parsed device connection string.
///
/// Only pre-issued shared access signatures are supported; the device
/// never signs tokens itself.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub host_name: String,
    pub device_id: String,
    pub shared_access_signature: String,
}

impl ConnectionString {
    /// Parse `HostName=...;DeviceId=...;SharedAccessSignature=...`.
    /// Keys are case-sensitive; unknown keys are ignored.
    pub fn parse(s: &str) -> Result<Self, MessagingError> {
        let mut host_name = None;
        let mut device_id = None;
        let mut sas = None;

        for part in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((key, value)) = part.split_once('=') else {
                return Err(MessagingError::InvalidCredentials("segment without '='"));
            };
            match key {
                "HostName" => host_name = Some(value),
                "DeviceId" => device_id = Some(value),
                "SharedAccessSignature" => sas = Some(value),
                _ => {}
            }
        }

        let non_empty = |v: Option<&str>, key| match v {
            Some(v) if !v.is_empty() => Ok(v.to_owned()),
            _ => Err(MessagingError::InvalidCredentials(key)),
        };

        Ok(Self {
            host_name: non_empty(host_name, "HostName")?,
            device_id: non_empty(device_id, "DeviceId")?,
            shared_access_signature: non_empty(sas, "SharedAccessSignature")?,
        })
    }

    pub fn broker_url(&self) -> String {
        format!("mqtts://{}:{}", self.host_name, MQTT_PORT)
    }

    pub fn username(&self, model_id: &str) -> String {
        let mut user = format!(
            "{}/{}/?api-version={}",
            self.host_name, self.device_id, API_VERSION
        );
        if !model_id.is_empty() {
            user.push_str("&model-id=");
            user.push_str(model_id);
        }
        user
    }

    pub fn telemetry_topic(&self) -> String {
        format!("devices/{}/messages/events/", self.device_id)
    }

    pub fn cloud_to_device_subscription(&self) -> String {
        format!("devices/{}/messages/devicebound/#", self.device_id)
    }
}

// Never print the signature.
impl core::fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConnectionString")
            .field("host_name", &self.host_name)
            .field("device_id", &self.device_id)
            .field("shared_access_signature", &"<redacted>")
            .finish()
    }
}

// ───────────────────────────────────────────────────────────────
// Outbound topics
// ───────────────────────────────────────────────────────────────

pub fn method_response_topic(status: u16, rid: &str) -> String {
    format!("$iothub/methods/res/{}/{}{}", status, RID_MARKER, rid)
}

pub fn twin_get_topic(rid: &str) -> String {
    format!("$iothub/twin/GET/{}{}", RID_MARKER, rid)
}

// ───────────────────────────────────────────────────────────────
// Inbound topics
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundTopic<'a> {
    Method { name: &'a str, rid: &'a str },
    TwinResponse { status: u16, rid: &'a str },
    TwinPatch,
    CloudToDevice,
    Unknown,
}

/// Value of the `$rid` query parameter, if present.
fn rid_of(query: &str) -> Option<&str> {
    let q = query.strip_prefix('?')?;
    q.split('&').find_map(|kv| kv.strip_prefix("$rid="))
}

/// Classify a topic received on one of the device's subscriptions.
pub fn classify<'a>(topic: &'a str, device_id: &str) -> InboundTopic<'a> {
    if let Some(rest) = topic.strip_prefix(METHOD_PREFIX) {
        if let Some((name, query)) = rest.split_once('/') {
            if let Some(rid) = rid_of(query) {
                if !name.is_empty() {
                    return InboundTopic::Method { name, rid };
                }
            }
        }
        return InboundTopic::Unknown;
    }

    if let Some(rest) = topic.strip_prefix(TWIN_RES_PREFIX) {
        if let Some((status, query)) = rest.split_once('/') {
            if let (Ok(status), Some(rid)) = (status.parse(), rid_of(query)) {
                return InboundTopic::TwinResponse { status, rid };
            }
        }
        return InboundTopic::Unknown;
    }

    if topic.starts_with(TWIN_PATCH_PREFIX) {
        return InboundTopic::TwinPatch;
    }

    let c2d = topic
        .strip_prefix("devices/")
        .and_then(|t| t.strip_prefix(device_id))
        .is_some_and(|t| t.starts_with("/messages/devicebound/"));
    if c2d {
        return InboundTopic::CloudToDevice;
    }

    InboundTopic::Unknown
}
