//! Azure IoT Hub messaging adapter.
//!
//! Implements [`MessagingPort`] over MQTT.  Topic layout and credential
//! parsing live in [`crate::iothub`]; this module owns the client.
//!
//! ## Threading
//!
//! The ESP-IDF MQTT client delivers events on its own connection task.
//! A small `mqtt-rx` thread turns them into owned [`HubEvent`]s and
//! forwards them over a `std::sync::mpsc` channel.  Nothing reaches the
//! [`MessagingHandler`] until [`MessagingPort::check`] drains that
//! channel on the comms task, so callbacks stay single-threaded.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`
//!   over TLS with the certificate bundle.
//! - **all other targets**: in-memory broker with injection hooks for
//!   host-side tests.

use log::{error, info, warn};

use crate::app::commands::CommandEnvelope;
use crate::app::ports::{
    MessagingError, MessagingHandler, MessagingPort, SendConfirmation, TwinUpdate,
};
use crate::iothub::{self, ConnectionString, InboundTopic};

/// Request id used for the full-twin fetch issued after each connect.
const TWIN_GET_RID: &str = "0";

/// Transport event, owned so it can cross threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubEvent {
    Connected,
    Disconnected,
    /// Broker acknowledged the publish with this message id.
    Published(u32),
    /// Client outbox expired this message id without an acknowledgement.
    Deleted(u32),
    Received { topic: String, data: Vec<u8> },
    Error,
}

// ───────────────────────────────────────────────────────────────
// Adapter
// ───────────────────────────────────────────────────────────────

pub struct IotHubAdapter {
    model_id: heapless::String<32>,
    session: Option<Session>,
    /// Telemetry publishes awaiting a broker acknowledgement.
    pending: Vec<u32>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimBroker,
}

impl IotHubAdapter {
    pub fn new(model_id: &str) -> Self {
        let mut id = heapless::String::new();
        if id.push_str(model_id).is_err() {
            warn!("IoTHub: model id '{}' too long, omitted", model_id);
        }
        Self {
            model_id: id,
            session: None,
            pending: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            sim: SimBroker::default(),
        }
    }

    pub fn is_initialised(&self) -> bool {
        self.session.is_some()
    }

    fn on_connected(&mut self) {
        let Some(session) = self.session.as_mut() else { return };
        info!("IoTHub: connected as '{}'", session.cs.device_id);

        let c2d = session.cs.cloud_to_device_subscription();
        let topics = [
            c2d.as_str(),
            iothub::METHODS_SUBSCRIPTION,
            iothub::TWIN_RESPONSE_SUBSCRIPTION,
            iothub::TWIN_PATCH_SUBSCRIPTION,
        ];
        for topic in topics {
            if let Err(e) = session.subscribe(topic) {
                warn!("IoTHub: subscribe '{}' failed: {}", topic, e);
            }
        }

        if let Err(e) = session.send(&iothub::twin_get_topic(TWIN_GET_RID), b"") {
            warn!("IoTHub: twin request failed: {}", e);
        }
    }

    fn on_received(&mut self, topic: &str, data: &[u8], handler: &mut dyn MessagingHandler) {
        let Some(session) = self.session.as_mut() else { return };

        match iothub::classify(topic, &session.cs.device_id) {
            InboundTopic::Method { name, rid } => {
                let response = handler.on_method(&CommandEnvelope::new(name, data));
                let reply = iothub::method_response_topic(response.status, rid);
                if let Err(e) = session.send(&reply, &response.body) {
                    error!("IoTHub: response to '{}' dropped: {}", name, e);
                }
            }
            InboundTopic::TwinResponse { status: 200, rid } if rid == TWIN_GET_RID => {
                handler.on_twin_update(TwinUpdate::Complete, data);
            }
            InboundTopic::TwinResponse { status, rid } => {
                info!("IoTHub: twin response {} (rid {})", status, rid);
            }
            InboundTopic::TwinPatch => handler.on_twin_update(TwinUpdate::Partial, data),
            InboundTopic::CloudToDevice => handler.on_message(data),
            InboundTopic::Unknown => warn!("IoTHub: message on unexpected topic '{}'", topic),
        }
    }

    /// Drop `id` from the awaiting-ack list; false if it was not there.
    fn take_pending(&mut self, id: u32) -> bool {
        match self.pending.iter().position(|&p| p == id) {
            Some(pos) => {
                self.pending.remove(pos);
                true
            }
            None => false,
        }
    }

    fn dispatch(&mut self, event: HubEvent, handler: &mut dyn MessagingHandler) {
        match event {
            HubEvent::Connected => self.on_connected(),
            HubEvent::Disconnected => {
                warn!("IoTHub: disconnected");
                for _ in self.pending.drain(..) {
                    handler.on_send_confirmation(SendConfirmation::Error);
                }
            }
            HubEvent::Published(id) => {
                if self.take_pending(id) {
                    handler.on_send_confirmation(SendConfirmation::Ok);
                }
            }
            HubEvent::Deleted(id) => {
                if self.take_pending(id) {
                    warn!("IoTHub: message {} expired unacknowledged", id);
                    handler.on_send_confirmation(SendConfirmation::Error);
                }
            }
            HubEvent::Received { topic, data } => self.on_received(&topic, &data, handler),
            HubEvent::Error => warn!("IoTHub: transport error"),
        }
    }
}

impl MessagingPort for IotHubAdapter {
    fn init(&mut self, connection_string: &str) -> Result<(), MessagingError> {
        let cs = ConnectionString::parse(connection_string)?;
        info!("IoTHub: connecting to {} as '{}'", cs.host_name, cs.device_id);

        #[cfg(target_os = "espidf")]
        let session = Session::open(cs, &self.model_id)?;
        #[cfg(not(target_os = "espidf"))]
        let session = Session::open(cs, &self.model_id, &mut self.sim)?;

        self.session = Some(session);
        Ok(())
    }

    fn publish(&mut self, payload: &[u8]) -> Result<(), MessagingError> {
        let session = self.session.as_mut().ok_or(MessagingError::NotInitialised)?;
        let topic = session.cs.telemetry_topic();
        let id = session.send(&topic, payload)?;
        self.pending.push(id);
        Ok(())
    }

    fn check(&mut self, handler: &mut dyn MessagingHandler) {
        loop {
            let Some(event) = self.next_event() else { break };
            self.dispatch(event, handler);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF session
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
struct Session {
    cs: ConnectionString,
    client: esp_idf_svc::mqtt::client::EspMqttClient<'static>,
    rx: std::sync::mpsc::Receiver<HubEvent>,
}

#[cfg(target_os = "espidf")]
impl Session {
    fn open(cs: ConnectionString, model_id: &str) -> Result<Self, MessagingError> {
        use embedded_svc::mqtt::client::{Details, EventPayload};
        use esp_idf_svc::mqtt::client::{EspMqttClient, MqttClientConfiguration};

        let url = cs.broker_url();
        let username = cs.username(model_id);
        let conf = MqttClientConfiguration {
            client_id: Some(cs.device_id.as_str()),
            username: Some(username.as_str()),
            password: Some(cs.shared_access_signature.as_str()),
            keep_alive_interval: Some(core::time::Duration::from_secs(240)),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };

        let (client, mut conn) = EspMqttClient::new(url.as_str(), &conf).map_err(|e| {
            error!("IoTHub: client create failed: {:?}", e);
            MessagingError::InitFailed
        })?;

        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::Builder::new()
            .name("mqtt-rx".into())
            .stack_size(8 * 1024)
            .spawn(move || {
                while let Ok(event) = conn.next() {
                    let forwarded = match event.payload() {
                        EventPayload::Connected(_) => HubEvent::Connected,
                        EventPayload::Disconnected => HubEvent::Disconnected,
                        EventPayload::Published(id) => HubEvent::Published(id),
                        EventPayload::Deleted(id) => HubEvent::Deleted(id),
                        EventPayload::Received {
                            topic: Some(topic),
                            data,
                            details: Details::Complete,
                            ..
                        } => HubEvent::Received {
                            topic: topic.to_owned(),
                            data: data.to_vec(),
                        },
                        EventPayload::Received { .. } => {
                            warn!("mqtt-rx: dropping chunked payload");
                            continue;
                        }
                        EventPayload::Error(e) => {
                            warn!("mqtt-rx: {:?}", e);
                            HubEvent::Error
                        }
                        _ => continue,
                    };
                    if tx.send(forwarded).is_err() {
                        break;
                    }
                }
                info!("mqtt-rx: connection closed");
            })
            .map_err(|e| {
                error!("IoTHub: mqtt-rx spawn failed: {}", e);
                MessagingError::InitFailed
            })?;

        Ok(Self { cs, client, rx })
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), MessagingError> {
        use embedded_svc::mqtt::client::QoS;
        self.client
            .subscribe(topic, QoS::AtMostOnce)
            .map(|_| ())
            .map_err(|_| MessagingError::PublishFailed)
    }

    fn send(&mut self, topic: &str, payload: &[u8]) -> Result<u32, MessagingError> {
        use embedded_svc::mqtt::client::QoS;
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .map_err(|e| {
                warn!("IoTHub: publish to '{}' failed: {:?}", topic, e);
                MessagingError::PublishFailed
            })
    }
}

#[cfg(target_os = "espidf")]
impl IotHubAdapter {
    fn next_event(&mut self) -> Option<HubEvent> {
        self.session.as_ref()?.rx.try_recv().ok()
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation session
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct SimBroker {
    inbox: std::collections::VecDeque<HubEvent>,
    outbox: Vec<(String, Vec<u8>)>,
    subscriptions: Vec<String>,
    opens: u32,
    next_id: u32,
    fail_publish: bool,
}

#[cfg(not(target_os = "espidf"))]
struct Session {
    cs: ConnectionString,
    /// Shadow of the adapter's broker; synced back in `next_event`.
    broker: SimBroker,
}

#[cfg(not(target_os = "espidf"))]
impl Session {
    fn open(
        cs: ConnectionString,
        model_id: &str,
        sim: &mut SimBroker,
    ) -> Result<Self, MessagingError> {
        info!("IoTHub(sim): session as '{}'", cs.username(model_id));
        sim.opens += 1;
        sim.inbox.push_back(HubEvent::Connected);
        Ok(Self {
            cs,
            broker: core::mem::take(sim),
        })
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), MessagingError> {
        self.broker.subscriptions.push(topic.to_owned());
        Ok(())
    }

    fn send(&mut self, topic: &str, payload: &[u8]) -> Result<u32, MessagingError> {
        if self.broker.fail_publish {
            return Err(MessagingError::PublishFailed);
        }
        self.broker.next_id += 1;
        self.broker.outbox.push((topic.to_owned(), payload.to_vec()));
        Ok(self.broker.next_id)
    }
}

#[cfg(not(target_os = "espidf"))]
impl IotHubAdapter {
    fn broker(&mut self) -> &mut SimBroker {
        match self.session.as_mut() {
            Some(s) => &mut s.broker,
            None => &mut self.sim,
        }
    }

    fn next_event(&mut self) -> Option<HubEvent> {
        self.broker().inbox.pop_front()
    }

    /// Queue a transport event for the next `check()`.
    pub fn sim_inject(&mut self, event: HubEvent) {
        self.broker().inbox.push_back(event);
    }

    /// Queue a direct-method invocation.
    pub fn sim_invoke_method(&mut self, name: &str, rid: &str, payload: &[u8]) {
        self.sim_inject(HubEvent::Received {
            topic: format!("$iothub/methods/POST/{}/?$rid={}", name, rid),
            data: payload.to_vec(),
        });
    }

    /// Acknowledge every publish sent so far.
    pub fn sim_ack_all(&mut self) {
        let ids = self.pending.clone();
        for id in ids {
            self.sim_inject(HubEvent::Published(id));
        }
    }

    pub fn sim_fail_publish(&mut self, fail: bool) {
        self.broker().fail_publish = fail;
    }

    /// Every `(topic, payload)` sent to the broker, in order.
    pub fn sim_outbox(&mut self) -> &[(String, Vec<u8>)] {
        &self.broker().outbox
    }

    pub fn sim_subscriptions(&mut self) -> &[String] {
        &self.broker().subscriptions
    }

    /// How many times a client session has been opened.
    pub fn sim_opens(&mut self) -> u32 {
        self.broker().opens
    }
}
