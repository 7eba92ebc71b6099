//! MQTT publisher with an explicit, caller-owned lifecycle.
//!
//! [`BrokerPublisher`] wraps the rumqttc client and event loop behind
//! connect / publish / disconnect operations. The MQTT session and retry
//! state machine belong entirely to rumqttc; this module only maps delivery
//! guarantees onto QoS levels, waits for the matching broker acknowledgment,
//! and measures delivery latency.

use std::str::FromStr;
use std::time::{Duration, Instant};

use rumqttc::{
    AsyncClient, ClientError, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing,
    Packet as MqttPacket, QoS,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info};
use uuid::Uuid;

use crate::codec::{self, CodecError};
use crate::config::Config;
use crate::models::frame::Frame;

/// Errors from publisher lifecycle and delivery operations.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Connection establishment failed or the broker refused the session.
    #[error("broker connection failed: {0}")]
    Connection(String),

    /// The client rejected the request before it reached the wire.
    #[error("publish request failed: {0}")]
    Client(#[from] ClientError),

    /// The envelope exceeds the configured payload limit.
    #[error("payload is {size} bytes, limit is {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    /// No acknowledgment arrived within the configured window.
    #[error("timed out after {0:?} waiting for broker acknowledgment")]
    AckTimeout(Duration),

    /// The connection dropped while waiting for an acknowledgment.
    #[error("connection lost before acknowledgment: {0}")]
    ConnectionLost(String),

    /// Frame encoding failed; the publish was never attempted.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Acknowledgment semantics requested for a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeliveryGuarantee {
    /// Fire and forget (QoS 0); returns once the packet is handed off.
    AtMostOnce,
    /// Wait for the broker's PUBACK (QoS 1).
    #[default]
    AtLeastOnce,
    /// Wait for the broker's PUBCOMP (QoS 2).
    ExactlyOnce,
}

impl From<DeliveryGuarantee> for QoS {
    fn from(guarantee: DeliveryGuarantee) -> Self {
        match guarantee {
            DeliveryGuarantee::AtMostOnce => Self::AtMostOnce,
            DeliveryGuarantee::AtLeastOnce => Self::AtLeastOnce,
            DeliveryGuarantee::ExactlyOnce => Self::ExactlyOnce,
        }
    }
}

impl FromStr for DeliveryGuarantee {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "at-most-once" | "0" => Ok(Self::AtMostOnce),
            "at-least-once" | "1" => Ok(Self::AtLeastOnce),
            "exactly-once" | "2" => Ok(Self::ExactlyOnce),
            other => Err(format!(
                "unknown delivery guarantee '{other}' (expected at-most-once, at-least-once, or exactly-once)"
            )),
        }
    }
}

/// Outcome of a single publish.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    /// Topic the payload was published to.
    pub topic: String,
    /// Envelope size in bytes.
    pub payload_bytes: usize,
    /// Guarantee the publish was made under.
    pub guarantee: DeliveryGuarantee,
    /// Whether the broker acknowledged delivery. Always false for
    /// at-most-once, which does not wait.
    pub acknowledged: bool,
    /// Time from hand-off to acknowledgment (or to hand-off completion for
    /// at-most-once).
    pub latency: Duration,
}

/// Running counters for a publisher handle.
#[derive(Debug, Clone, Default)]
pub struct PublishStats {
    /// Messages handed to the broker
    pub messages_published: u64,
    /// Envelope bytes handed to the broker
    pub bytes_published: u64,
    /// Acknowledgments received
    pub acks_received: u64,
    /// Latency of the most recent publish
    pub last_latency: Option<Duration>,
}

impl PublishStats {
    fn record(&mut self, receipt: &DeliveryReceipt) {
        self.messages_published += 1;
        self.bytes_published += receipt.payload_bytes as u64;
        if receipt.acknowledged {
            self.acks_received += 1;
        }
        self.last_latency = Some(receipt.latency);
    }
}

/// Caller-owned MQTT publisher handle.
///
/// One publish is in flight at a time (`&mut self`), so the first matching
/// acknowledgment off the event loop belongs to the pending publish.
pub struct BrokerPublisher {
    client: AsyncClient,
    eventloop: EventLoop,
    ack_timeout: Duration,
    max_payload_bytes: usize,
    stats: PublishStats,
}

impl BrokerPublisher {
    /// Connect to the broker described by `config` and wait for the session
    /// to be accepted.
    pub async fn connect(config: &Config) -> Result<Self, PublishError> {
        let client_id = config
            .broker
            .client_id
            .clone()
            .unwrap_or_else(|| format!("framewire-{}", Uuid::new_v4().simple()));

        let mut options = MqttOptions::new(
            client_id.clone(),
            config.broker.host.as_str(),
            config.broker.port,
        );
        options.set_keep_alive(Duration::from_secs(config.broker.keep_alive_secs));

        let (client, mut eventloop) = AsyncClient::new(options, 16);

        let connect_timeout = Duration::from_millis(config.broker.connect_timeout_ms);
        timeout(connect_timeout, async {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(MqttPacket::ConnAck(ack))) => {
                        if ack.code == ConnectReturnCode::Success {
                            return Ok(());
                        }
                        return Err(PublishError::Connection(format!(
                            "broker refused session: {:?}",
                            ack.code
                        )));
                    }
                    Ok(_) => {}
                    Err(err) => return Err(PublishError::Connection(err.to_string())),
                }
            }
        })
        .await
        .map_err(|_| {
            PublishError::Connection(format!("no CONNACK within {connect_timeout:?}"))
        })??;

        info!(
            host = %config.broker.host,
            port = config.broker.port,
            client_id = %client_id,
            "Connected to broker"
        );

        Ok(Self {
            client,
            eventloop,
            ack_timeout: Duration::from_millis(config.publish.ack_timeout_ms),
            max_payload_bytes: config.publish.max_payload_bytes,
            stats: PublishStats::default(),
        })
    }

    /// Publish raw payload bytes under the given delivery guarantee.
    ///
    /// For at-least-once and exactly-once the call blocks until the broker
    /// acknowledges or the ack timeout elapses; at-most-once returns once
    /// the packet is handed to the transport.
    pub async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        guarantee: DeliveryGuarantee,
    ) -> Result<DeliveryReceipt, PublishError> {
        if payload.len() > self.max_payload_bytes {
            return Err(PublishError::PayloadTooLarge {
                size: payload.len(),
                limit: self.max_payload_bytes,
            });
        }

        let started = Instant::now();
        self.client
            .publish(topic, QoS::from(guarantee), false, payload.to_vec())
            .await?;

        let acknowledged = match guarantee {
            DeliveryGuarantee::AtMostOnce => {
                self.drive_until(|event| {
                    matches!(event, Event::Outgoing(Outgoing::Publish(_)))
                })
                .await?;
                false
            }
            DeliveryGuarantee::AtLeastOnce => {
                self.drive_until(|event| {
                    matches!(event, Event::Incoming(MqttPacket::PubAck(_)))
                })
                .await?;
                true
            }
            DeliveryGuarantee::ExactlyOnce => {
                self.drive_until(|event| {
                    matches!(event, Event::Incoming(MqttPacket::PubComp(_)))
                })
                .await?;
                true
            }
        };

        let receipt = DeliveryReceipt {
            topic: topic.to_owned(),
            payload_bytes: payload.len(),
            guarantee,
            acknowledged,
            latency: started.elapsed(),
        };
        self.stats.record(&receipt);

        debug!(
            topic = %receipt.topic,
            bytes = receipt.payload_bytes,
            acknowledged = receipt.acknowledged,
            latency_ms = receipt.latency.as_millis() as u64,
            "Published frame envelope"
        );

        Ok(receipt)
    }

    /// Encode a frame and publish the envelope. Codec errors propagate
    /// unchanged and nothing is sent.
    pub async fn publish_frame(
        &mut self,
        topic: &str,
        frame: &Frame,
        guarantee: DeliveryGuarantee,
    ) -> Result<DeliveryReceipt, PublishError> {
        let payload = codec::encode(frame)?;
        self.publish(topic, &payload, guarantee).await
    }

    /// Counters for this handle.
    pub fn stats(&self) -> &PublishStats {
        &self.stats
    }

    /// Disconnect from the broker, consuming the handle.
    pub async fn disconnect(mut self) -> Result<(), PublishError> {
        self.client.disconnect().await?;

        // Drain the event loop until the broker closes the stream so the
        // DISCONNECT packet actually leaves the socket.
        let _ = timeout(Duration::from_millis(500), async {
            while self.eventloop.poll().await.is_ok() {}
        })
        .await;

        info!("Disconnected from broker");
        Ok(())
    }

    /// Drive the event loop until `done` matches an event or the ack
    /// timeout elapses.
    async fn drive_until(
        &mut self,
        mut done: impl FnMut(&Event) -> bool,
    ) -> Result<(), PublishError> {
        let wait = self.ack_timeout;
        timeout(wait, async {
            loop {
                match self.eventloop.poll().await {
                    Ok(event) => {
                        if done(&event) {
                            return Ok(());
                        }
                    }
                    Err(err) => return Err(PublishError::ConnectionLost(err.to_string())),
                }
            }
        })
        .await
        .map_err(|_| PublishError::AckTimeout(wait))?
    }
}
