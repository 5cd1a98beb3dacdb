use std::time::{Duration, Instant};

use rumqttc::{Client, Event, MqttOptions, Outgoing, Packet, QoS};

use crate::error::Result;
use crate::settings::Mqtt;

/// Longest wait for the broker to take and acknowledge the publishes.
pub const ACK_TIMEOUT: Duration = Duration::from_secs(5);
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// One message ready for the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub topic: String,
    pub qos: QoS,
    pub payload: String,
}

pub fn qos(level: u8) -> QoS {
    match level {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        _ => QoS::ExactlyOnce,
    }
}

/// Connect, publish everything and disconnect. A publish the client refuses
/// is logged and skipped. Waits at most [`ACK_TIMEOUT`] for the broker and
/// returns the number of publishes written out.
pub fn publish_all(settings: &Mqtt, publications: &[Publication]) -> Result<usize> {
    let mut options = MqttOptions::new(settings.client_id.as_str(), settings.host.as_str(), settings.port);
    options.set_keep_alive(Duration::from_secs(5));
    options.set_credentials(settings.user.as_str(), settings.password.as_str());

    tracing::debug!("connecting to {}:{}", settings.host, settings.port);
    let (client, mut connection) = Client::new(options, publications.len() + 1);

    let mut queued = 0;
    let mut acks_expected = 0;
    for publication in publications {
        match client.publish(
            publication.topic.as_str(),
            publication.qos,
            false,
            publication.payload.as_bytes(),
        ) {
            Ok(()) => {
                queued += 1;
                if publication.qos != QoS::AtMostOnce {
                    acks_expected += 1;
                }
            }
            Err(e) => tracing::error!("failed to publish to {}: {}", publication.topic, e),
        }
    }

    let mut written = 0;
    let mut acked = 0;
    let deadline = Instant::now() + ACK_TIMEOUT;
    while queued > 0 && (written < queued || acked < acks_expected) {
        match connection.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(notification) => match notification? {
                Event::Incoming(Packet::ConnAck(ack)) => tracing::debug!("connected: {:?}", ack.code),
                Event::Outgoing(Outgoing::Publish(_)) => written += 1,
                Event::Incoming(Packet::PubAck(_)) | Event::Incoming(Packet::PubComp(_)) => acked += 1,
                _ => {}
            },
            Err(_) => {
                tracing::warn!(
                    "gave up after {:?}: {} of {} written, {} of {} acknowledged",
                    ACK_TIMEOUT,
                    written,
                    queued,
                    acked,
                    acks_expected
                );
                break;
            }
        }
    }

    client.disconnect()?;
    let deadline = Instant::now() + DISCONNECT_TIMEOUT;
    loop {
        match connection.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(Ok(Event::Outgoing(Outgoing::Disconnect))) => break,
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                tracing::debug!("connection closed: {}", e);
                break;
            }
            Err(_) => {
                tracing::debug!("no disconnect within {:?}", DISCONNECT_TIMEOUT);
                break;
            }
        }
    }

    tracing::info!("published {} of {} messages", written, publications.len());
    Ok(written)
}
