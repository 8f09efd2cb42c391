// Fire-and-forget UDP sender for OSC messages
//
// One datagram per message, no bundles, no acknowledgement and no retry.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;

use crate::analysis::FeatureVector;
use crate::config::OscConfig;
use crate::error::{log_transport_error, TransportError};
use crate::osc::mapping::{feature_messages, morph_trigger};
use crate::osc::message::OscMessage;

/// UDP sender bound to an ephemeral local port
pub struct OscSender {
    socket: UdpSocket,
    target: SocketAddr,
}

impl OscSender {
    /// Resolve `host:port` and bind a local socket
    ///
    /// # Errors
    /// `SocketSetupFailed` if the host cannot be resolved or binding fails.
    pub async fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let target = tokio::net::lookup_host((host, port))
            .await?
            .next()
            .ok_or_else(|| TransportError::SocketSetupFailed {
                reason: format!("{}:{} did not resolve to any address", host, port),
            })?;

        let local: SocketAddr = if target.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(local).await?;

        log::info!("[OscSender] Sending to {}", target);
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Send one message as a single datagram
    pub async fn send(&self, message: &OscMessage) -> Result<(), TransportError> {
        let bytes = message.encode();
        self.socket
            .send_to(&bytes, self.target)
            .await
            .map_err(|err| {
                let err = TransportError::SendFailed {
                    address: message.address().to_string(),
                    reason: err.to_string(),
                };
                log_transport_error(&err, "OscSender::send");
                err
            })?;
        log::trace!("[OscSender] {} ({} bytes)", message.address(), bytes.len());
        Ok(())
    }

    /// Send the messages in order, stopping at the first failure
    pub async fn send_all(&self, messages: &[OscMessage]) -> Result<usize, TransportError> {
        for message in messages {
            self.send(message).await?;
        }
        Ok(messages.len())
    }

    /// Send a frame's features, then the morph trigger after the configured
    /// delay
    ///
    /// Returns the number of datagrams sent.
    pub async fn send_features(
        &self,
        features: &FeatureVector,
        config: &OscConfig,
    ) -> Result<usize, TransportError> {
        let mut sent = self.send_all(&feature_messages(features, config)?).await?;

        if let Some(trigger) = morph_trigger(config)? {
            tokio::time::sleep(Duration::from_millis(config.morph_delay_ms)).await;
            self.send(&trigger).await?;
            sent += 1;
        }
        Ok(sent)
    }
}
