// Transport error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Transport error code constants
///
/// Error code range: 4001-4004
pub struct TransportErrorCodes {}

impl TransportErrorCodes {
    /// OSC address does not start with '/' or contains forbidden characters
    pub const INVALID_ADDRESS: i32 = 4001;

    /// Destination could not be resolved or bound
    pub const SOCKET_SETUP_FAILED: i32 = 4002;

    /// Datagram could not be sent
    pub const SEND_FAILED: i32 = 4003;

    /// Outbound settings cannot be used
    pub const INVALID_SETTING: i32 = 4004;
}

/// Log a transport error with structured context
pub fn log_transport_error(err: &TransportError, context: &str) {
    error!(
        "Transport error in {}: code={}, component=OscSender, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Outbound message errors
///
/// Delivery is fire-and-forget; there is no retry or acknowledgement.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Address pattern is not a valid OSC address
    InvalidAddress { address: String },

    /// Socket could not be bound or connected
    SocketSetupFailed { reason: String },

    /// Datagram send failed
    SendFailed { address: String, reason: String },

    /// A configured OSC setting is out of range
    InvalidSetting { name: &'static str, reason: String },
}

impl ErrorCode for TransportError {
    fn code(&self) -> i32 {
        match self {
            TransportError::InvalidAddress { .. } => TransportErrorCodes::INVALID_ADDRESS,
            TransportError::SocketSetupFailed { .. } => TransportErrorCodes::SOCKET_SETUP_FAILED,
            TransportError::SendFailed { .. } => TransportErrorCodes::SEND_FAILED,
            TransportError::InvalidSetting { .. } => TransportErrorCodes::INVALID_SETTING,
        }
    }

    fn message(&self) -> String {
        match self {
            TransportError::InvalidAddress { address } => {
                format!("Invalid OSC address: {:?}", address)
            }
            TransportError::SocketSetupFailed { reason } => {
                format!("Failed to set up UDP socket: {}", reason)
            }
            TransportError::SendFailed { address, reason } => {
                format!("Failed to send {}: {}", address, reason)
            }
            TransportError::InvalidSetting { name, reason } => {
                format!("Invalid OSC setting {}: {}", name, reason)
            }
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TransportError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for TransportError {}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::SocketSetupFailed {
            reason: err.to_string(),
        }
    }
}
