//! Error types for the switchbot library.

use thiserror::Error;
use uuid::Uuid;

use crate::protocol::{CommandKind, StatusCode};

/// The main error type for switchbot operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying link failed to connect, write or subscribe.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// Response frame could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The device answered with a non-success status byte.
    #[error("device reported status {}: {}", .0.to_byte(), .0.description())]
    Status(StatusCode),

    /// Command timed out waiting for response.
    #[error("command timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Connection is not established.
    #[error("not connected")]
    NotConnected,

    /// Connection was lost while a response was pending.
    #[error("disconnected while awaiting response")]
    Disconnected,

    /// Another command is in flight and the executor rejects concurrent calls.
    #[error("another command is already awaiting a response")]
    Busy,

    /// The peripheral does not advertise the bot service.
    #[error("service {uuid} not found")]
    ServiceNotFound { uuid: Uuid },

    /// The bot service lacks a required characteristic.
    #[error("characteristic {uuid} not found or lacks required property")]
    CharacteristicNotFound { uuid: Uuid },

    /// The decoded response does not belong to the command sent.
    #[error("unexpected response to {kind:?}")]
    UnexpectedResponse { kind: CommandKind },

    /// A command parameter is outside the range the device accepts.
    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },
}

impl Error {
    /// Returns the device status code if this is a protocol status error.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status(status) => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }
}

/// Response decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Response shorter than the layout of the in-flight command requires.
    #[error("response too short: expected at least {expected} bytes, got {got}")]
    TooShort { expected: usize, got: usize },

    /// A field holds a value outside its enumeration.
    #[error("invalid {field} value 0x{value:02x}")]
    InvalidValue { field: &'static str, value: u8 },
}

/// Result type alias for switchbot operations.
pub type Result<T> = std::result::Result<T, Error>;
