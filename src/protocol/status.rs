//! Status codes carried in the first byte of every response.

use std::fmt;

/// Status byte meaning success.
pub const STATUS_OK: u8 = 0x01;

/// Outcome of a command as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Action executed.
    Ok,
    /// Error while executing an action.
    ActionFailed,
    /// Device is busy now.
    Busy,
    /// Communication protocol version incompatible.
    ProtocolMismatch,
    /// Device does not support this command.
    Unsupported,
    /// Device battery is low.
    LowBattery,
    /// Device is encrypted.
    Encrypted,
    /// Device is unencrypted.
    Unencrypted,
    /// Password error.
    PasswordError,
    /// Device does not support this encryption method.
    UnsupportedEncryption,
    /// Failed to locate a nearby mesh device.
    MeshNotFound,
    /// Failed to connect to the network.
    NetworkJoinFailed,
    /// A code the protocol documentation does not list.
    Unknown(u8),
}

impl StatusCode {
    /// Classifies a status byte. Never fails.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0x01 => Self::Ok,
            0x02 => Self::ActionFailed,
            0x03 => Self::Busy,
            0x04 => Self::ProtocolMismatch,
            0x05 => Self::Unsupported,
            0x06 => Self::LowBattery,
            0x07 => Self::Encrypted,
            0x08 => Self::Unencrypted,
            0x09 => Self::PasswordError,
            0x0A => Self::UnsupportedEncryption,
            0x0B => Self::MeshNotFound,
            0x0C => Self::NetworkJoinFailed,
            other => Self::Unknown(other),
        }
    }

    /// Returns the wire value.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::Ok => 0x01,
            Self::ActionFailed => 0x02,
            Self::Busy => 0x03,
            Self::ProtocolMismatch => 0x04,
            Self::Unsupported => 0x05,
            Self::LowBattery => 0x06,
            Self::Encrypted => 0x07,
            Self::Unencrypted => 0x08,
            Self::PasswordError => 0x09,
            Self::UnsupportedEncryption => 0x0A,
            Self::MeshNotFound => 0x0B,
            Self::NetworkJoinFailed => 0x0C,
            Self::Unknown(byte) => byte,
        }
    }

    /// Returns true for [`StatusCode::Ok`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns true if resubmitting the same command later may succeed.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Busy | Self::LowBattery)
    }

    /// Human-readable message for the code.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Ok => "OK Action executed",
            Self::ActionFailed => "ERROR Error while executing an Action",
            Self::Busy => "Device is busy now, please try later",
            Self::ProtocolMismatch => "Communication protocol version incompatible",
            Self::Unsupported => "Device does not support this Command",
            Self::LowBattery => "Device low battery",
            Self::Encrypted => "Device is encrypted",
            Self::Unencrypted => "Device is unencrypted",
            Self::PasswordError => "Password error",
            Self::UnsupportedEncryption => "Device does not support this encryption method",
            Self::MeshNotFound => "Failed to locate a nearby mesh Device",
            Self::NetworkJoinFailed => "Failed to connect to the network",
            Self::Unknown(_) => "Unknown status",
        }
    }
}

impl From<u8> for StatusCode {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

impl From<StatusCode> for u8 {
    fn from(status: StatusCode) -> Self {
        status.to_byte()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02x})", self.description(), self.to_byte())
    }
}
