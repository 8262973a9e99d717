//! Commands understood by the bot.
//!
//! Every command frame starts with [`MAGIC`], followed by a major opcode,
//! an optional sub-operation selector and the operation payload.

use crate::types::{DeviceTime, TimerSetup};

/// First byte of every command frame.
pub const MAGIC: u8 = 0x57;

/// Major operation selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Arm movement (press, on, off).
    Action = 0x01,
    /// Query battery, firmware and timer count.
    GetBasicInfo = 0x02,
    /// Read clock or timer information.
    GetTimeInfo = 0x08,
    /// Write clock or timer configuration.
    SetTimeInfo = 0x09,
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> Self {
        op as Self
    }
}

/// Sub-operations of [`Opcode::GetTimeInfo`] and [`Opcode::SetTimeInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TimeOp {
    /// Device clock.
    Clock = 0x01,
    /// Number of timer slots in use.
    TimerCount = 0x02,
    /// Timer slot configuration.
    Timer = 0x03,
}

impl From<TimeOp> for u8 {
    fn from(op: TimeOp) -> Self {
        op as Self
    }
}

/// Stride between timer slot selectors in the get-timer-info command.
pub const TIMER_SELECTOR_STRIDE: u8 = 0x10;

/// Number of timer records carried by one set-timer frame.
pub const TIMERS_PER_FRAME: u8 = 0x01;

/// A command for the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Query battery, firmware version and timer count.
    GetBasicInfo,
    /// Press and release the arm.
    Press,
    /// Switch on.
    TurnOn,
    /// Switch off.
    TurnOff,
    /// Read the device clock.
    GetDeviceTime,
    /// Set the device clock.
    SetDeviceTime(DeviceTime),
    /// Set the number of timer slots in use (0-5).
    SetTimerCount(u8),
    /// Read one timer slot (0-4).
    GetTimerInfo(u8),
    /// Write one timer slot.
    SetTimer(TimerSetup),
}

impl Command {
    /// Returns the kind used to pick the response decoder.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::GetBasicInfo => CommandKind::GetBasicInfo,
            Self::Press => CommandKind::Press,
            Self::TurnOn => CommandKind::TurnOn,
            Self::TurnOff => CommandKind::TurnOff,
            Self::GetDeviceTime => CommandKind::GetDeviceTime,
            Self::SetDeviceTime(_) => CommandKind::SetDeviceTime,
            Self::SetTimerCount(_) => CommandKind::SetTimerCount,
            Self::GetTimerInfo(_) => CommandKind::GetTimerInfo,
            Self::SetTimer(_) => CommandKind::SetTimer,
        }
    }
}

/// Payload-free discriminant of [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    GetBasicInfo,
    Press,
    TurnOn,
    TurnOff,
    GetDeviceTime,
    SetDeviceTime,
    SetTimerCount,
    GetTimerInfo,
    SetTimer,
}

impl CommandKind {
    /// Returns true if a successful response carries only the status byte.
    #[must_use]
    pub const fn is_status_only(&self) -> bool {
        !matches!(
            self,
            Self::GetBasicInfo | Self::GetDeviceTime | Self::GetTimerInfo
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HhMm;

    #[test]
    fn test_opcode_values() {
        assert_eq!(MAGIC, 0x57);
        assert_eq!(u8::from(Opcode::Action), 0x01);
        assert_eq!(u8::from(Opcode::GetBasicInfo), 0x02);
        assert_eq!(u8::from(Opcode::GetTimeInfo), 0x08);
        assert_eq!(u8::from(Opcode::SetTimeInfo), 0x09);
        assert_eq!(u8::from(TimeOp::Timer), 0x03);
    }

    #[test]
    fn test_command_kind() {
        assert_eq!(Command::Press.kind(), CommandKind::Press);
        assert_eq!(Command::GetTimerInfo(2).kind(), CommandKind::GetTimerInfo);
        assert_eq!(
            Command::SetTimer(TimerSetup::new(0, HhMm::new(1, 2))).kind(),
            CommandKind::SetTimer
        );
    }

    #[test]
    fn test_status_only_kinds() {
        assert!(CommandKind::Press.is_status_only());
        assert!(CommandKind::SetTimer.is_status_only());
        assert!(!CommandKind::GetBasicInfo.is_status_only());
        assert!(!CommandKind::GetTimerInfo.is_status_only());
    }
}
