//! Response decoding for the bot protocol.
//!
//! Every response starts with a status byte. Payload fields are only read
//! when the status is success.

use bytes::Buf;

use crate::error::DecodeError;
use crate::protocol::command::CommandKind;
use crate::protocol::status::StatusCode;
use crate::types::{
    Action, DeviceInfo, DeviceTime, HhMm, HhMmSs, REPEAT_ONCE_FLAG, Repeat, TimerMode, TimerSetup,
    WeekDays,
};

/// Response length of the basic info query.
const BASIC_INFO_LEN: usize = 9;

/// Response length of the device clock query.
const DEVICE_TIME_LEN: usize = 9;

/// Response length of a timer slot query.
const TIMER_INFO_LEN: usize = 12;

/// Decoded response to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The device reported a failure. No payload is decoded.
    Failed(StatusCode),
    /// Success with no payload.
    Done,
    /// Basic info query result.
    BasicInfo(DeviceInfo),
    /// Device clock reading.
    DeviceTime(DeviceTime),
    /// Timer slot configuration.
    TimerInfo(Box<TimerSetup>),
}

impl Response {
    /// Status the device reported.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Failed(status) => *status,
            _ => StatusCode::Ok,
        }
    }
}

/// Decodes a response with the decoder for the given command kind.
pub fn decode(kind: CommandKind, data: &[u8]) -> Result<Response, DecodeError> {
    let status = parse_status(data)?;
    if !status.is_success() {
        return Ok(Response::Failed(status));
    }

    let response = match kind {
        CommandKind::GetBasicInfo => Response::BasicInfo(parse_basic_info(data)?),
        CommandKind::GetDeviceTime => Response::DeviceTime(parse_device_time(data)?),
        CommandKind::GetTimerInfo => Response::TimerInfo(Box::new(parse_timer_info(data)?)),
        CommandKind::Press
        | CommandKind::TurnOn
        | CommandKind::TurnOff
        | CommandKind::SetDeviceTime
        | CommandKind::SetTimerCount
        | CommandKind::SetTimer => Response::Done,
    };
    Ok(response)
}

/// Reads the status byte.
pub fn parse_status(data: &[u8]) -> Result<StatusCode, DecodeError> {
    data.first()
        .map(|&byte| StatusCode::from_byte(byte))
        .ok_or(DecodeError::TooShort {
            expected: 1,
            got: 0,
        })
}

fn ensure_len(data: &[u8], expected: usize) -> Result<(), DecodeError> {
    if data.len() < expected {
        return Err(DecodeError::TooShort {
            expected,
            got: data.len(),
        });
    }
    Ok(())
}

/// Parses the basic info response.
///
/// Format:
/// ```text
/// [status:1] [battery%:1] [firmware:1] [reserved:5] [timer_count:1]
/// ```
pub fn parse_basic_info(data: &[u8]) -> Result<DeviceInfo, DecodeError> {
    ensure_len(data, BASIC_INFO_LEN)?;
    Ok(DeviceInfo {
        battery_percent: data[1],
        firmware: data[2],
        timer_count: data[8],
    })
}

/// Parses the device clock response.
///
/// Format:
/// ```text
/// [status:1] [seconds:8BE]
/// ```
pub fn parse_device_time(data: &[u8]) -> Result<DeviceTime, DecodeError> {
    ensure_len(data, DEVICE_TIME_LEN)?;
    let mut cursor = &data[1..];
    Ok(DeviceTime::from_seconds(cursor.get_u64()))
}

/// Parses a timer slot response.
///
/// Format:
/// ```text
/// [status:1] [reserved:1] [index:1] [repeat_mask:1] [start_h:1] [start_m:1]
/// [mode:1] [action:1] [repeat_sum:1] [interval_h:1] [interval_m:1]
/// [interval_s/10:1]
/// ```
pub fn parse_timer_info(data: &[u8]) -> Result<TimerSetup, DecodeError> {
    ensure_len(data, TIMER_INFO_LEN)?;

    let mut cursor = &data[2..];
    let index = cursor.get_u8();
    let mask = cursor.get_u8();
    let start_time = HhMm::new(cursor.get_u8(), cursor.get_u8());

    let repeat = if mask & REPEAT_ONCE_FLAG == 0 {
        Repeat::Daily
    } else {
        Repeat::Once
    };
    let repeat_days = WeekDays::from_bits(mask);

    let mode_byte = cursor.get_u8();
    let mode = match TimerMode::from_byte(mode_byte) {
        Some(mode) => mode,
        // disabled slots may hold a placeholder mode, e.g. 0x80
        None if repeat == Repeat::Daily && repeat_days.is_empty() => TimerMode::Daily,
        None => {
            return Err(DecodeError::InvalidValue {
                field: "timer mode",
                value: mode_byte,
            });
        }
    };
    let action_byte = cursor.get_u8();
    let action = Action::from_byte(action_byte).ok_or(DecodeError::InvalidValue {
        field: "timer action",
        value: action_byte,
    })?;

    let repeat_sum = cursor.get_u8();
    let (interval_hours, interval_minutes) = (cursor.get_u8(), cursor.get_u8());
    let tenths = cursor.get_u8();
    if tenths > 5 {
        return Err(DecodeError::InvalidValue {
            field: "interval seconds",
            value: tenths,
        });
    }
    let interval = HhMmSs::new(interval_hours, interval_minutes, tenths * 10);

    Ok(TimerSetup {
        index,
        start_time,
        repeat,
        repeat_days: Some(repeat_days),
        mode,
        action,
        repeat_sum,
        interval,
    })
}
