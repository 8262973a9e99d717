//! Frame encoding for bot commands.
//!
//! Frames are raw byte sequences with no length prefix; each command fixes
//! its layout. Multi-byte integers are big-endian.
//! ```text
//! ┌──────────┬──────────┬──────────────┬─────────────────┐
//! │  0x57    │  opcode  │  sub-op      │    payload      │
//! │  1 byte  │  1 byte  │  0-1 bytes   │   0-11 bytes    │
//! └──────────┴──────────┴──────────────┴─────────────────┘
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::protocol::command::{
    Command, MAGIC, Opcode, TIMER_SELECTOR_STRIDE, TIMERS_PER_FRAME, TimeOp,
};
use crate::types::{Action, MAX_TIMERS, TimerSetup};

/// Longest command frame (set-timer).
pub const MAX_FRAME_SIZE: usize = 14;

/// Encodes a command into its wire frame.
///
/// Parameters are validated first; an out-of-range value yields
/// [`Error::InvalidParameter`] and nothing is encoded.
pub fn encode(command: &Command) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(MAX_FRAME_SIZE);
    buf.put_u8(MAGIC);

    match command {
        Command::GetBasicInfo => buf.put_u8(Opcode::GetBasicInfo.into()),
        Command::Press => put_action(&mut buf, Action::Press),
        Command::TurnOn => put_action(&mut buf, Action::On),
        Command::TurnOff => put_action(&mut buf, Action::Off),
        Command::GetDeviceTime => {
            buf.put_u8(Opcode::GetTimeInfo.into());
            buf.put_u8(TimeOp::Clock.into());
        }
        Command::SetDeviceTime(time) => {
            buf.put_u8(Opcode::SetTimeInfo.into());
            buf.put_u8(TimeOp::Clock.into());
            buf.put_u64(time.seconds);
        }
        Command::SetTimerCount(count) => {
            if *count > MAX_TIMERS {
                return Err(Error::invalid(format!(
                    "timer count {count} out of range (0 to {MAX_TIMERS})"
                )));
            }
            buf.put_u8(Opcode::SetTimeInfo.into());
            buf.put_u8(TimeOp::TimerCount.into());
            buf.put_u8(*count);
        }
        Command::GetTimerInfo(index) => {
            if *index >= MAX_TIMERS {
                return Err(Error::invalid(format!(
                    "timer index {index} out of range (0 to {})",
                    MAX_TIMERS - 1
                )));
            }
            buf.put_u8(Opcode::GetTimeInfo.into());
            buf.put_u8(u8::from(TimeOp::Timer) + index * TIMER_SELECTOR_STRIDE);
        }
        Command::SetTimer(timer) => put_timer(&mut buf, timer)?,
    }

    Ok(buf.freeze())
}

fn put_action(buf: &mut BytesMut, action: Action) {
    buf.put_u8(Opcode::Action.into());
    buf.put_u8(action.into());
}

fn put_timer(buf: &mut BytesMut, timer: &TimerSetup) -> Result<()> {
    timer.validate()?;

    buf.put_u8(Opcode::SetTimeInfo.into());
    buf.put_u8(TimeOp::Timer.into());
    buf.put_u8(TIMERS_PER_FRAME);
    buf.put_u8(timer.index);
    buf.put_u8(timer.repeat_mask());
    buf.put_u8(timer.start_time.hours);
    buf.put_u8(timer.start_time.minutes);
    buf.put_u8(timer.mode.into());
    buf.put_u8(timer.action.into());
    buf.put_u8(timer.repeat_sum);
    buf.put_u8(timer.interval.hours);
    buf.put_u8(timer.interval.minutes);
    buf.put_u8(timer.interval.seconds_tenths()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeviceTime, HhMm, HhMmSs, Repeat, TimerMode, WeekDays};

    #[test]
    fn test_encode_simple_commands() {
        assert_eq!(&encode(&Command::GetBasicInfo).unwrap()[..], &[0x57, 0x02]);
        assert_eq!(&encode(&Command::Press).unwrap()[..], &[0x57, 0x01, 0x00]);
        assert_eq!(&encode(&Command::TurnOn).unwrap()[..], &[0x57, 0x01, 0x01]);
        assert_eq!(&encode(&Command::TurnOff).unwrap()[..], &[0x57, 0x01, 0x02]);
        assert_eq!(
            &encode(&Command::GetDeviceTime).unwrap()[..],
            &[0x57, 0x08, 0x01]
        );
    }

    #[test]
    fn test_encode_set_device_time() {
        let frame = encode(&Command::SetDeviceTime(DeviceTime::from_seconds(
            0x0102_0304_0506_0708,
        )))
        .unwrap();
        assert_eq!(
            &frame[..],
            &[0x57, 0x09, 0x01, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
        );
    }

    #[test]
    fn test_encode_timer_count() {
        assert_eq!(
            &encode(&Command::SetTimerCount(5)).unwrap()[..],
            &[0x57, 0x09, 0x02, 0x05]
        );
        assert!(matches!(
            encode(&Command::SetTimerCount(6)),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_encode_get_timer_info() {
        assert_eq!(
            &encode(&Command::GetTimerInfo(0)).unwrap()[..],
            &[0x57, 0x08, 0x03]
        );
        assert_eq!(
            &encode(&Command::GetTimerInfo(4)).unwrap()[..],
            &[0x57, 0x08, 0x43]
        );
        assert!(encode(&Command::GetTimerInfo(5)).is_err());
    }

    #[test]
    fn test_encode_set_timer() {
        let mut timer = TimerSetup::new(0, HhMm::new(12, 53));
        timer.mode = TimerMode::RepeatForever;
        timer.interval = HhMmSs::new(0, 15, 30);

        let frame = encode(&Command::SetTimer(timer)).unwrap();
        assert_eq!(frame.len(), MAX_FRAME_SIZE);
        assert_eq!(
            &frame[..],
            &[
                0x57, 0x09, 0x03, 0x01, // header, one timer
                0x00, 0x7F, 12, 53, // index, all days, start
                0x02, 0x00, 0x00, // mode, press, repeat sum
                0x00, 15, 3, // interval
            ]
        );
    }

    #[test]
    fn test_encode_set_timer_once_with_action() {
        let mut timer = TimerSetup::new(3, HhMm::new(6, 0));
        timer.repeat = Repeat::Once;
        timer.repeat_days = Some(WeekDays::MONDAY);
        timer.mode = TimerMode::RepeatSumTimes;
        timer.action = crate::types::Action::Off;
        timer.repeat_sum = 4;
        timer.interval = HhMmSs::new(1, 0, 0);

        let frame = encode(&Command::SetTimer(timer)).unwrap();
        assert_eq!(frame[4], 3);
        assert_eq!(frame[5], 0x80);
        assert_eq!(frame[8], 0x01);
        assert_eq!(frame[9], 0x02);
        assert_eq!(frame[10], 4);
        assert_eq!(&frame[11..], &[1, 0, 0]);
    }

    #[test]
    fn test_encode_rejects_unaligned_interval() {
        let mut timer = TimerSetup::new(0, HhMm::new(8, 0));
        timer.interval = HhMmSs::new(0, 1, 15);
        assert!(matches!(
            encode(&Command::SetTimer(timer)),
            Err(Error::InvalidParameter { .. })
        ));
    }
}
