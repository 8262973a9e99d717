//! Device information types.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};

/// Basic device information returned by the info query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Battery level in percent (0-100).
    pub battery_percent: u8,
    /// Raw firmware byte, tenths of a version.
    pub firmware: u8,
    /// Number of timer slots in use (0-5).
    pub timer_count: u8,
}

impl DeviceInfo {
    /// Firmware version as a decimal, e.g. 4.9 for a raw byte of 49.
    #[must_use]
    pub fn firmware_version(&self) -> f32 {
        f32::from(self.firmware) * 0.1
    }
}

/// Reading of the device clock.
///
/// The device has no timezone. It keeps the wall-clock time it was given,
/// encoded as seconds since the Unix epoch as if that wall clock were UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceTime {
    /// Raw seconds as sent on the wire.
    pub seconds: u64,
}

impl DeviceTime {
    /// Wraps raw wire seconds.
    #[must_use]
    pub const fn from_seconds(seconds: u64) -> Self {
        Self { seconds }
    }

    /// Encodes a zoned time as the device expects it: its local wall clock.
    ///
    /// Sub-second precision is dropped. Times before the epoch clamp to 0.
    #[must_use]
    pub fn from_wall_clock<Tz: TimeZone>(time: &DateTime<Tz>) -> Self {
        let seconds = time.naive_local().and_utc().timestamp();
        Self {
            seconds: u64::try_from(seconds).unwrap_or(0),
        }
    }

    /// Calendar time shown by the device clock.
    #[must_use]
    pub fn wall_clock(&self) -> Option<NaiveDateTime> {
        let seconds = i64::try_from(self.seconds).ok()?;
        DateTime::from_timestamp(seconds, 0).map(|utc| utc.naive_utc())
    }

    /// Interprets the device clock as wall-clock time in the given offset.
    #[must_use]
    pub fn at_offset(&self, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
        offset.from_local_datetime(&self.wall_clock()?).single()
    }

    /// Interprets the device clock as wall-clock time of the host timezone.
    #[must_use]
    pub fn local(&self) -> Option<DateTime<Local>> {
        Local.from_local_datetime(&self.wall_clock()?).earliest()
    }
}
