//! Timer slot types.
//!
//! The bot stores up to [`MAX_TIMERS`] scheduled activations. Each slot has a
//! start time, a repeat rule and an optional interval repetition.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Number of timer slots on the device.
pub const MAX_TIMERS: u8 = 5;

/// Flag bit in the repeat mask marking a one-shot timer.
pub const REPEAT_ONCE_FLAG: u8 = 0x80;

/// Time of day with minute resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HhMm {
    /// Hours (0-23).
    pub hours: u8,
    /// Minutes (0-59).
    pub minutes: u8,
}

impl HhMm {
    /// Creates a time of day.
    #[must_use]
    pub const fn new(hours: u8, minutes: u8) -> Self {
        Self { hours, minutes }
    }

    /// Seconds since midnight.
    #[must_use]
    pub const fn as_secs(self) -> u32 {
        self.hours as u32 * 3600 + self.minutes as u32 * 60
    }

    pub(crate) fn validate(self, what: &str) -> Result<()> {
        if self.hours > 23 {
            return Err(Error::invalid(format!(
                "{what} hours {} out of range (0 to 23)",
                self.hours
            )));
        }
        if self.minutes > 59 {
            return Err(Error::invalid(format!(
                "{what} minutes {} out of range (0 to 59)",
                self.minutes
            )));
        }
        Ok(())
    }
}

impl fmt::Display for HhMm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.hours, self.minutes)
    }
}

impl FromStr for HhMm {
    type Err = Error;

    /// Parses `hh:mm` as produced by a time input.
    fn from_str(s: &str) -> Result<Self> {
        let (hours, minutes) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| Error::invalid(format!("time '{s}' is not in hh:mm format")))?;
        let hours = hours
            .parse()
            .map_err(|_| Error::invalid(format!("invalid hours in '{s}'")))?;
        let minutes = minutes
            .parse()
            .map_err(|_| Error::invalid(format!("invalid minutes in '{s}'")))?;
        let time = Self { hours, minutes };
        time.validate("time")?;
        Ok(time)
    }
}

/// Duration with 10-second resolution on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HhMmSs {
    /// Hours.
    pub hours: u8,
    /// Minutes (0-59).
    pub minutes: u8,
    /// Seconds (0-59), a multiple of 10 when sent to the device.
    pub seconds: u8,
}

impl HhMmSs {
    /// Creates a duration.
    #[must_use]
    pub const fn new(hours: u8, minutes: u8, seconds: u8) -> Self {
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    /// Total seconds.
    #[must_use]
    pub const fn as_secs(self) -> u32 {
        self.hours as u32 * 3600 + self.minutes as u32 * 60 + self.seconds as u32
    }

    /// Seconds in units of ten, as the device stores them.
    ///
    /// Rejects values that are not a multiple of 10 instead of truncating.
    pub fn seconds_tenths(self) -> Result<u8> {
        if self.seconds % 10 != 0 {
            return Err(Error::invalid(format!(
                "interval seconds {} is not a multiple of 10",
                self.seconds
            )));
        }
        Ok(self.seconds / 10)
    }
}

impl fmt::Display for HhMmSs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// Whether a timer fires once or on selected week days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Repeat {
    /// Fire on the next occurrence of the start time only.
    Once,
    /// Fire every selected week day.
    #[default]
    Daily,
}

/// Repetition of the action after the start time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TimerMode {
    /// Fire at the start time only.
    #[default]
    Daily = 0x00,
    /// Repeat at `interval`, `repeat_sum` times in total.
    RepeatSumTimes = 0x01,
    /// Repeat at `interval` for the rest of the day.
    RepeatForever = 0x02,
}

impl TimerMode {
    /// Attempts to parse a mode from its wire byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Daily),
            0x01 => Some(Self::RepeatSumTimes),
            0x02 => Some(Self::RepeatForever),
            _ => None,
        }
    }
}

impl From<TimerMode> for u8 {
    fn from(mode: TimerMode) -> Self {
        mode as Self
    }
}

/// Movement performed by the bot arm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Action {
    /// Press and release.
    #[default]
    Press = 0x00,
    /// Switch on (press and hold).
    On = 0x01,
    /// Switch off (release).
    Off = 0x02,
}

impl Action {
    /// Attempts to parse an action from its wire byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Press),
            0x01 => Some(Self::On),
            0x02 => Some(Self::Off),
            _ => None,
        }
    }
}

impl From<Action> for u8 {
    fn from(action: Action) -> Self {
        action as Self
    }
}

/// 7-bit week day mask.
///
/// Bit 0 is Sunday up to bit 6 for Saturday. The bit order comes from the
/// community protocol notes and still needs checking against a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WeekDays(u8);

impl WeekDays {
    /// No day selected. On a daily timer this marks the slot disabled.
    pub const NONE: Self = Self(0);
    /// Every day of the week.
    pub const ALL: Self = Self(0x7F);
    pub const SUNDAY: Self = Self(1 << 0);
    pub const MONDAY: Self = Self(1 << 1);
    pub const TUESDAY: Self = Self(1 << 2);
    pub const WEDNESDAY: Self = Self(1 << 3);
    pub const THURSDAY: Self = Self(1 << 4);
    pub const FRIDAY: Self = Self(1 << 5);
    pub const SATURDAY: Self = Self(1 << 6);

    /// Creates a mask from raw bits, dropping the once flag.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if no day is selected.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true if every day in `other` is selected.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for WeekDays {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Configuration of one timer slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSetup {
    /// Slot index (0-4).
    pub index: u8,
    /// Time of the first activation.
    pub start_time: HhMm,
    /// Once or daily.
    pub repeat: Repeat,
    /// Days a daily timer is active. `None` means every day.
    pub repeat_days: Option<WeekDays>,
    /// Interval repetition after the start time.
    pub mode: TimerMode,
    /// Movement to perform.
    pub action: Action,
    /// Number of activations in [`TimerMode::RepeatSumTimes`], counting the
    /// one at the start time.
    pub repeat_sum: u8,
    /// Time between repeated activations.
    pub interval: HhMmSs,
}

impl TimerSetup {
    /// Creates a daily press timer for every day with no interval repetition.
    #[must_use]
    pub fn new(index: u8, start_time: HhMm) -> Self {
        Self {
            index,
            start_time,
            repeat: Repeat::Daily,
            repeat_days: None,
            mode: TimerMode::Daily,
            action: Action::Press,
            repeat_sum: 0,
            interval: HhMmSs::default(),
        }
    }

    /// Returns true unless this is a daily timer with no day selected.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.repeat == Repeat::Once || self.repeat_days != Some(WeekDays::NONE)
    }

    /// Marks the slot disabled the way the device expects.
    pub fn disable(&mut self) {
        self.repeat = Repeat::Daily;
        self.repeat_days = Some(WeekDays::NONE);
        self.mode = TimerMode::Daily;
    }

    /// Re-enables the slot for every day.
    pub fn enable(&mut self) {
        self.repeat_days = None;
    }

    /// Repeat mask byte: the once flag, or the selected days.
    #[must_use]
    pub fn repeat_mask(&self) -> u8 {
        match self.repeat {
            Repeat::Once => REPEAT_ONCE_FLAG,
            Repeat::Daily => self.repeat_days.unwrap_or(WeekDays::ALL).bits(),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.index >= MAX_TIMERS {
            return Err(Error::invalid(format!(
                "timer index {} out of range (0 to {})",
                self.index,
                MAX_TIMERS - 1
            )));
        }
        self.start_time.validate("start time")?;
        if self.interval.minutes > 59 {
            return Err(Error::invalid(format!(
                "interval minutes {} out of range (0 to 59)",
                self.interval.minutes
            )));
        }
        if self.interval.seconds > 59 {
            return Err(Error::invalid(format!(
                "interval seconds {} out of range (0 to 59)",
                self.interval.seconds
            )));
        }
        self.interval.seconds_tenths()?;
        Ok(())
    }
}
