//! Data types for bot entities.
//!
//! This module contains the core data structures used throughout the library:
//! - Device information and clock readings
//! - Timer slot configuration
//! - Scheduling helpers for interval timers

pub mod device;
pub mod schedule;
pub mod timer;

pub use device::{DeviceInfo, DeviceTime};
pub use schedule::{calc_sum_times, calc_sum_times_inclusive, to_end_time};
pub use timer::{
    Action, HhMm, HhMmSs, MAX_TIMERS, REPEAT_ONCE_FLAG, Repeat, TimerMode, TimerSetup, WeekDays,
};
