//! Helpers for interval-repeating timers.
//!
//! Two counting rules exist for how many activations fit between a start
//! and an end time. [`calc_sum_times`] floors `(end - start) / interval`;
//! [`calc_sum_times_inclusive`] also counts the activation at the start
//! time. Which one the device firmware expects for `repeat_sum` has not been
//! confirmed on hardware.

use crate::types::{HhMm, HhMmSs};

/// Number of whole intervals between `start` and `end`.
///
/// Returns 0 when `end` is before `start` or the interval is zero.
/// Saturates at `u8::MAX`, the largest count the device stores.
#[must_use]
pub fn calc_sum_times(start: HhMm, end: HhMm, interval: HhMmSs) -> u8 {
    let (start, end, interval) = (start.as_secs(), end.as_secs(), interval.as_secs());
    if start > end || interval == 0 {
        return 0;
    }
    u8::try_from((end - start) / interval).unwrap_or(u8::MAX)
}

/// Number of activations from `start` through `end`, counting the one at
/// `start`.
#[must_use]
pub fn calc_sum_times_inclusive(start: HhMm, end: HhMm, interval: HhMmSs) -> u8 {
    if start > end || interval.as_secs() == 0 {
        return 0;
    }
    calc_sum_times(start, end, interval).saturating_add(1)
}

/// Time of day `times` intervals after `start`.
///
/// Clamps to 23:59 instead of crossing midnight.
#[must_use]
pub fn to_end_time(start: HhMm, interval: HhMmSs, times: u8) -> HhMm {
    let span = start.as_secs() + u32::from(times) * interval.as_secs();
    let hours = span / 3600;
    if hours >= 24 {
        return HhMm::new(23, 59);
    }
    HhMm::new(hours as u8, ((span % 3600) / 60) as u8)
}
