//! Virtual playback time in milliseconds.
//! Comment sources and players both speak milliseconds, so the whole crate does too.

use std::time::Duration;

/// Milliseconds since the start of the comment timeline.
/// Signed so that offsets and differences need no special casing.
pub type Time = i64;

/// Time constants for conversions
pub mod constants {
    use super::Time;

    pub const MILLIS_PER_SECOND: Time = 1_000;
    pub const MILLIS_PER_MINUTE: Time = 60 * MILLIS_PER_SECOND;
    pub const MILLIS_PER_HOUR: Time = 60 * MILLIS_PER_MINUTE;
}

/// Time zero constant
pub const ZERO: Time = 0;

/// Convert seconds (f64) to milliseconds, rounding to the nearest millisecond
#[inline]
pub fn from_seconds(seconds: f64) -> Time {
    (seconds * constants::MILLIS_PER_SECOND as f64).round() as Time
}

/// Convert milliseconds to seconds (f64)
#[inline]
pub fn to_seconds(millis: Time) -> f64 {
    millis as f64 / constants::MILLIS_PER_SECOND as f64
}

/// Convert a wall-clock span to virtual milliseconds (saturating).
#[inline]
pub fn from_duration(duration: Duration) -> Time {
    Time::try_from(duration.as_millis()).unwrap_or(Time::MAX)
}

/// Convert virtual milliseconds to a wall-clock span. Negative values clamp to zero.
#[inline]
pub fn to_duration(millis: Time) -> Duration {
    Duration::from_millis(millis.max(0) as u64)
}

/// Format time as HH:MM:SS.mmm
pub fn format_time(millis: Time) -> String {
    let sign = if millis < 0 { "-" } else { "" };
    let millis = millis.abs();
    let hours = millis / constants::MILLIS_PER_HOUR;
    let minutes = (millis % constants::MILLIS_PER_HOUR) / constants::MILLIS_PER_MINUTE;
    let seconds = (millis % constants::MILLIS_PER_MINUTE) / constants::MILLIS_PER_SECOND;
    let rest = millis % constants::MILLIS_PER_SECOND;

    format!("{}{:02}:{:02}:{:02}.{:03}", sign, hours, minutes, seconds, rest)
}
