//! Tick-based time conversions.
//!
//! Durations and instants travel as an `i64` count of 100 ns ticks:
//! - Time span: signed ticks, mapped to [`chrono::TimeDelta`]
//! - Date/time: ticks since 0001-01-01T00:00:00Z, mapped to
//!   [`chrono::DateTime<Utc>`] and bounded by the end of year 9999

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{Error, Result};

const NANOS_PER_TICK: i64 = 100;
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Ticks between 0001-01-01 and 1970-01-01.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// Ticks of 9999-12-31T23:59:59.9999999Z.
pub const MAX_DATE_TIME_TICKS: i64 = 3_155_378_975_999_999_999;

fn split_ticks(ticks: i64) -> (i64, u32) {
    let secs = ticks.div_euclid(TICKS_PER_SECOND);
    // rem_euclid keeps the fraction in 0..TICKS_PER_SECOND
    let nanos = (ticks.rem_euclid(TICKS_PER_SECOND) * NANOS_PER_TICK) as u32;
    (secs, nanos)
}

/// Converts signed ticks to a duration.
pub fn ticks_to_time_delta(ticks: i64) -> Result<TimeDelta> {
    let (secs, nanos) = split_ticks(ticks);
    TimeDelta::new(secs, nanos).ok_or(Error::TicksOutOfRange { ticks })
}

/// Converts a duration to ticks, truncating sub-tick precision toward zero.
pub fn time_delta_to_ticks(delta: TimeDelta) -> Result<i64> {
    let secs = delta.num_seconds();
    let sub_ticks = i64::from(delta.subsec_nanos()) / NANOS_PER_TICK;
    secs.checked_mul(TICKS_PER_SECOND)
        .and_then(|ticks| ticks.checked_add(sub_ticks))
        .ok_or(Error::TicksOutOfRange {
            ticks: if secs < 0 { i64::MIN } else { i64::MAX },
        })
}

/// Converts ticks since 0001-01-01 to a UTC instant.
pub fn ticks_to_date_time(ticks: i64) -> Result<DateTime<Utc>> {
    if !(0..=MAX_DATE_TIME_TICKS).contains(&ticks) {
        return Err(Error::TicksOutOfRange { ticks });
    }
    let (secs, nanos) = split_ticks(ticks - UNIX_EPOCH_TICKS);
    DateTime::from_timestamp(secs, nanos).ok_or(Error::TicksOutOfRange { ticks })
}

/// Converts a UTC instant to ticks since 0001-01-01.
pub fn date_time_to_ticks(value: DateTime<Utc>) -> Result<i64> {
    let secs = value.timestamp();
    let sub_ticks = i64::from(value.timestamp_subsec_nanos()) / NANOS_PER_TICK;
    let ticks = secs
        .checked_mul(TICKS_PER_SECOND)
        .and_then(|ticks| ticks.checked_add(sub_ticks))
        .and_then(|ticks| ticks.checked_add(UNIX_EPOCH_TICKS))
        .ok_or(Error::TicksOutOfRange {
            ticks: if secs < 0 { i64::MIN } else { i64::MAX },
        })?;
    if !(0..=MAX_DATE_TIME_TICKS).contains(&ticks) {
        return Err(Error::TicksOutOfRange { ticks });
    }
    Ok(ticks)
}
