//! Temporal classification of query dates.
//!
//! All comparisons happen in the location's local timezone, never in UTC or
//! the server's timezone. "Today" in Tokyo and "today" in New York are
//! different UTC intervals.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::types::{DataSourceChoice, TemporalClass};

/// Dates at least this many days before now are served from the archive.
///
/// The live forecast endpoint keeps a few days of recent past; beyond that
/// only the archive has data. Policy constant, not probed from the API.
pub const ARCHIVE_CUTOFF_DAYS: i64 = 3;

/// Classify a target date against `now`, in the location's local time.
///
/// `Present` means the same local calendar day, not a rolling 24-hour window.
/// The archive cutoff compares `now` against local midnight of the target
/// date, so a date moves to the archive the moment it is three full local
/// days old.
pub fn classify(
    now: DateTime<Utc>,
    target_date: NaiveDate,
    tz: Tz,
) -> (TemporalClass, DataSourceChoice) {
    let now_local = now.with_timezone(&tz);
    let target_midnight = local_midnight(tz, target_date);
    let age = now_local.signed_duration_since(target_midnight);

    if age >= Duration::days(ARCHIVE_CUTOFF_DAYS) {
        // Anything old enough for the archive is necessarily in the past.
        return (TemporalClass::Past, DataSourceChoice::HistoricalArchive);
    }

    let class = match now_local.date_naive().cmp(&target_date) {
        Ordering::Less => TemporalClass::Future,
        Ordering::Equal => TemporalClass::Present,
        Ordering::Greater => TemporalClass::Past,
    };
    (class, DataSourceChoice::LiveForecast)
}

/// First valid instant of `date` in `tz`.
///
/// Midnight can be skipped by a DST transition; in that case the first clock
/// time after the gap counts as the start of the day. Ambiguous midnights
/// resolve to the earlier instant.
fn local_midnight(tz: Tz, date: NaiveDate) -> DateTime<Tz> {
    let mut naive = date.and_time(NaiveTime::MIN);
    for _ in 0..4 {
        match tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => return dt,
            LocalResult::Ambiguous(earliest, _) => return earliest,
            LocalResult::None => naive += Duration::minutes(30),
        }
    }
    // No zone in the tz database skips more than two hours at once.
    tz.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}
