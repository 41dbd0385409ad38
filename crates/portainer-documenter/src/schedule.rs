//! Daily trigger computation in a configured time zone.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Days, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::ConfigError;

/// Longest DST gap searched when the configured time does not exist locally.
const MAX_GAP_MINUTES: u32 = 3 * 60;

/// Run once a day at `time_of_day` local time in `timezone`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSpec {
    time_of_day: NaiveTime,
    timezone: Tz,
}

impl ScheduleSpec {
    pub fn new(time_of_day: NaiveTime, timezone: Tz) -> Self {
        Self {
            time_of_day,
            timezone,
        }
    }

    /// Parses `HH:MM` and an IANA zone name, failing on either being invalid.
    pub fn parse(time_of_day: &str, timezone: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(parse_time_of_day(time_of_day)?, parse_timezone(timezone)?))
    }

    pub fn time_of_day(&self) -> NaiveTime {
        self.time_of_day
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }
}

impl fmt::Display for ScheduleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "daily at {} {}", self.time_of_day.format("%H:%M"), self.timezone)
    }
}

pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, ConfigError> {
    let invalid = || ConfigError::InvalidScheduleTime {
        value: value.to_string(),
    };
    let (hour, minute) = value.trim().split_once(':').ok_or_else(invalid)?;
    if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
        return Err(invalid());
    }
    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

pub fn parse_timezone(value: &str) -> Result<Tz, ConfigError> {
    value
        .trim()
        .parse::<Tz>()
        .map_err(|_| ConfigError::UnknownTimezone(value.to_string()))
}

/// First instant strictly after `now` whose local time-of-day in the schedule's
/// zone is the configured time.
///
/// The candidate is built from a local date and time and then converted, so
/// a day with a DST change still fires at the configured wall-clock time. An
/// ambiguous local time resolves to its earlier instant; a time skipped by a
/// spring-forward gap resolves to the first valid minute after the gap.
pub fn next_trigger(now: DateTime<Utc>, spec: &ScheduleSpec) -> DateTime<Utc> {
    let today = now.with_timezone(&spec.timezone).date_naive();
    let mut date = today;
    loop {
        if let Some(candidate) = resolve_local(spec, date)
            && candidate > now
        {
            return candidate;
        }
        date = match date.checked_add_days(Days::new(1)) {
            Some(next) => next,
            // Past the last representable date; never fires.
            None => return DateTime::<Utc>::MAX_UTC,
        };
    }
}

/// Time left until `trigger`, zero if it already passed.
pub fn duration_until(now: DateTime<Utc>, trigger: DateTime<Utc>) -> Duration {
    (trigger - now).to_std().unwrap_or(Duration::ZERO)
}

fn resolve_local(spec: &ScheduleSpec, date: NaiveDate) -> Option<DateTime<Utc>> {
    let wanted = date.and_time(spec.time_of_day);
    match spec.timezone.from_local_datetime(&wanted) {
        LocalResult::Single(t) => Some(t.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => (1..=MAX_GAP_MINUTES).find_map(|offset| {
            let shifted = wanted + chrono::Duration::minutes(i64::from(offset));
            spec.timezone
                .from_local_datetime(&shifted)
                .earliest()
                .map(|t| t.with_timezone(&Utc))
        }),
    }
}
