//! Cron-style ingestion schedule.
//!
//! Expressions have six fields, `sec min hour day month weekday`. Only hourly
//! and daily triggers are supported: `sec` and `min` must be numbers, `hour`
//! is a number or `*`, and the remaining fields must be `*`. Times are UTC.

use chrono::{DateTime, Duration, DurationRound, Utc};
use std::{fmt, str::FromStr};

pub const DEFAULT_SCHEDULE: &str = "0 15 * * * *";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSchedule {
    second: u32,
    minute: u32,
    hour: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid schedule '{expr}': {reason}")]
pub struct ScheduleError {
    expr: String,
    reason: String,
}

impl IngestSchedule {
    pub fn hourly(minute: u32, second: u32) -> Self {
        Self { second, minute, hour: None }
    }

    /// The first trigger instant strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let step = if self.hour.is_some() { Duration::days(1) } else { Duration::hours(1) };

        // Truncation to whole hours/days of a valid UTC instant cannot fail.
        let period_start = now.duration_trunc(step).unwrap_or(now);
        let offset = Duration::hours(i64::from(self.hour.unwrap_or(0)))
            + Duration::minutes(i64::from(self.minute))
            + Duration::seconds(i64::from(self.second));

        let candidate = period_start + offset;
        if candidate > now { candidate } else { candidate + step }
    }
}

impl Default for IngestSchedule {
    fn default() -> Self {
        Self::hourly(15, 0)
    }
}

impl FromStr for IngestSchedule {
    type Err = ScheduleError;

    fn from_str(expr: &str) -> Result<Self, Self::Err> {
        let fail = |reason: &str| ScheduleError { expr: expr.to_string(), reason: reason.into() };

        let fields: Vec<&str> = expr.split_whitespace().collect();
        let [second, minute, hour, day, month, weekday] = fields[..] else {
            return Err(fail("expected 6 fields: sec min hour day month weekday"));
        };

        if [day, month, weekday].iter().any(|field| *field != "*") {
            return Err(fail("day, month and weekday must be '*'"));
        }

        let number = |field: &str, max: u32, name: &str| {
            field
                .parse::<u32>()
                .ok()
                .filter(|value| *value <= max)
                .ok_or_else(|| fail(&format!("{name} must be a number between 0 and {max}")))
        };

        let hour = match hour {
            "*" => None,
            value => Some(number(value, 23, "hour")?),
        };

        Ok(Self {
            second: number(second, 59, "second")?,
            minute: number(minute, 59, "minute")?,
            hour,
        })
    }
}

impl fmt::Display for IngestSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.hour {
            Some(hour) => write!(f, "{} {} {} * * *", self.second, self.minute, hour),
            None => write!(f, "{} {} * * * *", self.second, self.minute),
        }
    }
}
