// src/date_range.rs
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::business_days::{first_day_of_month, last_day_of_month};
use crate::error::ReportError;

const TRAILING_WINDOW_DAYS: i64 = 60;

// --- Month Keys ---

/// A calendar month, serialized as `"YYYY-MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of<D: Datelike>(date: &D) -> Self {
        Self::new(date.year(), date.month())
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        first_day_of_month(self.year, self.month)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        last_day_of_month(self.year, self.month)
    }

    /// Midnight on the first of the month.
    pub fn start(&self) -> Option<NaiveDateTime> {
        self.first_day().map(start_of_day)
    }

    /// The last millisecond of the month.
    pub fn end(&self) -> Option<NaiveDateTime> {
        self.last_day().map(end_of_day)
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self::new(self.year - 1, 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ReportError::InvalidMonthKey(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self::new(year, month))
    }
}

impl Serialize for MonthKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// 23:59:59.999, matching millisecond-resolution timestamps upstream.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
}

// --- Period Specification ---

/// A reporting period as the presentation layer asks for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DateRangeSpec {
    AllTime,
    CurrentWeek,
    CurrentMonth,
    LastMonth,
    #[serde(rename = "trailing-60")]
    Trailing60,
    Custom {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

impl DateRangeSpec {
    /// Builds a spec from a preset name plus optional custom bounds.
    pub fn from_preset(
        name: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self, ReportError> {
        match name.trim().to_lowercase().as_str() {
            "all-time" | "all" => Ok(Self::AllTime),
            "current-week" | "week" => Ok(Self::CurrentWeek),
            "current-month" | "month" => Ok(Self::CurrentMonth),
            "last-month" => Ok(Self::LastMonth),
            "trailing-60" | "60-days" => Ok(Self::Trailing60),
            "custom" => Ok(Self::Custom { start, end }),
            other => Err(ReportError::InvalidPeriod(other.to_string())),
        }
    }
}

/// Concrete bounds in reference-local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRange {
    /// `None` means unbounded (all time).
    pub start_date: Option<NaiveDateTime>,
    pub end_date: NaiveDateTime,
    pub now: NaiveDateTime,
    pub current_month_key: MonthKey,
    /// True when the window reaches into the calendar month containing `now`.
    pub is_current_month_in_progress: bool,
}

impl ResolvedRange {
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start_date.map_or(true, |start| at >= start) && at <= self.end_date
    }
}

/// Maps a period spec onto concrete bounds, evaluated in `tz` at the given `now`.
pub fn resolve_range(spec: &DateRangeSpec, now: DateTime<Utc>, tz: Tz) -> ResolvedRange {
    let now_local = now.with_timezone(&tz).naive_local();
    let today = now_local.date();
    let current_month_key = MonthKey::of(&today);

    let (start_date, end_date) = match spec {
        DateRangeSpec::AllTime => (None, now_local),
        DateRangeSpec::CurrentWeek => {
            let sunday = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
            (Some(start_of_day(sunday)), now_local)
        }
        DateRangeSpec::CurrentMonth => current_month_bounds(today, now_local),
        DateRangeSpec::LastMonth => {
            let previous = current_month_key.previous();
            match (previous.start(), previous.end()) {
                (Some(start), Some(end)) => (Some(start), end),
                _ => current_month_bounds(today, now_local),
            }
        }
        DateRangeSpec::Trailing60 => (
            Some(now_local - Duration::days(TRAILING_WINDOW_DAYS)),
            now_local,
        ),
        DateRangeSpec::Custom {
            start: Some(start),
            end: Some(end),
        } => (Some(start_of_day(*start)), end_of_day(*end)),
        DateRangeSpec::Custom { start, end } => {
            warn!(
                "Custom range is missing a bound (start: {:?}, end: {:?}); using current month",
                start, end
            );
            current_month_bounds(today, now_local)
        }
    };

    let is_current_month_in_progress = MonthKey::of(&end_date) >= current_month_key
        && start_date.map_or(true, |start| MonthKey::of(&start) <= current_month_key);

    ResolvedRange {
        start_date,
        end_date,
        now: now_local,
        current_month_key,
        is_current_month_in_progress,
    }
}

fn current_month_bounds(
    today: NaiveDate,
    now_local: NaiveDateTime,
) -> (Option<NaiveDateTime>, NaiveDateTime) {
    let first = today.with_day(1).unwrap_or(today);
    (Some(start_of_day(first)), now_local)
}
