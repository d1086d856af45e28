// src/entry.rs
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BILLING_CATEGORY: &str = "Other";
pub const DEFAULT_CLIENT: &str = "Unknown";

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

// --- Date Values ---

/// Every shape a time entry's date can arrive in.
///
/// Deserializes untagged, so `"2025-06-01"`, `"2025-06-01T14:00:00Z"` and
/// `{"seconds": 1748736000, "nanoseconds": 0}` are all accepted from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateLike {
    Timestamp {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(default, alias = "_nanoseconds")]
        nanoseconds: u32,
    },
    MonthOf {
        year: i32,
        #[serde(alias = "monthName")]
        month: String,
    },
    Iso(String),
    #[serde(skip)]
    Instant(DateTime<Utc>),
    #[serde(skip)]
    Local(NaiveDateTime),
}

/// Converts any [`DateLike`] into a wall-clock time in the reference timezone.
///
/// This is the single date coercion used by the whole crate; aggregation,
/// range filtering and active-month detection all go through it.
pub fn normalize_date(value: &DateLike, tz: Tz) -> Option<NaiveDateTime> {
    match value {
        DateLike::Local(naive) => Some(*naive),
        DateLike::Instant(instant) => Some(instant.with_timezone(&tz).naive_local()),
        DateLike::Timestamp {
            seconds,
            nanoseconds,
        } => Utc
            .timestamp_opt(*seconds, *nanoseconds)
            .single()
            .map(|instant| instant.with_timezone(&tz).naive_local()),
        DateLike::Iso(raw) => parse_iso(raw.trim(), tz),
        DateLike::MonthOf { year, month } => {
            let month = month_number(month)?;
            NaiveDate::from_ymd_opt(*year, month, 1).map(|d| d.and_time(NaiveTime::MIN))
        }
    }
}

fn parse_iso(raw: &str, tz: Tz) -> Option<NaiveDateTime> {
    if raw.is_empty() {
        return None;
    }
    // Instants with an offset are converted; naive stamps are taken as reference-local.
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&tz).naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Accepts "March", "mar", "MAR" or "3".
pub fn month_number(name: &str) -> Option<u32> {
    let name = name.trim().to_lowercase();
    if let Ok(n) = name.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    if name.len() < 3 {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|full| *full == name || (name.len() == 3 && full.starts_with(&name)))
        .map(|idx| idx as u32 + 1)
}

// --- Time Entries ---

/// One recorded unit of work, as handed over by the storage layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub person_id: String,
    #[serde(default)]
    pub billable_hours: Decimal,
    #[serde(default)]
    pub ops_hours: Decimal,
    #[serde(default = "default_billing_category")]
    pub billing_category: String,
    #[serde(default)]
    pub ops_category: Option<String>,
    #[serde(default = "default_client")]
    pub client: String,
    #[serde(default)]
    pub earnings: Decimal,
    #[serde(default)]
    pub date: Option<DateLike>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, alias = "monthName")]
    pub month: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_billing_category() -> String {
    DEFAULT_BILLING_CATEGORY.to_string()
}

fn default_client() -> String {
    DEFAULT_CLIENT.to_string()
}

impl TimeEntry {
    pub fn new(person_id: &str) -> Self {
        Self {
            id: None,
            person_id: person_id.to_string(),
            billable_hours: Decimal::ZERO,
            ops_hours: Decimal::ZERO,
            billing_category: default_billing_category(),
            ops_category: None,
            client: default_client(),
            earnings: Decimal::ZERO,
            date: None,
            year: None,
            month: None,
            notes: None,
        }
    }

    pub fn billable(mut self, hours: Decimal) -> Self {
        self.billable_hours = hours;
        self
    }
    pub fn ops(mut self, hours: Decimal) -> Self {
        self.ops_hours = hours;
        self
    }
    pub fn category(mut self, c: &str) -> Self {
        self.billing_category = c.to_string();
        self
    }
    pub fn ops_category(mut self, c: &str) -> Self {
        self.ops_category = Some(c.to_string());
        self
    }
    pub fn client(mut self, c: &str) -> Self {
        self.client = c.to_string();
        self
    }
    pub fn earnings(mut self, amount: Decimal) -> Self {
        self.earnings = amount;
        self
    }
    pub fn dated(mut self, date: DateLike) -> Self {
        self.date = Some(date);
        self
    }
    pub fn on(self, iso: &str) -> Self {
        self.dated(DateLike::Iso(iso.to_string()))
    }
    pub fn in_month(mut self, year: i32, month: &str) -> Self {
        self.year = Some(year);
        self.month = Some(month.to_string());
        self
    }
    pub fn note(mut self, n: &str) -> Self {
        self.notes = Some(n.to_string());
        self
    }

    /// The entry's own date, falling back to the start of its `(year, month)`.
    /// `None` means the entry carries no usable date at all.
    pub fn effective_date(&self, tz: Tz) -> Option<NaiveDateTime> {
        if let Some(date) = self.date.as_ref().and_then(|d| normalize_date(d, tz)) {
            return Some(date);
        }
        match (self.year, self.month.as_ref()) {
            (Some(year), Some(month)) => normalize_date(
                &DateLike::MonthOf {
                    year,
                    month: month.clone(),
                },
                tz,
            ),
            _ => None,
        }
    }

    /// Hours and earnings are clamped at zero; negative values are treated as malformed.
    pub fn sanitized_hours(&self) -> (Decimal, Decimal, Decimal) {
        (
            self.billable_hours.max(Decimal::ZERO),
            self.ops_hours.max(Decimal::ZERO),
            self.earnings.max(Decimal::ZERO),
        )
    }
}
