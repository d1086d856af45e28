// src/business_days.rs
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Monday to Friday. No holiday calendar is modelled.
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Inclusive count of weekdays in `[start, end]`. Returns 0 when `start > end`.
pub fn count_business_days(start: NaiveDate, end: NaiveDate) -> u32 {
    if start > end {
        return 0;
    }

    // Whole weeks contribute five days each; only the remainder needs walking.
    let span = (end - start).num_days() + 1;
    let full_weeks = span / 7;
    let mut count = (full_weeks * 5) as u32;

    let mut current = start + Duration::days(full_weeks * 7);
    while current <= end {
        if is_business_day(current) {
            count += 1;
        }
        current += Duration::days(1);
    }
    count
}

pub fn first_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).and_then(|d| d.pred_opt())
}

/// Number of weekdays in the given calendar month, or 0 for an invalid month.
pub fn month_business_day_total(year: i32, month: u32) -> u32 {
    match (first_day_of_month(year, month), last_day_of_month(year, month)) {
        (Some(first), Some(last)) => count_business_days(first, last),
        _ => 0,
    }
}
