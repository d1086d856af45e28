// src/targets.rs
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use crate::business_days::{count_business_days, month_business_day_total};
use crate::date_range::{MonthKey, ResolvedRange};

// --- Monthly Targets ---

/// Hour targets for one person in one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTarget {
    pub billable_target: Decimal,
    pub ops_target: Decimal,
    pub total_target: Decimal,
}

impl Default for MonthlyTarget {
    fn default() -> Self {
        Self {
            billable_target: dec!(100),
            ops_target: dec!(50),
            total_target: dec!(150),
        }
    }
}

impl MonthlyTarget {
    pub fn zero() -> Self {
        Self {
            billable_target: Decimal::ZERO,
            ops_target: Decimal::ZERO,
            total_target: Decimal::ZERO,
        }
    }

    pub fn scaled(&self, fraction: Decimal) -> Self {
        Self {
            billable_target: self.billable_target * fraction,
            ops_target: self.ops_target * fraction,
            total_target: self.total_target * fraction,
        }
    }

    pub fn add(&mut self, other: &MonthlyTarget) {
        self.billable_target += other.billable_target;
        self.ops_target += other.ops_target;
        self.total_target += other.total_target;
    }

    /// Rounds each component to one decimal place, half away from zero.
    pub fn rounded(&self) -> Self {
        Self {
            billable_target: round_tenths(self.billable_target),
            ops_target: round_tenths(self.ops_target),
            total_target: round_tenths(self.total_target),
        }
    }
}

pub fn round_tenths(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Stored targets keyed by person display name, then by month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetTable {
    by_person: HashMap<String, BTreeMap<MonthKey, MonthlyTarget>>,
}

impl TargetTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, person: &str, month: MonthKey, target: MonthlyTarget) {
        self.by_person
            .entry(person.to_string())
            .or_default()
            .insert(month, target);
    }

    pub fn get(&self, person: &str, month: MonthKey) -> Option<&MonthlyTarget> {
        self.by_person.get(person).and_then(|months| months.get(&month))
    }

    pub fn people(&self) -> impl Iterator<Item = &str> {
        self.by_person.keys().map(String::as_str)
    }

    /// The stored target for `month`, else the person's current-month target,
    /// else the firm-wide default.
    pub fn resolve(
        &self,
        person: &str,
        month: MonthKey,
        current_month: MonthKey,
        default: &MonthlyTarget,
    ) -> MonthlyTarget {
        self.get(person, month)
            .or_else(|| self.get(person, current_month))
            .copied()
            .unwrap_or(*default)
    }
}

// --- Pro-Rating ---

/// Whether a month's target has to be scaled for this window.
pub fn needs_prorating(month: MonthKey, range: &ResolvedRange) -> bool {
    let (Some(month_start), Some(month_end)) = (month.start(), month.end()) else {
        return false;
    };
    let starts_late = range.start_date.map_or(false, |start| start > month_start);
    let ends_early = range.end_date < month_end;
    starts_late || ends_early || month == range.current_month_key
}

/// Share of `month`'s business days covered by the window; 1 when the month
/// has no business days to divide by.
pub fn month_fraction(month: MonthKey, range: &ResolvedRange) -> Decimal {
    let (Some(month_start), Some(month_end)) = (month.start(), month.end()) else {
        return Decimal::ONE;
    };

    let effective_start = range
        .start_date
        .map_or(month_start, |start| start.max(month_start));
    let effective_end = if month == range.current_month_key {
        range.now.min(range.end_date)
    } else {
        range.end_date.min(month_end)
    };

    let total_days = month_business_day_total(month.year, month.month);
    if total_days == 0 {
        return Decimal::ONE;
    }
    let covered = count_business_days(effective_start.date(), effective_end.date());
    Decimal::from(covered) / Decimal::from(total_days)
}

/// Blended target for one person over one reporting window.
///
/// `active_months` are the months in which the person has at least one entry
/// inside the window. With no active months the unscaled target for the
/// current month is returned; callers use that for empty-state display only.
pub fn prorated_target(
    targets: &TargetTable,
    person: &str,
    active_months: &BTreeSet<MonthKey>,
    range: &ResolvedRange,
    default: &MonthlyTarget,
) -> MonthlyTarget {
    let current = range.current_month_key;
    if active_months.is_empty() {
        return targets.resolve(person, current, current, default);
    }

    let mut accumulated = MonthlyTarget::zero();
    for month in active_months {
        let stored = targets.resolve(person, *month, current, default);
        if needs_prorating(*month, range) {
            let fraction = month_fraction(*month, range);
            debug!(
                "Pro-rating {} for {}: fraction={}, stored={:?}",
                month, person, fraction, stored
            );
            accumulated.add(&stored.scaled(fraction));
        } else {
            accumulated.add(&stored);
        }
    }
    accumulated.rounded()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_range::{resolve_range, DateRangeSpec};
    use chrono::{NaiveDate, TimeZone, Utc};
    use chrono_tz::America::New_York;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn custom(start: &str, end: &str) -> ResolvedRange {
        let spec = DateRangeSpec::Custom {
            start: Some(d(start)),
            end: Some(d(end)),
        };
        let now = Utc.with_ymd_and_hms(2025, 10, 15, 16, 0, 0).unwrap();
        resolve_range(&spec, now, New_York)
    }

    fn march_table() -> TargetTable {
        let mut table = TargetTable::new();
        table.insert(
            "Ada",
            MonthKey::new(2025, 3),
            MonthlyTarget {
                billable_target: dec!(100),
                ops_target: dec!(40),
                total_target: dec!(140),
            },
        );
        table
    }

    fn months(keys: &[(i32, u32)]) -> BTreeSet<MonthKey> {
        keys.iter().map(|(y, m)| MonthKey::new(*y, *m)).collect()
    }

    #[test]
    fn partial_month_scales_by_business_days() {
        // 11 of March's 21 business days
        let range = custom("2025-03-01", "2025-03-17");
        let target = prorated_target(
            &march_table(),
            "Ada",
            &months(&[(2025, 3)]),
            &range,
            &MonthlyTarget::default(),
        );
        assert_eq!(target.billable_target, dec!(52.4));
        assert_eq!(target.ops_target, dec!(21.0));
        assert_eq!(target.total_target, dec!(73.3));
    }

    #[test]
    fn first_half_of_march_covers_ten_business_days() {
        let range = custom("2025-03-01", "2025-03-15");
        let target = prorated_target(
            &march_table(),
            "Ada",
            &months(&[(2025, 3)]),
            &range,
            &MonthlyTarget::default(),
        );
        // Mar 1 and Mar 15 2025 are Saturdays: 10 of 21 business days, not 11
        assert_eq!(target.billable_target, dec!(47.6));
    }

    #[test]
    fn full_past_month_is_not_scaled() {
        let range = custom("2025-03-01", "2025-03-31");
        assert!(!needs_prorating(MonthKey::new(2025, 3), &range));
        let target = prorated_target(
            &march_table(),
            "Ada",
            &months(&[(2025, 3)]),
            &range,
            &MonthlyTarget::default(),
        );
        assert_eq!(target.billable_target, dec!(100));
        assert_eq!(target.total_target, dec!(140));
    }

    #[test]
    fn multi_month_window_blends_targets() {
        // Feb 17 to Mar 31: 10 of Feb's 20 business days, then all of March
        let range = custom("2025-02-17", "2025-03-31");
        let target = prorated_target(
            &march_table(),
            "Ada",
            &months(&[(2025, 2), (2025, 3)]),
            &range,
            &MonthlyTarget::default(),
        );
        // February has no stored target and there is none for the current
        // month either, so the default 100 applies there.
        assert_eq!(target.billable_target, dec!(150.0));
    }

    #[test]
    fn in_progress_month_counts_only_elapsed_days() {
        let now = Utc.with_ymd_and_hms(2025, 3, 12, 16, 0, 0).unwrap();
        let range = resolve_range(&DateRangeSpec::CurrentMonth, now, New_York);
        let target = prorated_target(
            &march_table(),
            "Ada",
            &months(&[(2025, 3)]),
            &range,
            &MonthlyTarget::default(),
        );
        // Mar 3..12 is 8 business days of 21
        assert_eq!(target.billable_target, dec!(38.1));
    }

    #[test]
    fn no_active_months_returns_unscaled_current_target() {
        let now = Utc.with_ymd_and_hms(2025, 3, 12, 16, 0, 0).unwrap();
        let range = resolve_range(&DateRangeSpec::CurrentMonth, now, New_York);
        let target = prorated_target(
            &march_table(),
            "Ada",
            &BTreeSet::new(),
            &range,
            &MonthlyTarget::default(),
        );
        assert_eq!(target.billable_target, dec!(100));

        let unknown = prorated_target(
            &march_table(),
            "Grace",
            &BTreeSet::new(),
            &range,
            &MonthlyTarget::default(),
        );
        assert_eq!(unknown, MonthlyTarget::default());
    }

    #[test]
    fn missing_month_falls_back_to_current_month_target() {
        let now = Utc.with_ymd_and_hms(2025, 3, 12, 16, 0, 0).unwrap();
        let range = resolve_range(&DateRangeSpec::AllTime, now, New_York);
        let resolved = march_table().resolve(
            "Ada",
            MonthKey::new(2024, 11),
            range.current_month_key,
            &MonthlyTarget::default(),
        );
        assert_eq!(resolved.billable_target, dec!(100));
        assert_eq!(resolved.ops_target, dec!(40));
    }

    #[test]
    fn target_table_deserializes_from_nested_json() {
        let raw = r#"{"Ada": {"2025-03": {"billableTarget": 120, "opsTarget": 30, "totalTarget": 150}}}"#;
        let table: TargetTable = serde_json::from_str(raw).unwrap();
        let target = table.get("Ada", MonthKey::new(2025, 3)).unwrap();
        assert_eq!(target.billable_target, dec!(120));
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round_tenths(dec!(52.35)), dec!(52.4));
        assert_eq!(round_tenths(dec!(52.25)), dec!(52.3));
    }
}
