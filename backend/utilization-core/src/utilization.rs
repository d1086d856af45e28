// src/utilization.rs
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::aggregate::AttorneyRollup;

/// Display classification of an overall utilization percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UtilizationBand {
    OnTarget,
    NearTarget,
    OffTarget,
}

impl UtilizationBand {
    pub fn classify(percent: i64) -> Self {
        match percent {
            95..=105 => Self::OnTarget,
            90..=94 | 106..=110 => Self::NearTarget,
            _ => Self::OffTarget,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilizationResult {
    pub overall: i64,
    pub billable: i64,
    pub ops: i64,
    pub band: UtilizationBand,
}

/// `100 * actual / target` rounded to a whole percent; 0 for a zero target.
pub fn percent_of(actual: Decimal, target: Decimal) -> i64 {
    if target <= Decimal::ZERO {
        return 0;
    }
    (actual * dec!(100) / target)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

pub fn utilization_for(rollup: &AttorneyRollup) -> UtilizationResult {
    let overall = percent_of(rollup.total_hours(), rollup.total_target);
    UtilizationResult {
        overall,
        billable: percent_of(rollup.billable_hours, rollup.billable_target),
        ops: percent_of(rollup.ops_hours, rollup.ops_target),
        band: UtilizationBand::classify(overall),
    }
}

/// Mean of the given overall percentages, rounded; 0 when there are none.
pub fn average_utilization<'a>(results: impl IntoIterator<Item = &'a UtilizationResult>) -> i64 {
    let (sum, count) = results
        .into_iter()
        .fold((0i64, 0i64), |(sum, count), r| (sum + r.overall, count + 1));
    if count == 0 {
        return 0;
    }
    percent_of(Decimal::from(sum), Decimal::from(count * 100))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::MonthlyTarget;

    fn rollup(billable: Decimal, ops: Decimal, target: MonthlyTarget) -> AttorneyRollup {
        let mut r = AttorneyRollup::new("Ada");
        r.billable_hours = billable;
        r.ops_hours = ops;
        r.apply_target(&target);
        r
    }

    #[test]
    fn percentages_against_default_targets() {
        let result = utilization_for(&rollup(dec!(98), dec!(45), MonthlyTarget::default()));
        assert_eq!(result.overall, 95);
        assert_eq!(result.billable, 98);
        assert_eq!(result.ops, 90);
        assert_eq!(result.band, UtilizationBand::OnTarget);
    }

    #[test]
    fn zero_target_yields_zero_percent() {
        let target = MonthlyTarget {
            billable_target: dec!(0),
            ops_target: dec!(0),
            total_target: dec!(0),
        };
        let result = utilization_for(&rollup(dec!(5), dec!(0), target));
        assert_eq!(result.overall, 0);
        assert_eq!(result.billable, 0);
        assert_eq!(result.ops, 0);
        assert_eq!(result.band, UtilizationBand::OffTarget);
    }

    #[test]
    fn rounds_half_up() {
        assert_eq!(percent_of(dec!(1), dec!(8)), 13); // 12.5
        assert_eq!(percent_of(dec!(52.4), dec!(52.4)), 100);
    }

    #[test]
    fn band_edges() {
        assert_eq!(UtilizationBand::classify(95), UtilizationBand::OnTarget);
        assert_eq!(UtilizationBand::classify(105), UtilizationBand::OnTarget);
        assert_eq!(UtilizationBand::classify(90), UtilizationBand::NearTarget);
        assert_eq!(UtilizationBand::classify(94), UtilizationBand::NearTarget);
        assert_eq!(UtilizationBand::classify(110), UtilizationBand::NearTarget);
        assert_eq!(UtilizationBand::classify(89), UtilizationBand::OffTarget);
        assert_eq!(UtilizationBand::classify(111), UtilizationBand::OffTarget);
    }

    #[test]
    fn average_of_overall_percentages() {
        let a = utilization_for(&rollup(dec!(150), dec!(0), MonthlyTarget::default()));
        let b = utilization_for(&rollup(dec!(75), dec!(0), MonthlyTarget::default()));
        assert_eq!(average_utilization([&a, &b]), 75);
        assert_eq!(average_utilization(std::iter::empty()), 0);
    }
}
