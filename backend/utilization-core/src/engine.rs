// src/engine.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::info;

use crate::aggregate::{
    aggregate, AggregateContext, Aggregation, AttorneyRollup, CategoryRollup, ClientRollup,
    DimensionRollup, OpsCategoryRollup, PersonDirectory,
};
use crate::config::EngineConfig;
use crate::date_range::{resolve_range, DateRangeSpec, ResolvedRange};
use crate::entry::TimeEntry;
use crate::targets::{prorated_target, MonthlyTarget, TargetTable};
use crate::utilization::{average_utilization, utilization_for, UtilizationResult};
use crate::visibility::visible_people;

/// Everything one report run reads. The caller owns the data; the engine
/// only borrows it and keeps no state between calls.
#[derive(Debug, Clone, Copy)]
pub struct ReportInputs<'a> {
    pub entries: &'a [TimeEntry],
    pub targets: &'a TargetTable,
    pub people: &'a PersonDirectory,
    pub period: &'a DateRangeSpec,
    pub now: DateTime<Utc>,
}

/// Firm-wide sums, always taken over every person regardless of visibility.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FirmTotals {
    pub billable_hours: Decimal,
    pub ops_hours: Decimal,
    pub earnings: Decimal,
    pub billable_target: Decimal,
    pub ops_target: Decimal,
    pub total_target: Decimal,
    pub avg_utilization: i64,
    pub headcount: usize,
    pub skipped_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilizationReport {
    pub range: ResolvedRange,
    /// Display view: visibility rules applied.
    pub attorney_rollups: Vec<AttorneyRollup>,
    pub firm_totals: FirmTotals,
    pub client_rollups: Vec<ClientRollup>,
    pub category_rollups: Vec<CategoryRollup>,
    pub ops_category_rollups: Vec<OpsCategoryRollup>,
    pub utilization_by_person: BTreeMap<String, UtilizationResult>,
    pub selectable_people: Vec<String>,
    /// Full-totals view: every person, before visibility filtering.
    #[serde(skip)]
    pub all_attorney_rollups: Vec<AttorneyRollup>,
}

/// Single-person detail view, computed by the same engine run as the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDetail {
    pub name: String,
    pub range: ResolvedRange,
    pub rollup: AttorneyRollup,
    pub utilization: UtilizationResult,
    /// No entries in the window; the target shown is the unscaled monthly one.
    pub is_empty_state: bool,
    pub visible: bool,
}

fn by_hours_then_name(a: &AttorneyRollup, b: &AttorneyRollup) -> Ordering {
    b.total_hours()
        .cmp(&a.total_hours())
        .then_with(|| a.name.cmp(&b.name))
}

fn sorted_dimension(rollups: BTreeMap<String, DimensionRollup>) -> Vec<DimensionRollup> {
    let mut list: Vec<DimensionRollup> = rollups.into_values().collect();
    list.sort_by(|a, b| b.hours.cmp(&a.hours).then_with(|| a.name.cmp(&b.name)));
    list
}

fn run_aggregation(
    inputs: &ReportInputs<'_>,
    config: &EngineConfig,
    range: &ResolvedRange,
    allow_list: &HashSet<String>,
) -> Aggregation {
    let ctx = AggregateContext {
        range,
        tz: config.timezone,
        people: inputs.people,
        allow_list,
        sample_limit: config.sample_limit,
    };
    let mut aggregation = aggregate(inputs.entries, &ctx, config.top_categories);
    for rollup in aggregation.attorneys.values_mut() {
        let target = prorated_target(
            inputs.targets,
            &rollup.name,
            &rollup.active_months,
            range,
            &config.default_target,
        );
        rollup.apply_target(&target);
    }
    aggregation
}

fn firm_totals(rollups: &[AttorneyRollup], skipped_entries: usize) -> FirmTotals {
    let results: Vec<UtilizationResult> = rollups.iter().map(utilization_for).collect();
    let mut totals = FirmTotals {
        billable_hours: Decimal::ZERO,
        ops_hours: Decimal::ZERO,
        earnings: Decimal::ZERO,
        billable_target: Decimal::ZERO,
        ops_target: Decimal::ZERO,
        total_target: Decimal::ZERO,
        avg_utilization: average_utilization(&results),
        headcount: rollups.len(),
        skipped_entries,
    };
    for rollup in rollups {
        totals.billable_hours += rollup.billable_hours;
        totals.ops_hours += rollup.ops_hours;
        totals.earnings += rollup.earnings;
        totals.billable_target += rollup.billable_target;
        totals.ops_target += rollup.ops_target;
        totals.total_target += rollup.total_target;
    }
    totals
}

/// Runs the whole pipeline: resolve the window, fold entries, pro-rate
/// targets, compute utilization and split full totals from the display view.
///
/// `person_filter` is the optional allow-list of display names; empty means
/// everyone.
pub fn generate_report(
    inputs: &ReportInputs<'_>,
    config: &EngineConfig,
    person_filter: &[String],
) -> UtilizationReport {
    let range = resolve_range(inputs.period, inputs.now, config.timezone);
    let allow_list: HashSet<String> = person_filter.iter().cloned().collect();
    let aggregation = run_aggregation(inputs, config, &range, &allow_list);
    let skipped_entries = aggregation.skipped_entries;

    let mut all_attorney_rollups: Vec<AttorneyRollup> =
        aggregation.attorneys.into_values().collect();
    all_attorney_rollups.sort_by(by_hours_then_name);
    let totals = firm_totals(&all_attorney_rollups, skipped_entries);

    let attorney_rollups: Vec<AttorneyRollup> = config
        .visibility
        .display_view(&all_attorney_rollups, &range)
        .into_iter()
        .cloned()
        .collect();
    let utilization_by_person: BTreeMap<String, UtilizationResult> = attorney_rollups
        .iter()
        .map(|rollup| (rollup.name.clone(), utilization_for(rollup)))
        .collect();

    // Pickers also list people who only have targets on file.
    let candidates: BTreeSet<&str> = all_attorney_rollups
        .iter()
        .map(|r| r.name.as_str())
        .chain(inputs.targets.people())
        .collect();
    let selectable_people = visible_people(candidates, &config.visibility, &range);

    info!(
        "Report for {:?}: {} people ({} displayed), {} billable hours",
        inputs.period,
        all_attorney_rollups.len(),
        attorney_rollups.len(),
        totals.billable_hours
    );

    UtilizationReport {
        range,
        attorney_rollups,
        firm_totals: totals,
        client_rollups: sorted_dimension(aggregation.clients),
        category_rollups: sorted_dimension(aggregation.categories),
        ops_category_rollups: sorted_dimension(aggregation.ops_categories),
        utilization_by_person,
        selectable_people,
        all_attorney_rollups,
    }
}

/// The detail view for one person: the same engine run, restricted to them.
pub fn person_detail(inputs: &ReportInputs<'_>, config: &EngineConfig, name: &str) -> PersonDetail {
    let report = generate_report(inputs, config, &[name.to_string()]);
    let visible = config.visibility.is_visible(name, &report.range);

    let (rollup, is_empty_state) = match report
        .all_attorney_rollups
        .into_iter()
        .find(|r| r.name == name)
    {
        Some(rollup) => (rollup, false),
        None => {
            let target: MonthlyTarget = prorated_target(
                inputs.targets,
                name,
                &BTreeSet::new(),
                &report.range,
                &config.default_target,
            );
            let mut empty = AttorneyRollup::new(name);
            empty.apply_target(&target);
            (empty, true)
        }
    };

    PersonDetail {
        name: name.to_string(),
        range: report.range,
        utilization: utilization_for(&rollup),
        rollup,
        is_empty_state,
        visible,
    }
}
