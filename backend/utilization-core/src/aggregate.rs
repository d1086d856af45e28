// src/aggregate.rs
use chrono::NaiveDateTime;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::thread;
use tracing::{debug, info, warn};

use crate::date_range::{MonthKey, ResolvedRange};
use crate::entry::TimeEntry;
use crate::targets::{round_tenths, MonthlyTarget};

pub const UNCATEGORIZED_OPS: &str = "Uncategorized";

pub fn is_adjustment(category: &str) -> bool {
    matches!(
        category.trim().to_lowercase().as_str(),
        "adjustment" | "adjustments"
    )
}

// --- People ---

/// Identity resolution from person id to display name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonDirectory {
    names: HashMap<String, String>,
}

impl PersonDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: &str, name: &str) {
        self.names.insert(id.to_string(), name.to_string());
    }

    /// Unknown ids are shown as-is.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.names.get(id).map(String::as_str).unwrap_or(id)
    }
}

impl<I: Into<String>> FromIterator<(I, I)> for PersonDirectory {
    fn from_iter<T: IntoIterator<Item = (I, I)>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

// --- Samples ---

/// A drill-down row kept alongside a rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySample {
    pub attorney: String,
    pub hours: Decimal,
    pub earnings: Decimal,
    pub date: NaiveDateTime,
    pub notes: Option<String>,
    /// Input position, used to order samples that share a timestamp.
    #[serde(skip)]
    pub seq: usize,
}

/// Keeps the `limit` most recent samples, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SampleBuffer {
    items: Vec<EntrySample>,
    #[serde(skip)]
    limit: usize,
}

impl SampleBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            limit,
        }
    }

    pub fn push(&mut self, sample: EntrySample) {
        self.items.push(sample);
        if self.items.len() > self.limit.saturating_mul(2).max(1) {
            self.compact();
        }
    }

    pub fn merge(&mut self, other: SampleBuffer) {
        self.items.extend(other.items);
        self.compact();
    }

    fn compact(&mut self) {
        self.items
            .sort_by(|a, b| b.date.cmp(&a.date).then(a.seq.cmp(&b.seq)));
        self.items.truncate(self.limit);
    }

    pub fn as_slice(&self) -> &[EntrySample] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// --- Rollups ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryHours {
    pub category: String,
    pub hours: Decimal,
}

/// Per-person totals for one reporting window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttorneyRollup {
    pub name: String,
    pub billable_hours: Decimal,
    pub ops_hours: Decimal,
    pub earnings: Decimal,
    pub entry_count: usize,
    pub categories: BTreeMap<String, Decimal>,
    pub clients: BTreeMap<String, Decimal>,
    pub active_months: BTreeSet<MonthKey>,
    pub billable_target: Decimal,
    pub ops_target: Decimal,
    pub total_target: Decimal,
    pub top_categories: Vec<CategoryHours>,
    /// Lowest input position at which each category appeared.
    #[serde(skip)]
    category_first_seen: BTreeMap<String, usize>,
}

impl AttorneyRollup {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            billable_hours: Decimal::ZERO,
            ops_hours: Decimal::ZERO,
            earnings: Decimal::ZERO,
            entry_count: 0,
            categories: BTreeMap::new(),
            clients: BTreeMap::new(),
            active_months: BTreeSet::new(),
            billable_target: Decimal::ZERO,
            ops_target: Decimal::ZERO,
            total_target: Decimal::ZERO,
            top_categories: Vec::new(),
            category_first_seen: BTreeMap::new(),
        }
    }

    pub fn total_hours(&self) -> Decimal {
        self.billable_hours + self.ops_hours
    }

    pub fn apply_target(&mut self, target: &MonthlyTarget) {
        self.billable_target = target.billable_target;
        self.ops_target = target.ops_target;
        self.total_target = target.total_target;
    }

    pub fn target(&self) -> MonthlyTarget {
        MonthlyTarget {
            billable_target: self.billable_target,
            ops_target: self.ops_target,
            total_target: self.total_target,
        }
    }

    fn add_category(&mut self, category: &str, hours: Decimal, seq: usize) {
        *self.categories.entry(category.to_string()).or_default() += hours;
        self.category_first_seen
            .entry(category.to_string())
            .and_modify(|first| *first = (*first).min(seq))
            .or_insert(seq);
    }

    fn merge(&mut self, other: AttorneyRollup) {
        self.billable_hours += other.billable_hours;
        self.ops_hours += other.ops_hours;
        self.earnings += other.earnings;
        self.entry_count += other.entry_count;
        for (category, hours) in other.categories {
            *self.categories.entry(category).or_default() += hours;
        }
        for (category, seq) in other.category_first_seen {
            self.category_first_seen
                .entry(category)
                .and_modify(|first| *first = (*first).min(seq))
                .or_insert(seq);
        }
        for (client, hours) in other.clients {
            *self.clients.entry(client).or_default() += hours;
        }
        self.active_months.extend(other.active_months);
    }

    /// Top `n` categories by hours. Equal hours keep the order in which the
    /// categories first appeared in the input.
    fn compute_top_categories(&mut self, n: usize) {
        let mut ranked: Vec<(&String, &Decimal)> = self.categories.iter().collect();
        ranked.sort_by(|a, b| {
            b.1.cmp(a.1).then_with(|| {
                let first_a = self.category_first_seen.get(a.0).copied().unwrap_or(usize::MAX);
                let first_b = self.category_first_seen.get(b.0).copied().unwrap_or(usize::MAX);
                first_a.cmp(&first_b)
            })
        });
        self.top_categories = ranked
            .into_iter()
            .take(n)
            .map(|(category, hours)| CategoryHours {
                category: category.clone(),
                hours: *hours,
            })
            .collect();
    }
}

/// Totals keyed by one dimension: client, billing category or ops category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionRollup {
    pub name: String,
    pub hours: Decimal,
    pub earnings: Decimal,
    pub entry_count: usize,
    pub by_person: BTreeMap<String, Decimal>,
    /// Share of this dimension's total hours, one decimal place.
    pub percentage: Decimal,
    pub samples: SampleBuffer,
}

pub type ClientRollup = DimensionRollup;
pub type CategoryRollup = DimensionRollup;
pub type OpsCategoryRollup = DimensionRollup;

impl DimensionRollup {
    pub fn new(name: &str, sample_limit: usize) -> Self {
        Self {
            name: name.to_string(),
            hours: Decimal::ZERO,
            earnings: Decimal::ZERO,
            entry_count: 0,
            by_person: BTreeMap::new(),
            percentage: Decimal::ZERO,
            samples: SampleBuffer::new(sample_limit),
        }
    }

    fn record(&mut self, person: &str, hours: Decimal, earnings: Decimal, sample: EntrySample) {
        self.hours += hours;
        self.earnings += earnings;
        self.entry_count += 1;
        *self.by_person.entry(person.to_string()).or_default() += hours;
        self.samples.push(sample);
    }

    fn merge(&mut self, other: DimensionRollup) {
        self.hours += other.hours;
        self.earnings += other.earnings;
        self.entry_count += other.entry_count;
        for (person, hours) in other.by_person {
            *self.by_person.entry(person).or_default() += hours;
        }
        self.samples.merge(other.samples);
    }
}

fn merge_dimension(
    into: &mut BTreeMap<String, DimensionRollup>,
    from: BTreeMap<String, DimensionRollup>,
) {
    for (key, rollup) in from {
        match into.get_mut(&key) {
            Some(existing) => existing.merge(rollup),
            None => {
                into.insert(key, rollup);
            }
        }
    }
}

fn assign_percentages(rollups: &mut BTreeMap<String, DimensionRollup>) {
    let total: Decimal = rollups.values().map(|r| r.hours).sum();
    for rollup in rollups.values_mut() {
        rollup.percentage = if total.is_zero() {
            Decimal::ZERO
        } else {
            round_tenths(rollup.hours / total * dec!(100))
        };
    }
}

// --- Aggregation ---

/// Everything one fold needs to know besides the entries themselves.
#[derive(Debug, Clone, Copy)]
pub struct AggregateContext<'a> {
    pub range: &'a ResolvedRange,
    pub tz: Tz,
    pub people: &'a PersonDirectory,
    /// Display names to keep; empty keeps everyone.
    pub allow_list: &'a HashSet<String>,
    pub sample_limit: usize,
}

/// The result of folding entries into rollups.
///
/// Folding is order independent: all sums are exact decimals, samples are
/// ranked by date then input position, and category tie-breaks use the
/// lowest input position rather than visiting order.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub attorneys: BTreeMap<String, AttorneyRollup>,
    pub clients: BTreeMap<String, ClientRollup>,
    pub categories: BTreeMap<String, CategoryRollup>,
    pub ops_categories: BTreeMap<String, OpsCategoryRollup>,
    pub entries_in_range: usize,
    pub skipped_entries: usize,
    sample_limit: usize,
}

impl Aggregation {
    pub fn new(sample_limit: usize) -> Self {
        Self {
            attorneys: BTreeMap::new(),
            clients: BTreeMap::new(),
            categories: BTreeMap::new(),
            ops_categories: BTreeMap::new(),
            entries_in_range: 0,
            skipped_entries: 0,
            sample_limit,
        }
    }

    /// Folds one entry. `seq` is the entry's position in the original input.
    pub fn fold_entry(&mut self, seq: usize, entry: &TimeEntry, ctx: &AggregateContext<'_>) {
        let Some(date) = entry.effective_date(ctx.tz) else {
            warn!(
                "Skipping entry {:?} for {}: no usable date",
                entry.id, entry.person_id
            );
            self.skipped_entries += 1;
            return;
        };
        if !ctx.range.contains(date) {
            return;
        }
        let name = ctx.people.display_name(&entry.person_id);
        if !ctx.allow_list.is_empty() && !ctx.allow_list.contains(name) {
            return;
        }

        self.entries_in_range += 1;
        let (billable, ops, earnings) = entry.sanitized_hours();
        let sample = |hours: Decimal| EntrySample {
            attorney: name.to_string(),
            hours,
            earnings,
            date,
            notes: entry.notes.clone(),
            seq,
        };

        let attorney = self
            .attorneys
            .entry(name.to_string())
            .or_insert_with(|| AttorneyRollup::new(name));
        attorney.billable_hours += billable;
        attorney.ops_hours += ops;
        attorney.earnings += earnings;
        attorney.entry_count += 1;
        attorney.active_months.insert(MonthKey::of(&date));

        let countable_category = billable > Decimal::ZERO && !is_adjustment(&entry.billing_category);
        if countable_category {
            attorney.add_category(&entry.billing_category, billable, seq);
        }
        *attorney.clients.entry(entry.client.clone()).or_default() += billable + ops;

        let sample_limit = self.sample_limit;
        self.clients
            .entry(entry.client.clone())
            .or_insert_with(|| DimensionRollup::new(&entry.client, sample_limit))
            .record(name, billable + ops, earnings, sample(billable + ops));

        if countable_category {
            self.categories
                .entry(entry.billing_category.clone())
                .or_insert_with(|| DimensionRollup::new(&entry.billing_category, sample_limit))
                .record(name, billable, earnings, sample(billable));
        }

        if ops > Decimal::ZERO {
            let ops_category = entry
                .ops_category
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or(UNCATEGORIZED_OPS);
            self.ops_categories
                .entry(ops_category.to_string())
                .or_insert_with(|| DimensionRollup::new(ops_category, sample_limit))
                .record(name, ops, Decimal::ZERO, sample(ops));
        }
    }

    /// Combines two partial folds over disjoint entries.
    pub fn merge(mut self, other: Aggregation) -> Aggregation {
        for (name, rollup) in other.attorneys {
            match self.attorneys.get_mut(&name) {
                Some(existing) => existing.merge(rollup),
                None => {
                    self.attorneys.insert(name, rollup);
                }
            }
        }
        merge_dimension(&mut self.clients, other.clients);
        merge_dimension(&mut self.categories, other.categories);
        merge_dimension(&mut self.ops_categories, other.ops_categories);
        self.entries_in_range += other.entries_in_range;
        self.skipped_entries += other.skipped_entries;
        self
    }

    /// Derives the read-side fields: top categories, percentages, sample order.
    pub fn finish(&mut self, top_n: usize) {
        for attorney in self.attorneys.values_mut() {
            attorney.compute_top_categories(top_n);
        }
        for rollups in [
            &mut self.clients,
            &mut self.categories,
            &mut self.ops_categories,
        ] {
            assign_percentages(rollups);
            for rollup in rollups.values_mut() {
                rollup.samples.compact();
            }
        }
    }

    pub fn total_billable_hours(&self) -> Decimal {
        self.attorneys.values().map(|a| a.billable_hours).sum()
    }
}

/// Single pass over `entries`.
pub fn aggregate(entries: &[TimeEntry], ctx: &AggregateContext<'_>, top_n: usize) -> Aggregation {
    let mut aggregation = Aggregation::new(ctx.sample_limit);
    for (seq, entry) in entries.iter().enumerate() {
        aggregation.fold_entry(seq, entry, ctx);
    }
    aggregation.finish(top_n);
    info!(
        "Aggregated {} of {} entries ({} skipped) into {} attorney rollups",
        aggregation.entries_in_range,
        entries.len(),
        aggregation.skipped_entries,
        aggregation.attorneys.len()
    );
    aggregation
}

/// Partitions entries by person, folds each partition on its own thread and
/// merges the results. Produces the same output as [`aggregate`].
pub fn aggregate_partitioned(
    entries: &[TimeEntry],
    ctx: &AggregateContext<'_>,
    top_n: usize,
    partitions: usize,
) -> Aggregation {
    let partitions = partitions.max(1);
    let mut by_person: BTreeMap<&str, Vec<(usize, &TimeEntry)>> = BTreeMap::new();
    for (seq, entry) in entries.iter().enumerate() {
        by_person
            .entry(entry.person_id.as_str())
            .or_default()
            .push((seq, entry));
    }

    let mut buckets: Vec<Vec<(usize, &TimeEntry)>> = vec![Vec::new(); partitions];
    for (idx, (_, person_entries)) in by_person.into_iter().enumerate() {
        buckets[idx % partitions].extend(person_entries);
    }
    debug!(
        "Aggregating {} entries across {} partitions",
        entries.len(),
        partitions
    );

    let partials: Vec<Aggregation> = thread::scope(|scope| {
        let handles: Vec<_> = buckets
            .iter()
            .map(|bucket| {
                scope.spawn(move || {
                    let mut partial = Aggregation::new(ctx.sample_limit);
                    for (seq, entry) in bucket {
                        partial.fold_entry(*seq, entry, ctx);
                    }
                    partial
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(partial) => partial,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    let mut merged = partials
        .into_iter()
        .fold(Aggregation::new(ctx.sample_limit), Aggregation::merge);
    merged.finish(top_n);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_range::{resolve_range, DateRangeSpec};
    use crate::entry::DateLike;
    use chrono::{NaiveDate, TimeZone, Utc};
    use chrono_tz::America::New_York;

    fn range(start: &str, end: &str) -> ResolvedRange {
        let spec = DateRangeSpec::Custom {
            start: NaiveDate::parse_from_str(start, "%Y-%m-%d").ok(),
            end: NaiveDate::parse_from_str(end, "%Y-%m-%d").ok(),
        };
        let now = Utc.with_ymd_and_hms(2025, 10, 15, 16, 0, 0).unwrap();
        resolve_range(&spec, now, New_York)
    }

    fn sample_entries() -> Vec<TimeEntry> {
        vec![
            TimeEntry::new("u1")
                .billable(dec!(3))
                .category("Litigation")
                .client("Acme")
                .earnings(dec!(900))
                .on("2025-03-04"),
            TimeEntry::new("u1")
                .billable(dec!(2))
                .ops(dec!(1))
                .category("Contracts")
                .ops_category("Training")
                .client("Acme")
                .earnings(dec!(600))
                .on("2025-03-05"),
            TimeEntry::new("u2")
                .billable(dec!(4))
                .category("Litigation")
                .client("Globex")
                .earnings(dec!(1000))
                .on("2025-03-06"),
            TimeEntry::new("u2")
                .ops(dec!(2))
                .client("Internal")
                .on("2025-03-07"),
            TimeEntry::new("u1")
                .billable(dec!(8))
                .category("Litigation")
                .on("2025-04-02"),
        ]
    }

    fn people() -> PersonDirectory {
        [("u1", "Ada Lovelace"), ("u2", "Grace Hopper")]
            .into_iter()
            .collect()
    }

    fn run(entries: &[TimeEntry], allow: &HashSet<String>) -> Aggregation {
        let range = range("2025-03-01", "2025-03-31");
        let people = people();
        let ctx = AggregateContext {
            range: &range,
            tz: New_York,
            people: &people,
            allow_list: allow,
            sample_limit: 50,
        };
        aggregate(entries, &ctx, 5)
    }

    #[test]
    fn folds_person_totals_within_range() {
        let agg = run(&sample_entries(), &HashSet::new());
        let ada = &agg.attorneys["Ada Lovelace"];
        assert_eq!(ada.billable_hours, dec!(5));
        assert_eq!(ada.ops_hours, dec!(1));
        assert_eq!(ada.earnings, dec!(1500));
        assert_eq!(ada.clients["Acme"], dec!(6));
        assert_eq!(ada.active_months.len(), 1);
        assert_eq!(agg.entries_in_range, 4);
        assert_eq!(agg.total_billable_hours(), dec!(9));
    }

    #[test]
    fn unknown_person_id_falls_back_to_id() {
        let entries = vec![TimeEntry::new("u9").billable(dec!(1)).on("2025-03-10")];
        let agg = run(&entries, &HashSet::new());
        assert!(agg.attorneys.contains_key("u9"));
    }

    #[test]
    fn allow_list_matches_display_names() {
        let allow: HashSet<String> = ["Grace Hopper".to_string()].into_iter().collect();
        let agg = run(&sample_entries(), &allow);
        assert_eq!(agg.attorneys.len(), 1);
        assert_eq!(agg.attorneys["Grace Hopper"].billable_hours, dec!(4));
        assert!(!agg.clients.contains_key("Acme"));
    }

    #[test]
    fn adjustments_stay_out_of_category_breakdowns() {
        let entries = vec![
            TimeEntry::new("u1").billable(dec!(3)).category("Adjustment").on("2025-03-10"),
            TimeEntry::new("u1").billable(dec!(1)).category("ADJUSTMENTS").on("2025-03-11"),
            TimeEntry::new("u1").billable(dec!(2)).category("Litigation").on("2025-03-12"),
        ];
        let agg = run(&entries, &HashSet::new());
        let ada = &agg.attorneys["Ada Lovelace"];
        assert_eq!(ada.billable_hours, dec!(6));
        assert_eq!(ada.categories.len(), 1);
        assert_eq!(ada.categories["Litigation"], dec!(2));
        assert!(!agg.categories.contains_key("Adjustment"));
    }

    #[test]
    fn dimension_percentages_use_their_own_total() {
        let agg = run(&sample_entries(), &HashSet::new());
        // Clients: Acme 6h, Globex 4h, Internal 2h
        assert_eq!(agg.clients["Acme"].percentage, dec!(50.0));
        assert_eq!(agg.clients["Globex"].percentage, dec!(33.3));
        assert_eq!(agg.clients["Internal"].percentage, dec!(16.7));
        // Categories: Litigation 7h, Contracts 2h
        assert_eq!(agg.categories["Litigation"].percentage, dec!(77.8));
        assert_eq!(agg.categories["Litigation"].by_person["Grace Hopper"], dec!(4));
        assert_eq!(agg.ops_categories[UNCATEGORIZED_OPS].hours, dec!(2));
        assert_eq!(agg.ops_categories["Training"].percentage, dec!(33.3));
    }

    #[test]
    fn samples_are_capped_and_newest_first() {
        let base = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let entries: Vec<TimeEntry> = (0..120)
            .map(|i| {
                TimeEntry::new("u1")
                    .billable(dec!(1))
                    .client("Acme")
                    .dated(DateLike::Local(base + chrono::Duration::hours(i * 5)))
            })
            .collect();
        let agg = run(&entries, &HashSet::new());
        let buffer = &agg.clients["Acme"].samples;
        assert!(!buffer.is_empty());
        assert_eq!(buffer.len(), 50);
        let samples = buffer.as_slice();
        assert!(samples.windows(2).all(|w| w[0].date >= w[1].date));
        assert_eq!(agg.clients["Acme"].entry_count, 120);
    }

    #[test]
    fn top_categories_break_ties_by_first_appearance() {
        let entries = vec![
            TimeEntry::new("u1").billable(dec!(2)).category("Zoning").on("2025-03-03"),
            TimeEntry::new("u1").billable(dec!(2)).category("Appeals").on("2025-03-04"),
            TimeEntry::new("u1").billable(dec!(5)).category("Tax").on("2025-03-05"),
        ];
        let agg = run(&entries, &HashSet::new());
        let top: Vec<&str> = agg.attorneys["Ada Lovelace"]
            .top_categories
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(top, vec!["Tax", "Zoning", "Appeals"]);
    }

    #[test]
    fn undated_entries_are_counted_as_skipped() {
        let entries = vec![
            TimeEntry::new("u1").billable(dec!(2)),
            TimeEntry::new("u1").billable(dec!(1)).on("2025-03-03"),
        ];
        let agg = run(&entries, &HashSet::new());
        assert_eq!(agg.skipped_entries, 1);
        assert_eq!(agg.entries_in_range, 1);
    }

    #[test]
    fn partitioned_fold_matches_single_pass() {
        let entries = sample_entries();
        let range = range("2025-03-01", "2025-04-30");
        let people = people();
        let allow = HashSet::new();
        let ctx = AggregateContext {
            range: &range,
            tz: New_York,
            people: &people,
            allow_list: &allow,
            sample_limit: 50,
        };
        let single = aggregate(&entries, &ctx, 5);
        for partitions in 1..=4 {
            assert_eq!(aggregate_partitioned(&entries, &ctx, 5, partitions), single);
        }
    }

    #[test]
    fn merge_is_commutative() {
        let entries = sample_entries();
        let range = range("2025-03-01", "2025-04-30");
        let people = people();
        let allow = HashSet::new();
        let ctx = AggregateContext {
            range: &range,
            tz: New_York,
            people: &people,
            allow_list: &allow,
            sample_limit: 50,
        };
        let fold = |slice: &[(usize, &TimeEntry)]| {
            let mut agg = Aggregation::new(50);
            for (seq, entry) in slice {
                agg.fold_entry(*seq, entry, &ctx);
            }
            agg
        };
        let indexed: Vec<(usize, &TimeEntry)> = entries.iter().enumerate().collect();
        let (left, right) = indexed.split_at(2);

        let mut ab = fold(left).merge(fold(right));
        let mut ba = fold(right).merge(fold(left));
        ab.finish(5);
        ba.finish(5);
        assert_eq!(ab, ba);
    }
}
