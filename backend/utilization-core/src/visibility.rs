// src/visibility.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::aggregate::AttorneyRollup;
use crate::date_range::ResolvedRange;

/// Hides a person from display lists once a reporting window starts after the cutoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRule {
    pub person_name: String,
    pub hide_after_date: NaiveDate,
}

/// Static rule table, built once from configuration and injected per call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityRules {
    cutoffs: HashMap<String, NaiveDate>,
}

impl VisibilityRules {
    pub fn new(rules: Vec<VisibilityRule>) -> Self {
        // With duplicate names the earliest cutoff wins.
        let mut cutoffs: HashMap<String, NaiveDate> = HashMap::new();
        for rule in rules {
            cutoffs
                .entry(rule.person_name)
                .and_modify(|existing| *existing = (*existing).min(rule.hide_after_date))
                .or_insert(rule.hide_after_date);
        }
        Self { cutoffs }
    }

    pub fn is_empty(&self) -> bool {
        self.cutoffs.is_empty()
    }

    /// A window that straddles the cutoff still shows the person; an
    /// unbounded window always does.
    pub fn is_visible(&self, person: &str, range: &ResolvedRange) -> bool {
        match (self.cutoffs.get(person), range.start_date) {
            (Some(cutoff), Some(start)) => start.date() <= *cutoff,
            _ => true,
        }
    }

    /// The display view of a set of rollups. Firm totals must be taken from
    /// the unfiltered input, not from this.
    pub fn display_view<'a>(
        &self,
        rollups: impl IntoIterator<Item = &'a AttorneyRollup>,
        range: &ResolvedRange,
    ) -> Vec<&'a AttorneyRollup> {
        rollups
            .into_iter()
            .filter(|rollup| {
                let visible = self.is_visible(&rollup.name, range);
                if !visible {
                    debug!("Hiding {} from display view", rollup.name);
                }
                visible
            })
            .collect()
    }
}

impl FromIterator<VisibilityRule> for VisibilityRules {
    fn from_iter<T: IntoIterator<Item = VisibilityRule>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Names for person pickers: visible in this window, sorted, deduplicated.
pub fn visible_people<'a>(
    names: impl IntoIterator<Item = &'a str>,
    rules: &VisibilityRules,
    range: &ResolvedRange,
) -> Vec<String> {
    let mut visible: Vec<String> = names
        .into_iter()
        .filter(|name| rules.is_visible(name, range))
        .map(str::to_string)
        .collect();
    visible.sort();
    visible.dedup();
    visible
}
