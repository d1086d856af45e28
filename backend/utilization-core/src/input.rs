// src/input.rs
//! Loaders for the files a storage export hands to the report binary.
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

use crate::aggregate::PersonDirectory;
use crate::entry::{DateLike, TimeEntry, DEFAULT_BILLING_CATEGORY, DEFAULT_CLIENT};
use crate::error::ReportError;
use crate::targets::TargetTable;
use crate::visibility::VisibilityRule;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ReportError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Loads entries from a `.json` array or a `.csv` export, by extension.
pub fn load_entries(path: &Path) -> Result<Vec<TimeEntry>, ReportError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    let entries = match extension.as_deref() {
        Some("json") => read_entries_json(fs::File::open(path)?)?,
        Some("csv") => read_entries_csv(fs::File::open(path)?)?,
        _ => return Err(ReportError::UnsupportedInput(path.display().to_string())),
    };
    info!("Loaded {} time entries from {}", entries.len(), path.display());
    Ok(entries)
}

pub fn load_targets(path: &Path) -> Result<TargetTable, ReportError> {
    read_json(path)
}

pub fn load_people(path: &Path) -> Result<PersonDirectory, ReportError> {
    read_json(path)
}

pub fn load_visibility_rules(path: &Path) -> Result<Vec<VisibilityRule>, ReportError> {
    read_json(path)
}

// --- JSON ---

/// One JSON record, read loosely so a single bad field never rejects the file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonEntryRow {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    person_id: Value,
    #[serde(default)]
    billable_hours: Value,
    #[serde(default)]
    ops_hours: Value,
    #[serde(default)]
    billing_category: Value,
    #[serde(default)]
    ops_category: Value,
    #[serde(default)]
    client: Value,
    #[serde(default)]
    earnings: Value,
    #[serde(default)]
    date: Value,
    #[serde(default)]
    year: Value,
    #[serde(default, alias = "monthName")]
    month: Value,
    #[serde(default)]
    notes: Value,
}

fn text_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(Some(s)),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn decimal_value(value: Value, column: &str, index: usize) -> Decimal {
    let raw = match value {
        Value::Null => return Decimal::ZERO,
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.trim().is_empty() => return Decimal::ZERO,
        Value::String(s) => s.trim().to_string(),
        other => {
            warn!("Entry {}: unreadable {} {}, using 0", index, column, other);
            return Decimal::ZERO;
        }
    };
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .unwrap_or_else(|_| {
            warn!("Entry {}: unreadable {} '{}', using 0", index, column, raw);
            Decimal::ZERO
        })
}

fn date_value(value: Value, index: usize) -> Option<DateLike> {
    if value.is_null() {
        return None;
    }
    match serde_json::from_value::<DateLike>(value) {
        Ok(date) => Some(date),
        Err(e) => {
            warn!("Entry {}: unreadable date ({}), falling back to year/month", index, e);
            None
        }
    }
}

impl JsonEntryRow {
    fn into_entry(self, index: usize) -> Option<TimeEntry> {
        let Some(person_id) = text_value(self.person_id) else {
            warn!("Skipping JSON entry {}: missing personId", index);
            return None;
        };
        Some(TimeEntry {
            id: text_value(self.id),
            person_id,
            billable_hours: decimal_value(self.billable_hours, "billableHours", index),
            ops_hours: decimal_value(self.ops_hours, "opsHours", index),
            billing_category: text_value(self.billing_category)
                .unwrap_or_else(|| DEFAULT_BILLING_CATEGORY.to_string()),
            ops_category: text_value(self.ops_category),
            client: text_value(self.client).unwrap_or_else(|| DEFAULT_CLIENT.to_string()),
            earnings: decimal_value(self.earnings, "earnings", index),
            date: date_value(self.date, index),
            year: text_value(self.year).and_then(|y| y.parse().ok()),
            month: text_value(self.month),
            notes: text_value(self.notes),
        })
    }
}

/// Reads a JSON array of entries. Fields that cannot be read fall back to
/// their defaults; records that are not objects or lack a `personId` are
/// skipped with a warning.
pub fn read_entries_json<R: Read>(reader: R) -> Result<Vec<TimeEntry>, ReportError> {
    let records: Vec<Value> = serde_json::from_reader(reader)?;
    let mut entries = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<JsonEntryRow>(record) {
            Ok(row) => entries.extend(row.into_entry(index)),
            Err(e) => warn!("Skipping JSON entry {}: {}", index, e),
        }
    }
    Ok(entries)
}

// --- CSV ---

/// One CSV row. Every cell is optional text so a bad cell never rejects the row.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvEntryRow {
    #[serde(default)]
    id: Option<String>,
    person_id: String,
    #[serde(default)]
    billable_hours: Option<String>,
    #[serde(default)]
    ops_hours: Option<String>,
    #[serde(default)]
    billing_category: Option<String>,
    #[serde(default)]
    ops_category: Option<String>,
    #[serde(default)]
    client: Option<String>,
    #[serde(default)]
    earnings: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    month: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

fn non_empty(cell: Option<String>) -> Option<String> {
    cell.map(|c| c.trim().to_string()).filter(|c| !c.is_empty())
}

fn decimal_cell(cell: Option<String>, column: &str, line: usize) -> Decimal {
    match non_empty(cell) {
        None => Decimal::ZERO,
        Some(raw) => Decimal::from_str(&raw).unwrap_or_else(|_| {
            warn!("Line {}: unreadable {} '{}', using 0", line, column, raw);
            Decimal::ZERO
        }),
    }
}

impl CsvEntryRow {
    fn into_entry(self, line: usize) -> TimeEntry {
        TimeEntry {
            id: non_empty(self.id),
            person_id: self.person_id.trim().to_string(),
            billable_hours: decimal_cell(self.billable_hours, "billableHours", line),
            ops_hours: decimal_cell(self.ops_hours, "opsHours", line),
            billing_category: non_empty(self.billing_category)
                .unwrap_or_else(|| DEFAULT_BILLING_CATEGORY.to_string()),
            ops_category: non_empty(self.ops_category),
            client: non_empty(self.client).unwrap_or_else(|| DEFAULT_CLIENT.to_string()),
            earnings: decimal_cell(self.earnings, "earnings", line),
            date: non_empty(self.date).map(DateLike::Iso),
            year: non_empty(self.year).and_then(|y| y.parse().ok()),
            month: non_empty(self.month),
            notes: non_empty(self.notes),
        }
    }
}

/// Reads entries from CSV with a header row. Rows that cannot be read at all
/// (for example a missing `personId`) are skipped with a warning.
pub fn read_entries_csv<R: Read>(reader: R) -> Result<Vec<TimeEntry>, ReportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut entries = Vec::new();
    for (idx, row) in csv_reader.deserialize::<CsvEntryRow>().enumerate() {
        let line = idx + 2;
        match row {
            Ok(row) => entries.push(row.into_entry(line)),
            Err(e) => warn!("Skipping CSV line {}: {}", line, e),
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn csv_rows_with_defaults_and_bad_cells() {
        let raw = "\
personId,billableHours,opsHours,billingCategory,opsCategory,client,earnings,date,year,month,notes
u1,2.5,,Litigation,,Acme,750,2025-03-04,,,Drafted motion
u2,abc,1,,Training,,,,2025,March,
,1,1,,,,,2025-03-04,,,
";
        let entries = read_entries_csv(raw.as_bytes()).unwrap();
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].billable_hours, dec!(2.5));
        assert_eq!(entries[0].ops_hours, dec!(0));
        assert_eq!(entries[0].notes.as_deref(), Some("Drafted motion"));
        assert_eq!(entries[0].date, Some(DateLike::Iso("2025-03-04".to_string())));

        assert_eq!(entries[1].billable_hours, dec!(0));
        assert_eq!(entries[1].billing_category, DEFAULT_BILLING_CATEGORY);
        assert_eq!(entries[1].client, DEFAULT_CLIENT);
        assert_eq!(entries[1].year, Some(2025));
        assert_eq!(entries[1].month.as_deref(), Some("March"));
        assert_eq!(entries[1].date, None);

        // An empty person id is kept; the aggregator shows it as-is.
        assert_eq!(entries[2].person_id, "");
    }

    #[test]
    fn json_records_with_bad_fields_are_defaulted_not_fatal() {
        let raw = r#"[
            {"personId": "u1", "billableHours": 2.5, "date": "2025-03-04"},
            {"personId": "u2", "billableHours": null, "opsHours": "1.5", "year": 2025, "month": 6},
            {"personId": "u3", "billableHours": 1, "date": [true], "earnings": "lots"},
            "not an entry",
            {"billableHours": 4},
            {"personId": "u4", "billableHours": 3, "date": {"seconds": 1741356000}}
        ]"#;
        let entries = read_entries_json(raw.as_bytes()).unwrap();
        assert_eq!(entries.len(), 4);

        assert_eq!(entries[0].billable_hours, dec!(2.5));
        assert_eq!(entries[0].date, Some(DateLike::Iso("2025-03-04".to_string())));

        // null hours become 0; a numeric month still resolves the entry's date
        assert_eq!(entries[1].billable_hours, dec!(0));
        assert_eq!(entries[1].ops_hours, dec!(1.5));
        assert_eq!(entries[1].year, Some(2025));
        assert_eq!(entries[1].month.as_deref(), Some("6"));
        assert_eq!(entries[1].billing_category, DEFAULT_BILLING_CATEGORY);
        assert!(entries[1]
            .effective_date(chrono_tz::America::New_York)
            .is_some());

        assert_eq!(entries[2].billable_hours, dec!(1));
        assert_eq!(entries[2].earnings, dec!(0));
        assert_eq!(entries[2].date, None);

        assert_eq!(entries[3].person_id, "u4");
        assert!(matches!(
            entries[3].date,
            Some(DateLike::Timestamp { seconds: 1_741_356_000, nanoseconds: 0 })
        ));
    }

    #[test]
    fn json_file_that_is_not_an_array_is_an_error() {
        assert!(matches!(
            read_entries_json(r#"{"personId": "u1"}"#.as_bytes()),
            Err(ReportError::Json(_))
        ));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        assert!(matches!(
            load_entries(Path::new("entries.xlsx")),
            Err(ReportError::UnsupportedInput(_))
        ));
    }
}
