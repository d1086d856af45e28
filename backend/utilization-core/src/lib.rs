// src/lib.rs
//! Utilization analytics for time-tracking data: pro-rated monthly targets,
//! per-person/client/category rollups and utilization percentages.

pub mod aggregate;
pub mod business_days;
pub mod config;
pub mod date_range;
pub mod engine;
pub mod entry;
pub mod error;
pub mod input;
pub mod targets;
pub mod utilization;
pub mod visibility;


pub use aggregate::{
    aggregate, aggregate_partitioned, AggregateContext, Aggregation, AttorneyRollup,
    CategoryRollup, ClientRollup, DimensionRollup, EntrySample, OpsCategoryRollup,
    PersonDirectory,
};
pub use business_days::{count_business_days, month_business_day_total};
pub use config::{AppConfig, EngineConfig};
pub use date_range::{resolve_range, DateRangeSpec, MonthKey, ResolvedRange};
pub use engine::{generate_report, person_detail, FirmTotals, PersonDetail, ReportInputs, UtilizationReport};
pub use entry::{normalize_date, DateLike, TimeEntry};
pub use error::ReportError;
pub use targets::{prorated_target, MonthlyTarget, TargetTable};
pub use utilization::{utilization_for, UtilizationBand, UtilizationResult};
pub use visibility::{visible_people, VisibilityRule, VisibilityRules};
