//! Metrics engine — filtered aggregation, derived marketing/financial
//! ratios, performance grading, strategic recommendations, breakdown
//! tables, and tabular export.
//!
//! All computation is pure and synchronous over an immutable
//! [`Snapshot`](pulse_core::Snapshot); every derived ratio is a ratio of
//! sums over the filtered set, never an average of per-row ratios.

pub mod breakdown;
pub mod engine;
pub mod export;
pub mod filter;
pub mod grading;
pub mod recommend;

pub use breakdown::{
    campaign_breakdown, channel_breakdown, daily_series, funnel, state_breakdown,
    tactic_breakdown, weekly_series,
};
pub use engine::{compute_metrics, trend_direction, MetricSet, Trend};
pub use export::{campaign_breakdown_csv, filtered_marketing_csv};
pub use filter::FilterSpec;
pub use grading::{channel_grades, performance_grade, ChannelGrade, Grade};
pub use recommend::{recommendations, Recommendation, Severity};
