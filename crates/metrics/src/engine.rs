//! Aggregate sums and derived ratios over a filtered snapshot.

use serde::{Deserialize, Serialize};
use tracing::debug;

use pulse_core::Snapshot;

use crate::filter::FilterSpec;

/// All derived quantities for one filtered view. Rates suffixed with
/// "rate"/"margin" and CTR are percentages; ROAS and LTV:CAC are plain
/// ratios. A denominator of zero yields the 0.0 sentinel, never a panic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    // Sums over the filtered marketing rows
    pub total_spend: f64,
    pub total_impressions: u64,
    pub total_clicks: u64,
    pub attributed_revenue: f64,

    // Sums over the date-filtered business rows
    pub total_revenue: f64,
    pub total_orders: u64,
    pub new_orders: u64,
    pub new_customers: u64,
    pub gross_profit: f64,

    // Ratios of sums
    pub roas: f64,
    pub ctr: f64,
    pub cpc: f64,
    pub cpm: f64,
    pub cac: f64,
    pub ltv: f64,
    pub ltv_cac_ratio: f64,
    pub conversion_rate: f64,
    pub revenue_per_order: f64,
    pub attribution_rate: f64,
    pub profit_margin: f64,

    /// Composite 0-100 score weighting ROAS (40), CTR (30), and
    /// conversion rate (30) against nominal targets.
    pub efficiency_score: f64,
}

/// Divide, mapping a zero or non-finite denominator to the 0.0 sentinel.
pub fn safe_divide(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        0.0
    } else {
        numerator / denominator
    }
}

/// Compute the full metric set for one filtered view. An empty filtered
/// set produces the zeroed default rather than an error.
pub fn compute_metrics(snapshot: &Snapshot, filter: &FilterSpec) -> MetricSet {
    let marketing = filter.marketing_rows(snapshot);
    let business = filter.business_rows(snapshot);
    debug!(
        marketing_rows = marketing.len(),
        business_days = business.len(),
        "computing metric set"
    );

    let mut m = MetricSet::default();

    for row in &marketing {
        m.total_spend += row.spend;
        m.total_impressions += row.impressions;
        m.total_clicks += row.clicks;
        m.attributed_revenue += row.attributed_revenue;
    }
    for row in &business {
        m.total_revenue += row.total_revenue;
        m.total_orders += row.orders;
        m.new_orders += row.new_orders;
        m.new_customers += row.new_customers;
        m.gross_profit += row.gross_profit;
    }

    let impressions = m.total_impressions as f64;
    let clicks = m.total_clicks as f64;
    let orders = m.total_orders as f64;
    let customers = m.new_customers as f64;

    m.roas = safe_divide(m.attributed_revenue, m.total_spend);
    m.ctr = safe_divide(clicks, impressions) * 100.0;
    m.cpc = safe_divide(m.total_spend, clicks);
    m.cpm = safe_divide(m.total_spend, impressions / 1000.0);
    m.cac = safe_divide(m.total_spend, customers);
    m.ltv = safe_divide(m.total_revenue, customers);
    m.ltv_cac_ratio = safe_divide(m.ltv, m.cac);
    m.conversion_rate = safe_divide(orders, clicks) * 100.0;
    m.revenue_per_order = safe_divide(m.total_revenue, orders);
    m.attribution_rate = safe_divide(m.attributed_revenue, m.total_revenue) * 100.0;
    m.profit_margin = safe_divide(m.gross_profit, m.total_revenue) * 100.0;
    m.efficiency_score = efficiency_score(m.roas, m.ctr, m.conversion_rate);

    m
}

/// Weighted composite of ROAS, CTR, and conversion rate, each capped at
/// its nominal target (ROAS 3.0, CTR 5%, conversion 10%).
pub fn efficiency_score(roas: f64, ctr_pct: f64, conversion_pct: f64) -> f64 {
    let roas_score = (roas / 3.0).clamp(0.0, 1.0) * 40.0;
    let ctr_score = (ctr_pct / 5.0).clamp(0.0, 1.0) * 30.0;
    let conv_score = (conversion_pct / 10.0).clamp(0.0, 1.0) * 30.0;
    roas_score + ctr_score + conv_score
}

/// Direction of a metric series over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// Compare the recent window (last 7 points, or half the series when
/// shorter) against the rest, with a 5% dead band either way.
pub fn trend_direction(values: &[f64]) -> Trend {
    if values.len() < 2 {
        return Trend::Stable;
    }
    let recent_n = if values.len() >= 7 {
        7
    } else {
        (values.len() / 2).max(1)
    };
    let split = values.len() - recent_n;
    let earlier = &values[..split];
    let recent = &values[split..];
    if earlier.is_empty() {
        return Trend::Stable;
    }
    let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
    let recent_avg = mean(recent);
    let earlier_avg = mean(earlier);
    if recent_avg > earlier_avg * 1.05 {
        Trend::Up
    } else if recent_avg < earlier_avg * 0.95 {
        Trend::Down
    } else {
        Trend::Stable
    }
}
