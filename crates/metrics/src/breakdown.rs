//! Grouped breakdown tables for the presentation layer: daily and weekly
//! series, per-dimension performance, campaign-level aggregation, and the
//! impressions-to-revenue funnel. Every derived column is a ratio of the
//! group's sums.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use pulse_core::{MarketingRecord, Snapshot};

use crate::engine::safe_divide;
use crate::filter::FilterSpec;

/// One day of the outer-joined marketing/business series. Days present on
/// only one side carry zeros for the other.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub attributed_revenue: f64,
    pub orders: u64,
    pub new_orders: u64,
    pub new_customers: u64,
    pub total_revenue: f64,
    pub gross_profit: f64,
    /// Distinct campaigns active that day.
    pub campaigns: usize,
    pub roas: f64,
    pub ctr: f64,
    pub cpc: f64,
    pub cpm: f64,
    pub conversion_rate: f64,
    pub revenue_per_order: f64,
    pub profit_margin: f64,
}

/// Sums and ratios for one value of a grouping dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownRow {
    pub key: String,
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub attributed_revenue: f64,
    pub roas: f64,
    pub ctr: f64,
    pub cpc: f64,
    pub cpm: f64,
}

/// Campaign-level aggregation keyed by the full
/// (campaign, channel, tactic, state) combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignRow {
    pub campaign: String,
    pub channel: String,
    pub tactic: String,
    pub state: String,
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub attributed_revenue: f64,
    pub roas: f64,
    pub ctr: f64,
    pub cpc: f64,
    pub cpm: f64,
}

/// One stage of the impressions → clicks → orders → revenue funnel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunnelStage {
    pub stage: String,
    pub value: f64,
    /// Stage value as a percentage of the largest stage.
    pub pct_of_max: f64,
    /// Conversion from the previous stage, in percent. 100 for the first.
    pub conversion_from_prev: f64,
}

/// ISO-week aggregation (weeks start on Monday).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklyRow {
    pub week_start: NaiveDate,
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub attributed_revenue: f64,
    pub orders: u64,
    pub total_revenue: f64,
    pub roas: f64,
    pub ctr: f64,
    pub conversion_rate: f64,
}

fn enrich_daily(row: &mut DailyRow) {
    let impressions = row.impressions as f64;
    let clicks = row.clicks as f64;
    let orders = row.orders as f64;
    row.roas = safe_divide(row.attributed_revenue, row.spend);
    row.ctr = safe_divide(clicks, impressions) * 100.0;
    row.cpc = safe_divide(row.spend, clicks);
    row.cpm = safe_divide(row.spend, impressions / 1000.0);
    row.conversion_rate = safe_divide(orders, clicks) * 100.0;
    row.revenue_per_order = safe_divide(row.total_revenue, orders);
    row.profit_margin = safe_divide(row.gross_profit, row.total_revenue) * 100.0;
}

/// Daily outer join of the filtered marketing rows with the date-filtered
/// business rows, sorted by date.
pub fn daily_series(snapshot: &Snapshot, filter: &FilterSpec) -> Vec<DailyRow> {
    let mut days: BTreeMap<NaiveDate, (DailyRow, BTreeSet<String>)> = BTreeMap::new();

    for row in filter.marketing_rows(snapshot) {
        let entry = days.entry(row.date).or_insert_with(|| {
            (
                DailyRow {
                    date: row.date,
                    ..DailyRow::default()
                },
                BTreeSet::new(),
            )
        });
        entry.0.spend += row.spend;
        entry.0.impressions += row.impressions;
        entry.0.clicks += row.clicks;
        entry.0.attributed_revenue += row.attributed_revenue;
        entry.1.insert(row.campaign.clone());
    }

    for row in filter.business_rows(snapshot) {
        let entry = days.entry(row.date).or_insert_with(|| {
            (
                DailyRow {
                    date: row.date,
                    ..DailyRow::default()
                },
                BTreeSet::new(),
            )
        });
        entry.0.orders += row.orders;
        entry.0.new_orders += row.new_orders;
        entry.0.new_customers += row.new_customers;
        entry.0.total_revenue += row.total_revenue;
        entry.0.gross_profit += row.gross_profit;
    }

    days.into_values()
        .map(|(mut row, campaigns)| {
            row.campaigns = campaigns.len();
            enrich_daily(&mut row);
            row
        })
        .collect()
}

fn grouped_breakdown<F>(snapshot: &Snapshot, filter: &FilterSpec, key_of: F) -> Vec<BreakdownRow>
where
    F: Fn(&MarketingRecord) -> String,
{
    let mut groups: BTreeMap<String, BreakdownRow> = BTreeMap::new();
    for row in filter.marketing_rows(snapshot) {
        let entry = groups
            .entry(key_of(row))
            .or_insert_with_key(|key| BreakdownRow {
                key: key.clone(),
                spend: 0.0,
                impressions: 0,
                clicks: 0,
                attributed_revenue: 0.0,
                roas: 0.0,
                ctr: 0.0,
                cpc: 0.0,
                cpm: 0.0,
            });
        entry.spend += row.spend;
        entry.impressions += row.impressions;
        entry.clicks += row.clicks;
        entry.attributed_revenue += row.attributed_revenue;
    }

    let mut rows: Vec<BreakdownRow> = groups
        .into_values()
        .map(|mut row| {
            row.roas = safe_divide(row.attributed_revenue, row.spend);
            row.ctr = safe_divide(row.clicks as f64, row.impressions as f64) * 100.0;
            row.cpc = safe_divide(row.spend, row.clicks as f64);
            row.cpm = safe_divide(row.spend, row.impressions as f64 / 1000.0);
            row
        })
        .collect();
    rows.sort_by(|a, b| b.spend.total_cmp(&a.spend));
    rows
}

pub fn channel_breakdown(snapshot: &Snapshot, filter: &FilterSpec) -> Vec<BreakdownRow> {
    grouped_breakdown(snapshot, filter, |row| row.channel.to_string())
}

pub fn state_breakdown(snapshot: &Snapshot, filter: &FilterSpec) -> Vec<BreakdownRow> {
    grouped_breakdown(snapshot, filter, |row| row.state.clone())
}

pub fn tactic_breakdown(snapshot: &Snapshot, filter: &FilterSpec) -> Vec<BreakdownRow> {
    grouped_breakdown(snapshot, filter, |row| row.tactic.clone())
}

/// Aggregate by (campaign, channel, tactic, state), sorted by spend
/// descending. This is the table the export surface serves for download.
pub fn campaign_breakdown(snapshot: &Snapshot, filter: &FilterSpec) -> Vec<CampaignRow> {
    let mut groups: BTreeMap<(String, String, String, String), CampaignRow> = BTreeMap::new();
    for row in filter.marketing_rows(snapshot) {
        let key = (
            row.campaign.clone(),
            row.channel.to_string(),
            row.tactic.clone(),
            row.state.clone(),
        );
        let entry = groups.entry(key).or_insert_with(|| CampaignRow {
            campaign: row.campaign.clone(),
            channel: row.channel.to_string(),
            tactic: row.tactic.clone(),
            state: row.state.clone(),
            spend: 0.0,
            impressions: 0,
            clicks: 0,
            attributed_revenue: 0.0,
            roas: 0.0,
            ctr: 0.0,
            cpc: 0.0,
            cpm: 0.0,
        });
        entry.spend += row.spend;
        entry.impressions += row.impressions;
        entry.clicks += row.clicks;
        entry.attributed_revenue += row.attributed_revenue;
    }

    let mut rows: Vec<CampaignRow> = groups
        .into_values()
        .map(|mut row| {
            row.roas = safe_divide(row.attributed_revenue, row.spend);
            row.ctr = safe_divide(row.clicks as f64, row.impressions as f64) * 100.0;
            row.cpc = safe_divide(row.spend, row.clicks as f64);
            row.cpm = safe_divide(row.spend, row.impressions as f64 / 1000.0);
            row
        })
        .collect();
    rows.sort_by(|a, b| b.spend.total_cmp(&a.spend));
    rows
}

/// Impressions → Clicks → Orders → Revenue funnel over the filtered view.
pub fn funnel(snapshot: &Snapshot, filter: &FilterSpec) -> Vec<FunnelStage> {
    let marketing = filter.marketing_rows(snapshot);
    let business = filter.business_rows(snapshot);

    let impressions: u64 = marketing.iter().map(|r| r.impressions).sum();
    let clicks: u64 = marketing.iter().map(|r| r.clicks).sum();
    let orders: u64 = business.iter().map(|r| r.orders).sum();
    let revenue: f64 = marketing.iter().map(|r| r.attributed_revenue).sum();

    let values = [
        ("Impressions", impressions as f64),
        ("Clicks", clicks as f64),
        ("Orders", orders as f64),
        ("Revenue", revenue),
    ];
    let max = values
        .iter()
        .map(|(_, v)| *v)
        .fold(0.0f64, f64::max);

    let mut stages = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for (stage, value) in values {
        let conversion_from_prev = match prev {
            None => 100.0,
            Some(p) => safe_divide(value, p) * 100.0,
        };
        stages.push(FunnelStage {
            stage: stage.to_string(),
            value,
            pct_of_max: safe_divide(value, max) * 100.0,
            conversion_from_prev,
        });
        prev = Some(value);
    }
    stages
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Weekly aggregation of the daily series, sorted by week start.
pub fn weekly_series(snapshot: &Snapshot, filter: &FilterSpec) -> Vec<WeeklyRow> {
    let mut weeks: BTreeMap<NaiveDate, WeeklyRow> = BTreeMap::new();

    for row in filter.marketing_rows(snapshot) {
        let entry = weeks
            .entry(week_start(row.date))
            .or_insert_with(|| WeeklyRow {
                week_start: week_start(row.date),
                ..WeeklyRow::default()
            });
        entry.spend += row.spend;
        entry.impressions += row.impressions;
        entry.clicks += row.clicks;
        entry.attributed_revenue += row.attributed_revenue;
    }
    for row in filter.business_rows(snapshot) {
        let entry = weeks
            .entry(week_start(row.date))
            .or_insert_with(|| WeeklyRow {
                week_start: week_start(row.date),
                ..WeeklyRow::default()
            });
        entry.orders += row.orders;
        entry.total_revenue += row.total_revenue;
    }

    weeks
        .into_values()
        .map(|mut row| {
            row.roas = safe_divide(row.attributed_revenue, row.spend);
            row.ctr = safe_divide(row.clicks as f64, row.impressions as f64) * 100.0;
            row.conversion_rate = safe_divide(row.orders as f64, row.clicks as f64) * 100.0;
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{
        BusinessRecord, BusinessTable, Channel, LoadWarnings, MarketingRecord, MarketingTable,
    };

    fn mk(date: &str, channel: Channel, campaign: &str, spend: f64) -> MarketingRecord {
        MarketingRecord {
            date: date.parse().unwrap(),
            channel,
            tactic: "retargeting".into(),
            state: "CA".into(),
            campaign: campaign.into(),
            impressions: 1000,
            clicks: 50,
            spend,
            attributed_revenue: spend * 3.0,
        }
    }

    fn biz(date: &str, orders: u64, revenue: f64) -> BusinessRecord {
        BusinessRecord {
            date: date.parse().unwrap(),
            orders,
            new_orders: orders / 2,
            new_customers: orders / 4,
            total_revenue: revenue,
            gross_profit: revenue * 0.4,
            cogs: revenue * 0.6,
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot::new(
            MarketingTable::from_rows(vec![
                mk("2024-03-04", Channel::Facebook, "spring", 100.0),
                mk("2024-03-04", Channel::Google, "spring", 200.0),
                mk("2024-03-05", Channel::Facebook, "summer", 50.0),
            ]),
            BusinessTable::from_rows(vec![
                biz("2024-03-04", 40, 4000.0),
                // Business-only day, no marketing activity.
                biz("2024-03-06", 10, 900.0),
            ]),
            LoadWarnings::default(),
        )
    }

    #[test]
    fn test_daily_series_outer_join() {
        let days = daily_series(&snapshot(), &FilterSpec::new());
        assert_eq!(days.len(), 3);

        let first = &days[0];
        assert!((first.spend - 300.0).abs() < f64::EPSILON);
        assert_eq!(first.campaigns, 1);
        assert_eq!(first.orders, 40);
        assert!((first.roas - 3.0).abs() < 1e-9);

        let business_only = &days[2];
        assert_eq!(business_only.date, "2024-03-06".parse().unwrap());
        assert_eq!(business_only.impressions, 0);
        assert_eq!(business_only.orders, 10);
        assert_eq!(business_only.roas, 0.0);
    }

    #[test]
    fn test_channel_breakdown_sorted_by_spend() {
        let rows = channel_breakdown(&snapshot(), &FilterSpec::new());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, "google");
        assert!((rows[1].spend - 150.0).abs() < f64::EPSILON);
        assert!((rows[0].roas - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_campaign_breakdown_keys() {
        let rows = campaign_breakdown(&snapshot(), &FilterSpec::new());
        // spring splits across two channels; summer is its own group.
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| !r.campaign.is_empty()));
        assert!((rows[0].spend - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_funnel_stage_math() {
        let stages = funnel(&snapshot(), &FilterSpec::new());
        assert_eq!(stages.len(), 4);
        assert_eq!(stages[0].stage, "Impressions");
        assert!((stages[0].value - 3000.0).abs() < f64::EPSILON);
        assert!((stages[0].pct_of_max - 100.0).abs() < 1e-9);
        // Clicks / impressions = 150 / 3000 = 5%.
        assert!((stages[1].conversion_from_prev - 5.0).abs() < 1e-9);
        assert!((stages[2].value - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_weekly_series_groups_by_monday() {
        let weeks = weekly_series(&snapshot(), &FilterSpec::new());
        // 2024-03-04 is a Monday; all three days fall in one ISO week.
        assert_eq!(weeks.len(), 1);
        assert_eq!(weeks[0].week_start, "2024-03-04".parse().unwrap());
        assert!((weeks[0].spend - 350.0).abs() < f64::EPSILON);
        assert_eq!(weeks[0].orders, 50);
    }
}
