use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An ad channel with its own spend/performance feed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Facebook,
    Google,
    Tiktok,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Facebook, Channel::Google, Channel::Tiktok];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Facebook => "facebook",
            Channel::Google => "google",
            Channel::Tiktok => "tiktok",
        }
    }

    /// Parse a channel name, case-insensitive.
    pub fn parse(s: &str) -> Option<Channel> {
        match s.trim().to_ascii_lowercase().as_str() {
            "facebook" => Some(Channel::Facebook),
            "google" => Some(Channel::Google),
            "tiktok" => Some(Channel::Tiktok),
            _ => None,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of channel spend/performance data for a
/// (date, channel, tactic, state, campaign) combination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketingRecord {
    pub date: NaiveDate,
    pub channel: Channel,
    pub tactic: String,
    pub state: String,
    pub campaign: String,
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
    pub attributed_revenue: f64,
}

/// One row of business outcomes for a calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusinessRecord {
    pub date: NaiveDate,
    pub orders: u64,
    pub new_orders: u64,
    pub new_customers: u64,
    pub total_revenue: f64,
    pub gross_profit: f64,
    pub cogs: f64,
}

/// The unioned marketing table across all channels, sorted by date.
/// Immutable after load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketingTable {
    rows: Vec<MarketingRecord>,
}

impl MarketingTable {
    pub fn from_rows(mut rows: Vec<MarketingRecord>) -> Self {
        rows.sort_by(|a, b| (a.date, a.channel).cmp(&(b.date, b.channel)));
        Self { rows }
    }

    pub fn rows(&self) -> &[MarketingRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.rows.first(), self.rows.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }
}

/// The business-outcomes table, one row per date, sorted by date.
/// Immutable after load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessTable {
    rows: Vec<BusinessRecord>,
}

impl BusinessTable {
    /// Build from parsed rows. Rows sharing a calendar date are summed
    /// into a single record so the one-row-per-date invariant holds.
    pub fn from_rows(rows: Vec<BusinessRecord>) -> Self {
        let mut by_date: std::collections::BTreeMap<NaiveDate, BusinessRecord> =
            std::collections::BTreeMap::new();
        for row in rows {
            by_date
                .entry(row.date)
                .and_modify(|acc| {
                    acc.orders += row.orders;
                    acc.new_orders += row.new_orders;
                    acc.new_customers += row.new_customers;
                    acc.total_revenue += row.total_revenue;
                    acc.gross_profit += row.gross_profit;
                    acc.cogs += row.cogs;
                })
                .or_insert(row);
        }
        Self {
            rows: by_date.into_values().collect(),
        }
    }

    pub fn rows(&self) -> &[BusinessRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn biz(date: &str, orders: u64, revenue: f64) -> BusinessRecord {
        BusinessRecord {
            date: date.parse().unwrap(),
            orders,
            new_orders: orders,
            new_customers: orders / 2,
            total_revenue: revenue,
            gross_profit: revenue * 0.4,
            cogs: revenue * 0.6,
        }
    }

    #[test]
    fn test_channel_parse_roundtrip() {
        for channel in Channel::ALL {
            assert_eq!(Channel::parse(channel.as_str()), Some(channel));
        }
        assert_eq!(Channel::parse("  FaceBook "), Some(Channel::Facebook));
        assert_eq!(Channel::parse("linkedin"), None);
    }

    #[test]
    fn test_duplicate_business_dates_are_summed() {
        let table = BusinessTable::from_rows(vec![
            biz("2024-03-15", 10, 1000.0),
            biz("2024-03-15", 5, 500.0),
            biz("2024-03-16", 2, 200.0),
        ]);
        assert_eq!(table.len(), 2);
        let day = &table.rows()[0];
        assert_eq!(day.orders, 15);
        assert!((day.total_revenue - 1500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_marketing_table_sorted_by_date() {
        let mk = |date: &str| MarketingRecord {
            date: date.parse().unwrap(),
            channel: Channel::Google,
            tactic: "retargeting".into(),
            state: "CA".into(),
            campaign: "spring".into(),
            impressions: 1,
            clicks: 1,
            spend: 1.0,
            attributed_revenue: 1.0,
        };
        let table = MarketingTable::from_rows(vec![mk("2024-03-20"), mk("2024-03-01")]);
        assert_eq!(
            table.date_span(),
            Some(("2024-03-01".parse().unwrap(), "2024-03-20".parse().unwrap()))
        );
    }
}
