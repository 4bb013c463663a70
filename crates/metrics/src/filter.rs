//! Filter specification applied before any aggregation.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use pulse_core::{BusinessRecord, Channel, MarketingRecord, Snapshot};

/// Inclusive filters over the loaded tables. Empty sets mean "no
/// restriction". Marketing rows are filtered on all four dimensions;
/// business rows only on the date range, since channel/state/tactic do
/// not exist on business data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub channels: HashSet<Channel>,
    pub states: HashSet<String>,
    pub tactics: HashSet<String>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dates(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_range = Some((from, to));
        self
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channels.insert(channel);
        self
    }

    pub fn with_state(mut self, state: &str) -> Self {
        self.states.insert(state.trim().to_lowercase());
        self
    }

    pub fn with_tactic(mut self, tactic: &str) -> Self {
        self.tactics.insert(tactic.trim().to_lowercase());
        self
    }

    fn date_in_range(&self, date: NaiveDate) -> bool {
        match self.date_range {
            Some((from, to)) => date >= from && date <= to,
            None => true,
        }
    }

    fn set_matches(set: &HashSet<String>, value: &str) -> bool {
        set.is_empty() || set.contains(&value.trim().to_lowercase())
    }

    pub fn matches_marketing(&self, row: &MarketingRecord) -> bool {
        self.date_in_range(row.date)
            && (self.channels.is_empty() || self.channels.contains(&row.channel))
            && Self::set_matches(&self.states, &row.state)
            && Self::set_matches(&self.tactics, &row.tactic)
    }

    pub fn matches_business(&self, row: &BusinessRecord) -> bool {
        self.date_in_range(row.date)
    }

    /// Borrowed view of the marketing rows passing the filter.
    pub fn marketing_rows<'a>(&self, snapshot: &'a Snapshot) -> Vec<&'a MarketingRecord> {
        snapshot
            .marketing
            .rows()
            .iter()
            .filter(|r| self.matches_marketing(r))
            .collect()
    }

    /// Borrowed view of the business rows inside the filter's date range.
    pub fn business_rows<'a>(&self, snapshot: &'a Snapshot) -> Vec<&'a BusinessRecord> {
        snapshot
            .business
            .rows()
            .iter()
            .filter(|r| self.matches_business(r))
            .collect()
    }
}
