//! Serializable tabular exports for the download surface: the currently
//! filtered marketing table and the campaign-level aggregation, as
//! standard delimited text.

use anyhow::anyhow;

use pulse_core::{PulseError, PulseResult, Snapshot};

use crate::breakdown::campaign_breakdown;
use crate::filter::FilterSpec;

fn finish_writer(writer: csv::Writer<Vec<u8>>) -> PulseResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| PulseError::Internal(anyhow!("flush CSV writer: {e}")))?;
    String::from_utf8(bytes).map_err(|e| PulseError::Internal(anyhow!("CSV not UTF-8: {e}")))
}

/// The filtered marketing rows as CSV, one line per record.
pub fn filtered_marketing_csv(snapshot: &Snapshot, filter: &FilterSpec) -> PulseResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in filter.marketing_rows(snapshot) {
        writer.serialize(row)?;
    }
    writer.flush()?;
    finish_writer(writer)
}

/// The campaign-level aggregation as CSV, sorted by spend descending.
pub fn campaign_breakdown_csv(snapshot: &Snapshot, filter: &FilterSpec) -> PulseResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in campaign_breakdown(snapshot, filter) {
        writer.serialize(row)?;
    }
    writer.flush()?;
    finish_writer(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{
        BusinessTable, Channel, LoadWarnings, MarketingRecord, MarketingTable,
    };

    fn snapshot() -> Snapshot {
        let mk = |campaign: &str| MarketingRecord {
            date: "2024-03-15".parse().unwrap(),
            channel: Channel::Tiktok,
            tactic: "prospecting".into(),
            state: "TX".into(),
            campaign: campaign.into(),
            impressions: 500,
            clicks: 25,
            spend: 75.0,
            attributed_revenue: 150.0,
        };
        Snapshot::new(
            MarketingTable::from_rows(vec![mk("a"), mk("b")]),
            BusinessTable::from_rows(vec![]),
            LoadWarnings::default(),
        )
    }

    #[test]
    fn test_filtered_export_has_header_and_rows() {
        let csv = filtered_marketing_csv(&snapshot(), &FilterSpec::new()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("attributed_revenue"));
        assert!(lines[1].contains("tiktok"));
        assert!(lines[1].contains("2024-03-15"));
    }

    #[test]
    fn test_campaign_export_aggregates() {
        let csv = campaign_breakdown_csv(&snapshot(), &FilterSpec::new()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3); // header + campaigns a and b
        assert!(lines[0].contains("roas"));
    }

    #[test]
    fn test_export_respects_filter() {
        let filter = FilterSpec::new().with_channel(Channel::Facebook);
        let csv = filtered_marketing_csv(&snapshot(), &filter).unwrap();
        // Nothing matches, so only the implicit empty output remains.
        assert!(csv.lines().count() <= 1);
    }
}
