//! File readers: one channel CSV or the business CSV in, typed records out.
//!
//! Structural problems (missing required columns) abort the whole file.
//! Row-level problems (unparseable date, bad revenue figure) drop the row
//! and are counted; the load only fails when the drop rate for a file
//! exceeds the configured ceiling.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::warn;

use pulse_core::config::LoaderConfig;
use pulse_core::snapshot::{FileWarnings, RowIssue};
use pulse_core::{BusinessRecord, Channel, MarketingRecord, PulseError, PulseResult};

use crate::alias::{self, BUSINESS_COLUMNS, MARKETING_COLUMNS};

/// Parse a date in either `YYYY-MM-DD` or `DD-MM-YYYY` form. The two
/// patterns are positionally distinct, so no input matches both.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d-%m-%Y"))
        .ok()
}

/// Parse a monetary value, tolerating currency symbols, thousands
/// separators, and padding. Returns `None` when nothing numeric remains.
fn parse_money(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a counter column. Missing or non-numeric cells coerce to zero;
/// counters are non-negative by definition.
fn parse_counter(raw: &str) -> u64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | ' '))
        .collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v.round() as u64,
        _ => 0,
    }
}

fn open_reader(path: &Path) -> PulseResult<csv::Reader<File>> {
    let file = File::open(path)?;
    Ok(csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

fn require_columns(
    file: &str,
    map: &std::collections::HashMap<String, usize>,
    required: &[&str],
) -> PulseResult<()> {
    for column in required {
        if !map.contains_key(*column) {
            return Err(PulseError::MissingColumn {
                file: file.to_string(),
                column: (*column).to_string(),
            });
        }
    }
    Ok(())
}

fn field<'r>(record: &'r StringRecord, idx: usize) -> &'r str {
    record.get(idx).unwrap_or("")
}

/// Apply the drop-rate ceiling and emit the aggregate warning.
fn finish_file(
    file: &str,
    rows_read: usize,
    issues: Vec<RowIssue>,
    max_row_drop_rate: f64,
) -> PulseResult<FileWarnings> {
    if rows_read == 0 {
        return Err(PulseError::EmptyInput {
            file: file.to_string(),
        });
    }
    let warnings = FileWarnings {
        file: file.to_string(),
        rows_read,
        rows_dropped: issues.len(),
        issues,
    };
    if warnings.drop_rate() > max_row_drop_rate {
        return Err(PulseError::DataFormat {
            file: file.to_string(),
            message: format!(
                "{} of {} rows unparseable, above the {:.0}% ceiling",
                warnings.rows_dropped,
                warnings.rows_read,
                max_row_drop_rate * 100.0
            ),
        });
    }
    if warnings.rows_dropped > 0 {
        warn!(
            file = %warnings.file,
            dropped = warnings.rows_dropped,
            read = warnings.rows_read,
            "dropped unparseable rows"
        );
    }
    Ok(warnings)
}

/// Read one channel file and tag every row with `channel`.
pub fn read_marketing_csv(
    path: &Path,
    channel: Channel,
    cfg: &LoaderConfig,
) -> PulseResult<(Vec<MarketingRecord>, FileWarnings)> {
    let file = path.display().to_string();
    let mut reader = open_reader(path)?;
    let map = alias::header_map(reader.headers()?);
    require_columns(&file, &map, MARKETING_COLUMNS)?;

    let date_idx = map["date"];
    let tactic_idx = map["tactic"];
    let state_idx = map["state"];
    let campaign_idx = map["campaign"];
    let impressions_idx = map["impressions"];
    let clicks_idx = map["clicks"];
    let spend_idx = map["spend"];
    let revenue_idx = map["attributed_revenue"];

    let mut rows = Vec::new();
    let mut issues = Vec::new();
    let mut rows_read = 0usize;

    for (i, record) in reader.records().enumerate() {
        let line = i + 1;
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows_read += 1;

        let Some(date) = parse_date(field(&record, date_idx)) else {
            issues.push(RowIssue {
                line,
                message: format!("unparseable date '{}'", field(&record, date_idx)),
            });
            continue;
        };
        let Some(spend) = parse_money(field(&record, spend_idx)) else {
            issues.push(RowIssue {
                line,
                message: format!("unparseable spend '{}'", field(&record, spend_idx)),
            });
            continue;
        };
        let Some(attributed_revenue) = parse_money(field(&record, revenue_idx)) else {
            issues.push(RowIssue {
                line,
                message: format!(
                    "unparseable attributed_revenue '{}'",
                    field(&record, revenue_idx)
                ),
            });
            continue;
        };

        rows.push(MarketingRecord {
            date,
            channel,
            tactic: field(&record, tactic_idx).to_string(),
            state: field(&record, state_idx).to_string(),
            campaign: field(&record, campaign_idx).to_string(),
            impressions: parse_counter(field(&record, impressions_idx)),
            clicks: parse_counter(field(&record, clicks_idx)),
            spend: spend.max(0.0),
            attributed_revenue: attributed_revenue.max(0.0),
        });
    }

    let warnings = finish_file(&file, rows_read, issues, cfg.max_row_drop_rate)?;
    Ok((rows, warnings))
}

/// Read the business-outcomes file. `gross_profit` is derived as
/// `total_revenue - cogs` when the column is absent or a cell is blank,
/// unless derivation is disabled in the loader config.
pub fn read_business_csv(
    path: &Path,
    cfg: &LoaderConfig,
) -> PulseResult<(Vec<BusinessRecord>, FileWarnings)> {
    let file = path.display().to_string();
    let mut reader = open_reader(path)?;
    let map = alias::header_map(reader.headers()?);
    require_columns(&file, &map, BUSINESS_COLUMNS)?;

    let gross_profit_idx = map.get("gross_profit").copied();
    if gross_profit_idx.is_none() && !cfg.derive_gross_profit {
        return Err(PulseError::MissingColumn {
            file,
            column: "gross_profit".to_string(),
        });
    }

    let date_idx = map["date"];
    let orders_idx = map["orders"];
    let new_orders_idx = map["new_orders"];
    let new_customers_idx = map["new_customers"];
    let revenue_idx = map["total_revenue"];
    let cogs_idx = map["cogs"];

    let mut rows = Vec::new();
    let mut issues = Vec::new();
    let mut rows_read = 0usize;

    for (i, record) in reader.records().enumerate() {
        let line = i + 1;
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows_read += 1;

        let Some(date) = parse_date(field(&record, date_idx)) else {
            issues.push(RowIssue {
                line,
                message: format!("unparseable date '{}'", field(&record, date_idx)),
            });
            continue;
        };
        let Some(total_revenue) = parse_money(field(&record, revenue_idx)) else {
            issues.push(RowIssue {
                line,
                message: format!("unparseable total_revenue '{}'", field(&record, revenue_idx)),
            });
            continue;
        };
        let Some(cogs) = parse_money(field(&record, cogs_idx)) else {
            issues.push(RowIssue {
                line,
                message: format!("unparseable cogs '{}'", field(&record, cogs_idx)),
            });
            continue;
        };

        let gross_profit = match gross_profit_idx.and_then(|idx| parse_money(field(&record, idx)))
        {
            Some(v) => v,
            None => total_revenue - cogs,
        };

        rows.push(BusinessRecord {
            date,
            orders: parse_counter(field(&record, orders_idx)),
            new_orders: parse_counter(field(&record, new_orders_idx)),
            new_customers: parse_counter(field(&record, new_customers_idx)),
            total_revenue: total_revenue.max(0.0),
            gross_profit,
            cogs: cogs.max(0.0),
        });
    }

    let warnings = finish_file(&file, rows_read, issues, cfg.max_row_drop_rate)?;
    Ok((rows, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(content.as_bytes()).unwrap();
        tmp.flush().unwrap();
        tmp
    }

    #[test]
    fn test_parse_date_both_formats() {
        let iso = parse_date("2024-03-15").unwrap();
        let euro = parse_date("15-03-2024").unwrap();
        assert_eq!(iso, euro);
        assert!(parse_date("2024-15-03").is_none());
        assert!(parse_date("not a date").is_none());
    }

    #[test]
    fn test_parse_money_variants() {
        assert_eq!(parse_money("$1,234.50"), Some(1234.5));
        assert_eq!(parse_money(" 42 "), Some(42.0));
        assert_eq!(parse_money("-12.5"), Some(-12.5));
        assert_eq!(parse_money(""), None);
        assert_eq!(parse_money("n/a"), None);
    }

    #[test]
    fn test_parse_counter_coerces_to_zero() {
        assert_eq!(parse_counter("1,200"), 1200);
        assert_eq!(parse_counter(""), 0);
        assert_eq!(parse_counter("oops"), 0);
        assert_eq!(parse_counter("-5"), 0);
    }

    #[test]
    fn test_marketing_read_with_aliases_and_bom() {
        let tmp = write_csv(
            "\u{feff}Date,Tactic,State,Campaign,Impression,Clicks,Spend,Attributed Revenue\n\
             2024-03-15,retargeting,CA,spring,1000,50,100.0,300.0\n\
             16-03-2024,prospecting,NY,spring,2000,80,$200.00,\"1,000.00\"\n",
        );
        let (rows, warnings) =
            read_marketing_csv(tmp.path(), Channel::Facebook, &LoaderConfig::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(warnings.rows_dropped, 0);
        assert_eq!(rows[0].channel, Channel::Facebook);
        assert_eq!(rows[0].impressions, 1000);
        assert!((rows[1].spend - 200.0).abs() < f64::EPSILON);
        assert!((rows[1].attributed_revenue - 1000.0).abs() < f64::EPSILON);
        assert_eq!(rows[1].date, parse_date("2024-03-16").unwrap());
    }

    #[test]
    fn test_marketing_missing_column_aborts() {
        let tmp = write_csv("date,tactic,state,campaign,impressions,clicks,spend\n");
        let err = read_marketing_csv(tmp.path(), Channel::Google, &LoaderConfig::default())
            .unwrap_err();
        match err {
            PulseError::MissingColumn { column, .. } => {
                assert_eq!(column, "attributed_revenue")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_rows_dropped_below_ceiling() {
        let tmp = write_csv(
            "date,tactic,state,campaign,impressions,clicks,spend,attributed_revenue\n\
             2024-03-15,t,CA,c,100,5,10.0,30.0\n\
             2024-15-03,t,CA,c,100,5,10.0,30.0\n\
             2024-03-16,t,CA,c,100,5,10.0,30.0\n\
             2024-03-17,t,CA,c,100,5,10.0,30.0\n\
             2024-03-18,t,CA,c,100,5,10.0,30.0\n",
        );
        let (rows, warnings) =
            read_marketing_csv(tmp.path(), Channel::Tiktok, &LoaderConfig::default()).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(warnings.rows_dropped, 1);
        assert_eq!(warnings.issues[0].line, 2);
    }

    #[test]
    fn test_drop_rate_ceiling_fails_load() {
        let tmp = write_csv(
            "date,tactic,state,campaign,impressions,clicks,spend,attributed_revenue\n\
             bad,t,CA,c,100,5,10.0,30.0\n\
             worse,t,CA,c,100,5,10.0,30.0\n\
             2024-03-16,t,CA,c,100,5,10.0,30.0\n",
        );
        let err = read_marketing_csv(tmp.path(), Channel::Tiktok, &LoaderConfig::default())
            .unwrap_err();
        assert!(matches!(err, PulseError::DataFormat { .. }));
    }

    #[test]
    fn test_business_gross_profit_derived_when_absent() {
        let tmp = write_csv(
            "date,# of orders,# of new orders,new_customers,total_revenue,CoGS\n\
             2024-03-15,100,40,25,5000.0,3000.0\n",
        );
        let (rows, _) = read_business_csv(tmp.path(), &LoaderConfig::default()).unwrap();
        assert_eq!(rows[0].orders, 100);
        assert_eq!(rows[0].new_orders, 40);
        assert!((rows[0].gross_profit - 2000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_business_gross_profit_may_be_negative() {
        let tmp = write_csv(
            "date,orders,new_orders,new_customers,total_revenue,cogs,gross_profit\n\
             2024-03-15,10,4,2,500.0,700.0,-200.0\n",
        );
        let (rows, _) = read_business_csv(tmp.path(), &LoaderConfig::default()).unwrap();
        assert!((rows[0].gross_profit + 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_file_is_an_error() {
        let tmp = write_csv("date,tactic,state,campaign,impressions,clicks,spend,attributed_revenue\n");
        let err = read_marketing_csv(tmp.path(), Channel::Google, &LoaderConfig::default())
            .unwrap_err();
        assert!(matches!(err, PulseError::EmptyInput { .. }));
    }
}
