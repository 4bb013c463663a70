//! Header normalization and the static alias-to-canonical column map.
//!
//! Source files spell the same logical column several ways ("Attributed
//! Revenue", "attributed_revenue", "impression"). The map is consulted once
//! per file when the header row is read; row parsing only ever sees
//! canonical names.

use std::collections::HashMap;

use csv::StringRecord;

/// Alias spellings (post-normalization) mapped to canonical column names.
const ALIASES: &[(&str, &str)] = &[
    ("impression", "impressions"),
    ("attributed_revenue", "attributed_revenue"),
    ("#_of_orders", "orders"),
    ("#_of_new_orders", "new_orders"),
    ("number_of_orders", "orders"),
    ("number_of_new_orders", "new_orders"),
    ("cost_of_goods_sold", "cogs"),
];

/// Required columns for a channel marketing file.
pub const MARKETING_COLUMNS: &[&str] = &[
    "date",
    "tactic",
    "state",
    "campaign",
    "impressions",
    "clicks",
    "spend",
    "attributed_revenue",
];

/// Required columns for the business-outcomes file. `gross_profit` is
/// optional (derivable from total_revenue - cogs) and so not listed.
pub const BUSINESS_COLUMNS: &[&str] = &[
    "date",
    "orders",
    "new_orders",
    "new_customers",
    "total_revenue",
    "cogs",
];

/// Lowercase, trim, strip a UTF-8 BOM, and collapse inner whitespace to
/// underscores, then resolve through the alias map.
pub fn canonical(raw: &str) -> String {
    let normalized: String = raw
        .trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    for (alias, canon) in ALIASES {
        if normalized == *alias {
            return (*canon).to_string();
        }
    }
    normalized
}

/// Map canonical column names to their positions in the header row.
/// The first occurrence wins when a file repeats a column.
pub fn header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        map.entry(canonical(name)).or_insert(idx);
    }
    map
}
