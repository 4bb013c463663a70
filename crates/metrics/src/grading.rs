//! Letter grading of performance against fixed threshold bands.
//!
//! Thresholds live in [`GradingConfig`](pulse_core::config::GradingConfig)
//! as declarative band tables evaluated top-to-bottom; nothing here is
//! computed from the data itself, so identical inputs always grade the
//! same.

use serde::{Deserialize, Serialize};

use pulse_core::config::{GradeBands, GradingConfig, ScoreBand};
use pulse_core::{Channel, Snapshot};

use crate::engine::safe_divide;
use crate::filter::FilterSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(s)
    }
}

/// First band the value clears wins; no band means zero points.
fn band_points(value: f64, bands: &[ScoreBand]) -> u32 {
    bands
        .iter()
        .find(|band| value >= band.min)
        .map(|band| band.points)
        .unwrap_or(0)
}

/// Map a single metric through its letter bands.
pub fn band_grade(value: f64, bands: &GradeBands) -> Grade {
    if bands.lower_is_better {
        if value <= bands.a {
            Grade::A
        } else if value <= bands.b {
            Grade::B
        } else if value <= bands.c {
            Grade::C
        } else if value <= bands.d {
            Grade::D
        } else {
            Grade::F
        }
    } else if value >= bands.a {
        Grade::A
    } else if value >= bands.b {
        Grade::B
    } else if value >= bands.c {
        Grade::C
    } else if value >= bands.d {
        Grade::D
    } else {
        Grade::F
    }
}

/// Composite grade from ROAS, CTR (%), and conversion rate (%): each
/// metric contributes points from its score-band table and the summed
/// score maps through the A/B/C/D cut-offs.
pub fn performance_grade(
    roas: f64,
    ctr_pct: f64,
    conversion_pct: f64,
    cfg: &GradingConfig,
) -> Grade {
    let score = band_points(roas, &cfg.roas_score_bands)
        + band_points(ctr_pct, &cfg.ctr_score_bands)
        + band_points(conversion_pct, &cfg.conversion_score_bands);
    if score >= cfg.a_min {
        Grade::A
    } else if score >= cfg.b_min {
        Grade::B
    } else if score >= cfg.c_min {
        Grade::C
    } else if score >= cfg.d_min {
        Grade::D
    } else {
        Grade::F
    }
}

/// Per-channel metrics with their letter grades. CAC and LTV use the
/// window's new-customer and revenue totals, which have no channel
/// dimension; the channel contributes its own spend. When the window has
/// no new customers those grades are undefined and omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelGrade {
    pub channel: Channel,
    pub spend: f64,
    pub attributed_revenue: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub roas: f64,
    pub ctr: f64,
    pub cac: f64,
    pub ltv_cac_ratio: f64,
    pub roas_grade: Grade,
    pub cac_grade: Option<Grade>,
    pub ltv_cac_grade: Option<Grade>,
}

/// Grade every channel present in the filtered view against the
/// configured bands. Channels the filter excludes are not graded.
pub fn channel_grades(
    snapshot: &Snapshot,
    filter: &FilterSpec,
    cfg: &GradingConfig,
) -> Vec<ChannelGrade> {
    let business = filter.business_rows(snapshot);
    let new_customers: u64 = business.iter().map(|r| r.new_customers).sum();
    let total_revenue: f64 = business.iter().map(|r| r.total_revenue).sum();
    let ltv = safe_divide(total_revenue, new_customers as f64);

    let mut grades = Vec::new();
    for channel in Channel::ALL {
        if !filter.channels.is_empty() && !filter.channels.contains(&channel) {
            continue;
        }
        let mut spend = 0.0;
        let mut attributed_revenue = 0.0;
        let mut impressions = 0u64;
        let mut clicks = 0u64;
        let mut seen = false;
        for row in snapshot.marketing.rows() {
            if row.channel == channel && filter.matches_marketing(row) {
                spend += row.spend;
                attributed_revenue += row.attributed_revenue;
                impressions += row.impressions;
                clicks += row.clicks;
                seen = true;
            }
        }
        if !seen {
            continue;
        }

        let roas = safe_divide(attributed_revenue, spend);
        let ctr = safe_divide(clicks as f64, impressions as f64) * 100.0;
        let cac = safe_divide(spend, new_customers as f64);
        let ltv_cac_ratio = safe_divide(ltv, cac);
        let graded_costs = new_customers > 0 && spend > 0.0;

        grades.push(ChannelGrade {
            channel,
            spend,
            attributed_revenue,
            impressions,
            clicks,
            roas,
            ctr,
            cac,
            ltv_cac_ratio,
            roas_grade: band_grade(roas, &cfg.roas_bands),
            cac_grade: graded_costs.then(|| band_grade(cac, &cfg.cac_bands)),
            ltv_cac_grade: graded_costs.then(|| band_grade(ltv_cac_ratio, &cfg.ltv_cac_bands)),
        });
    }
    grades.sort_by(|a, b| b.spend.total_cmp(&a.spend));
    grades
}
