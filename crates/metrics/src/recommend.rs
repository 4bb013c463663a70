//! Strategic recommendations — a declarative ordered rule list over the
//! computed metric set. Rules fire independently; when none fires the
//! neutral fallback advisory is returned. Fully deterministic.

use serde::{Deserialize, Serialize};

use pulse_core::config::RecommendConfig;

use crate::engine::MetricSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Praise,
    Info,
    Warning,
}

/// One textual advisory tied to the metric that triggered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub metric: String,
    pub severity: Severity,
    pub message: String,
}

struct Rule {
    metric: &'static str,
    severity: Severity,
    applies: fn(&MetricSet, &RecommendConfig) -> bool,
    message: fn(&MetricSet, &RecommendConfig) -> String,
}

/// Ordered rule table, evaluated top-to-bottom. Cost rules only apply
/// when the window actually acquired customers; otherwise CAC/LTV carry
/// the zero sentinel and say nothing about performance.
const RULES: &[Rule] = &[
    Rule {
        metric: "roas",
        severity: Severity::Warning,
        applies: |m, cfg| m.total_spend > 0.0 && m.roas < cfg.roas_warn,
        message: |m, cfg| {
            format!(
                "ROAS of {:.2} is below the {:.1} floor; shift budget toward better-converting campaigns or tighten targeting",
                m.roas, cfg.roas_warn
            )
        },
    },
    Rule {
        metric: "roas",
        severity: Severity::Praise,
        applies: |m, cfg| m.total_spend > 0.0 && m.roas > cfg.roas_praise,
        message: |m, cfg| {
            format!(
                "ROAS of {:.2} clears the {:.1} target; current spend mix is working and can absorb more budget",
                m.roas, cfg.roas_praise
            )
        },
    },
    Rule {
        metric: "cac",
        severity: Severity::Warning,
        applies: |m, cfg| m.new_customers > 0 && m.cac > cfg.cac_warn,
        message: |m, cfg| {
            format!(
                "CAC of ${:.2} exceeds ${:.0}; review acquisition channels and creative before scaling",
                m.cac, cfg.cac_warn
            )
        },
    },
    Rule {
        metric: "cac",
        severity: Severity::Praise,
        applies: |m, cfg| m.new_customers > 0 && m.cac > 0.0 && m.cac < cfg.cac_praise,
        message: |m, cfg| {
            format!(
                "CAC of ${:.2} is under ${:.0}; acquisition is efficient at current volume",
                m.cac, cfg.cac_praise
            )
        },
    },
    Rule {
        metric: "ltv_cac_ratio",
        severity: Severity::Warning,
        applies: |m, cfg| {
            m.new_customers > 0 && m.total_spend > 0.0 && m.ltv_cac_ratio < cfg.ltv_cac_warn
        },
        message: |m, cfg| {
            format!(
                "LTV:CAC of {:.1} is below the sustainable {:.0}:1 threshold; unit economics need attention",
                m.ltv_cac_ratio, cfg.ltv_cac_warn
            )
        },
    },
    Rule {
        metric: "ltv_cac_ratio",
        severity: Severity::Praise,
        applies: |m, cfg| {
            m.new_customers > 0 && m.total_spend > 0.0 && m.ltv_cac_ratio > cfg.ltv_cac_praise
        },
        message: |m, cfg| {
            format!(
                "LTV:CAC of {:.1} is above {:.0}:1; there is headroom to invest more aggressively in acquisition",
                m.ltv_cac_ratio, cfg.ltv_cac_praise
            )
        },
    },
];

/// Evaluate the rule table against a metric set.
pub fn recommendations(metrics: &MetricSet, cfg: &RecommendConfig) -> Vec<Recommendation> {
    let mut out: Vec<Recommendation> = RULES
        .iter()
        .filter(|rule| (rule.applies)(metrics, cfg))
        .map(|rule| Recommendation {
            metric: rule.metric.to_string(),
            severity: rule.severity,
            message: (rule.message)(metrics, cfg),
        })
        .collect();

    if out.is_empty() {
        out.push(Recommendation {
            metric: "overall".to_string(),
            severity: Severity::Info,
            message: "Key metrics are within their target bands; maintain the current mix"
                .to_string(),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(roas: f64, cac: f64, ltv_cac: f64, customers: u64) -> MetricSet {
        MetricSet {
            total_spend: 1000.0,
            roas,
            cac,
            ltv_cac_ratio: ltv_cac,
            new_customers: customers,
            ..MetricSet::default()
        }
    }

    #[test]
    fn test_low_roas_warns_high_roas_praises() {
        let cfg = RecommendConfig::default();
        let warns = recommendations(&metrics(1.5, 60.0, 4.0, 10), &cfg);
        assert!(warns
            .iter()
            .any(|r| r.metric == "roas" && r.severity == Severity::Warning));

        let praise = recommendations(&metrics(4.5, 60.0, 4.0, 10), &cfg);
        assert!(praise
            .iter()
            .any(|r| r.metric == "roas" && r.severity == Severity::Praise));
    }

    #[test]
    fn test_cac_rules_require_customers() {
        let cfg = RecommendConfig::default();
        let out = recommendations(&metrics(3.0, 0.0, 0.0, 0), &cfg);
        assert!(out.iter().all(|r| r.metric != "cac"));
        assert!(out.iter().all(|r| r.metric != "ltv_cac_ratio"));

        let out = recommendations(&metrics(3.0, 150.0, 2.0, 10), &cfg);
        assert!(out
            .iter()
            .any(|r| r.metric == "cac" && r.severity == Severity::Warning));
        assert!(out
            .iter()
            .any(|r| r.metric == "ltv_cac_ratio" && r.severity == Severity::Warning));
    }

    #[test]
    fn test_fallback_when_everything_in_band() {
        let cfg = RecommendConfig::default();
        // ROAS 3.0, CAC $60, LTV:CAC 4.0 sit between all thresholds.
        let out = recommendations(&metrics(3.0, 60.0, 4.0, 10), &cfg);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].severity, Severity::Info);
    }

    #[test]
    fn test_deterministic_given_identical_input() {
        let cfg = RecommendConfig::default();
        let m = metrics(1.2, 140.0, 1.5, 8);
        let a = recommendations(&m, &cfg);
        let b = recommendations(&m, &cfg);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.message, y.message);
        }
    }
}
