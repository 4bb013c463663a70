use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `MARKET_PULSE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub grading: GradingConfig,
    #[serde(default)]
    pub recommend: RecommendConfig,
}

/// Loader tolerances.
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    /// Ceiling on the fraction of rows a single file may drop before the
    /// whole load is rejected instead of warned about.
    #[serde(default = "default_max_row_drop_rate")]
    pub max_row_drop_rate: f64,
    /// Derive gross_profit as total_revenue - cogs when the column is
    /// absent or a cell fails to parse.
    #[serde(default = "default_derive_gross_profit")]
    pub derive_gross_profit: bool,
}

/// One step of a score band table: `points` are awarded when the metric
/// is at least `min`. Bands are evaluated top-to-bottom, first match wins.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScoreBand {
    pub min: f64,
    pub points: u32,
}

/// Letter bands for a single metric: the grade is the first band whose
/// cut-off the value clears (or, for lower-is-better metrics, stays under).
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GradeBands {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    /// When set, a value at or below `a` earns an A (cost-style metrics).
    #[serde(default)]
    pub lower_is_better: bool,
}

/// Grading thresholds. All values are fixed configuration constants,
/// never computed from the data.
#[derive(Debug, Clone, Deserialize)]
pub struct GradingConfig {
    #[serde(default = "default_roas_score_bands")]
    pub roas_score_bands: Vec<ScoreBand>,
    #[serde(default = "default_ctr_score_bands")]
    pub ctr_score_bands: Vec<ScoreBand>,
    #[serde(default = "default_conversion_score_bands")]
    pub conversion_score_bands: Vec<ScoreBand>,
    /// Composite-score cut-offs for A/B/C/D; anything below `d_min` is F.
    #[serde(default = "default_a_min")]
    pub a_min: u32,
    #[serde(default = "default_b_min")]
    pub b_min: u32,
    #[serde(default = "default_c_min")]
    pub c_min: u32,
    #[serde(default = "default_d_min")]
    pub d_min: u32,
    #[serde(default = "default_roas_bands")]
    pub roas_bands: GradeBands,
    #[serde(default = "default_cac_bands")]
    pub cac_bands: GradeBands,
    #[serde(default = "default_ltv_cac_bands")]
    pub ltv_cac_bands: GradeBands,
}

/// Thresholds for the strategic recommendation rules.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendConfig {
    #[serde(default = "default_roas_warn")]
    pub roas_warn: f64,
    #[serde(default = "default_roas_praise")]
    pub roas_praise: f64,
    #[serde(default = "default_cac_warn")]
    pub cac_warn: f64,
    #[serde(default = "default_cac_praise")]
    pub cac_praise: f64,
    #[serde(default = "default_ltv_cac_warn")]
    pub ltv_cac_warn: f64,
    #[serde(default = "default_ltv_cac_praise")]
    pub ltv_cac_praise: f64,
}

// Default functions
fn default_max_row_drop_rate() -> f64 {
    0.25
}
fn default_derive_gross_profit() -> bool {
    true
}
fn default_roas_score_bands() -> Vec<ScoreBand> {
    vec![
        ScoreBand { min: 4.0, points: 40 },
        ScoreBand { min: 3.0, points: 30 },
        ScoreBand { min: 2.0, points: 20 },
        ScoreBand { min: 1.0, points: 10 },
    ]
}
fn default_ctr_score_bands() -> Vec<ScoreBand> {
    vec![
        ScoreBand { min: 3.0, points: 30 },
        ScoreBand { min: 2.0, points: 20 },
        ScoreBand { min: 1.0, points: 10 },
    ]
}
fn default_conversion_score_bands() -> Vec<ScoreBand> {
    vec![
        ScoreBand { min: 5.0, points: 30 },
        ScoreBand { min: 3.0, points: 20 },
        ScoreBand { min: 1.0, points: 10 },
    ]
}
fn default_a_min() -> u32 {
    90
}
fn default_b_min() -> u32 {
    80
}
fn default_c_min() -> u32 {
    70
}
fn default_d_min() -> u32 {
    60
}
fn default_roas_bands() -> GradeBands {
    GradeBands {
        a: 4.0,
        b: 3.0,
        c: 2.0,
        d: 1.0,
        lower_is_better: false,
    }
}
fn default_cac_bands() -> GradeBands {
    GradeBands {
        a: 50.0,
        b: 75.0,
        c: 100.0,
        d: 150.0,
        lower_is_better: true,
    }
}
fn default_ltv_cac_bands() -> GradeBands {
    GradeBands {
        a: 5.0,
        b: 4.0,
        c: 3.0,
        d: 2.0,
        lower_is_better: false,
    }
}
fn default_roas_warn() -> f64 {
    2.0
}
fn default_roas_praise() -> f64 {
    4.0
}
fn default_cac_warn() -> f64 {
    100.0
}
fn default_cac_praise() -> f64 {
    50.0
}
fn default_ltv_cac_warn() -> f64 {
    3.0
}
fn default_ltv_cac_praise() -> f64 {
    5.0
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_row_drop_rate: default_max_row_drop_rate(),
            derive_gross_profit: default_derive_gross_profit(),
        }
    }
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            roas_score_bands: default_roas_score_bands(),
            ctr_score_bands: default_ctr_score_bands(),
            conversion_score_bands: default_conversion_score_bands(),
            a_min: default_a_min(),
            b_min: default_b_min(),
            c_min: default_c_min(),
            d_min: default_d_min(),
            roas_bands: default_roas_bands(),
            cac_bands: default_cac_bands(),
            ltv_cac_bands: default_ltv_cac_bands(),
        }
    }
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            roas_warn: default_roas_warn(),
            roas_praise: default_roas_praise(),
            cac_warn: default_cac_warn(),
            cac_praise: default_cac_praise(),
            ltv_cac_warn: default_ltv_cac_warn(),
            ltv_cac_praise: default_ltv_cac_praise(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            loader: LoaderConfig::default(),
            grading: GradingConfig::default(),
            recommend: RecommendConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("MARKET_PULSE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_thresholds() {
        let cfg = AppConfig::default();
        assert!((cfg.recommend.roas_warn - 2.0).abs() < f64::EPSILON);
        assert!((cfg.recommend.cac_warn - 100.0).abs() < f64::EPSILON);
        assert_eq!(cfg.grading.a_min, 90);
        assert_eq!(cfg.grading.roas_score_bands[0].points, 40);
        assert!(cfg.grading.cac_bands.lower_is_better);
    }
}
