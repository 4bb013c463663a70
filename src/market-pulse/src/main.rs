//! MarketPulse — marketing intelligence core over channel spend and
//! business-outcome CSVs.
//!
//! Loads the four input files once, computes the filtered metric set,
//! grades, recommendations, and breakdowns, and prints one JSON report.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use pulse_core::config::AppConfig;
use pulse_core::snapshot::LoadWarnings;
use pulse_core::Channel;
use pulse_ingest::load_and_merge;
use pulse_metrics::{
    campaign_breakdown, channel_breakdown, channel_grades, compute_metrics, daily_series, funnel,
    performance_grade, recommendations, state_breakdown, tactic_breakdown, weekly_series,
    ChannelGrade, FilterSpec, Grade, MetricSet, Recommendation,
};

#[derive(Parser, Debug)]
#[command(name = "market-pulse")]
#[command(about = "Marketing intelligence over channel spend and business outcomes")]
#[command(version)]
struct Cli {
    /// Facebook channel CSV
    #[arg(long, env = "MARKET_PULSE__FACEBOOK_FILE")]
    facebook: PathBuf,

    /// Google channel CSV
    #[arg(long, env = "MARKET_PULSE__GOOGLE_FILE")]
    google: PathBuf,

    /// TikTok channel CSV
    #[arg(long, env = "MARKET_PULSE__TIKTOK_FILE")]
    tiktok: PathBuf,

    /// Business outcomes CSV
    #[arg(long, env = "MARKET_PULSE__BUSINESS_FILE")]
    business: PathBuf,

    /// Start of the date filter (inclusive), YYYY-MM-DD
    #[arg(long)]
    from: Option<NaiveDate>,

    /// End of the date filter (inclusive), YYYY-MM-DD
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Restrict to a channel (repeatable)
    #[arg(long = "channel")]
    channels: Vec<String>,

    /// Restrict to a state (repeatable)
    #[arg(long = "state")]
    states: Vec<String>,

    /// Restrict to a tactic (repeatable)
    #[arg(long = "tactic")]
    tactics: Vec<String>,

    /// Pretty-print the JSON report
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

/// Everything the presentation layer consumes, in one document.
#[derive(Debug, Serialize)]
struct Report {
    metrics: MetricSet,
    grade: Grade,
    recommendations: Vec<Recommendation>,
    channels: Vec<ChannelGrade>,
    channel_breakdown: Vec<pulse_metrics::breakdown::BreakdownRow>,
    state_breakdown: Vec<pulse_metrics::breakdown::BreakdownRow>,
    tactic_breakdown: Vec<pulse_metrics::breakdown::BreakdownRow>,
    campaigns: Vec<pulse_metrics::breakdown::CampaignRow>,
    funnel: Vec<pulse_metrics::breakdown::FunnelStage>,
    daily: Vec<pulse_metrics::breakdown::DailyRow>,
    weekly: Vec<pulse_metrics::breakdown::WeeklyRow>,
    load_warnings: LoadWarnings,
}

fn build_filter(cli: &Cli) -> anyhow::Result<FilterSpec> {
    let mut filter = FilterSpec::new();
    match (cli.from, cli.to) {
        (Some(from), Some(to)) => filter = filter.with_dates(from, to),
        (Some(from), None) => filter = filter.with_dates(from, NaiveDate::MAX),
        (None, Some(to)) => filter = filter.with_dates(NaiveDate::MIN, to),
        (None, None) => {}
    }
    for raw in &cli.channels {
        let channel = Channel::parse(raw)
            .ok_or_else(|| anyhow::anyhow!("unknown channel '{raw}' (facebook|google|tiktok)"))?;
        filter = filter.with_channel(channel);
    }
    for state in &cli.states {
        filter = filter.with_state(state);
    }
    for tactic in &cli.tactics {
        filter = filter.with_tactic(tactic);
    }
    Ok(filter)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "market_pulse=info,pulse_ingest=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    let snapshot = load_and_merge(
        &[
            (Channel::Facebook, cli.facebook.as_path()),
            (Channel::Google, cli.google.as_path()),
            (Channel::Tiktok, cli.tiktok.as_path()),
        ],
        cli.business.as_path(),
        &config.loader,
    )?;

    let filter = build_filter(&cli)?;
    let metrics = compute_metrics(&snapshot, &filter);
    info!(
        marketing_rows = snapshot.marketing.len(),
        roas = metrics.roas,
        spend = metrics.total_spend,
        "metrics computed"
    );

    let report = Report {
        grade: performance_grade(
            metrics.roas,
            metrics.ctr,
            metrics.conversion_rate,
            &config.grading,
        ),
        recommendations: recommendations(&metrics, &config.recommend),
        channels: channel_grades(&snapshot, &filter, &config.grading),
        channel_breakdown: channel_breakdown(&snapshot, &filter),
        state_breakdown: state_breakdown(&snapshot, &filter),
        tactic_breakdown: tactic_breakdown(&snapshot, &filter),
        campaigns: campaign_breakdown(&snapshot, &filter),
        funnel: funnel(&snapshot, &filter),
        daily: daily_series(&snapshot, &filter),
        weekly: weekly_series(&snapshot, &filter),
        load_warnings: snapshot.warnings.clone(),
        metrics,
    };

    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}
