//! # Tide Windows Application Entry Point
//!
//! This binary crate coordinates forecast fetching, window scanning and output.
//! It writes the CSV schedule and, with `--chart`, prints an ASCII tide chart
//! of the first few days for a quick visual check.

// Test modules
#[cfg(test)]
mod tests;

use anyhow::Context;
use chrono::{Duration, Local, NaiveDate};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tide_windows_lib::config::{Config, CONFIG_FILE};
use tide_windows_lib::tide_data::{Cache, ForecastRequest};
use tide_windows_lib::{
    curve, export, fallback, renderer::draw_ascii, scanner, summary, tide_data, DayWindows,
    TideSeries,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Number of days shown by `--chart`
const CHART_DAYS: i64 = 3;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Find daylight windows where the tide is deep enough to launch",
    long_about = None
)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// First forecast date, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Number of forecast days (overrides the config file)
    #[arg(long)]
    days: Option<u32>,

    /// Minimum tide height in meters (overrides the config file)
    #[arg(long)]
    threshold: Option<f64>,

    /// Output CSV path (overrides the config file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print an ASCII chart of the first days
    #[arg(long)]
    chart: bool,

    /// Skip the network and use the approximate tide model
    #[arg(long)]
    offline: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Fetch the forecast with automatic fallback on failure.
async fn load_series(config: &Config, start: NaiveDate, days: u32) -> TideSeries {
    let request = ForecastRequest::new(config.location.id, start, days);
    let cache = Cache {
        path: config.output.cache_path.clone(),
        ttl: std::time::Duration::from_secs(config.output.cache_ttl_minutes * 60),
    };

    let api_key = tide_data::api_key(&config.location.api_key_env);
    if api_key.is_none() {
        warn!(
            env = %config.location.api_key_env,
            "API key not set, only cached forecasts are available"
        );
    }

    match tide_data::fetch(&request, api_key.as_deref(), &cache).await {
        Ok(points) => TideSeries {
            points,
            offline: false,
        },
        Err(error) => {
            // Continue with synthetic extrema rather than failing the run
            warn!(%error, "tide forecast unavailable, falling back to offline model");
            fallback::approximate(start, days)
        }
    }
}

fn log_summary(series: &TideSeries, windows: &DayWindows) {
    if let Some(stats) = summary::extrema_stats(&series.points) {
        info!(
            extrema = stats.count,
            max_m = stats.max_height,
            min_m = stats.min_height,
            offline = series.offline,
            "tide data"
        );
    }

    let totals = summary::summarize(windows);
    info!(
        days = totals.days.len(),
        total = %export::format_duration(totals.total),
        average_per_day = %export::format_duration(totals.average_per_day),
        "boatable time"
    );
    match totals.best_day {
        Some(best) => info!(
            date = %best.date,
            total = %export::format_duration(best.total),
            from = %best.earliest_start.time(),
            until = %best.latest_end.time(),
            "best day"
        ),
        None => warn!("no boatable windows in the requested range"),
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load_from_path(&cli.config);
    let mut params = config
        .scan
        .scan_params()
        .context("invalid [scan] configuration")?;
    if let Some(threshold) = cli.threshold {
        params.threshold = threshold;
    }

    let start = cli.start.unwrap_or_else(|| Local::now().date_naive());
    let days = cli.days.unwrap_or(config.scan.days);

    let series = if cli.offline {
        info!("offline mode, using approximate tides");
        fallback::approximate(start, days)
    } else {
        // Create Tokio runtime for the forecast request
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(load_series(&config, start, days))
    };

    let windows = scanner::scan(&series.points, &params);

    let output = cli.output.unwrap_or_else(|| config.output.csv_path.clone());
    export::write_windows_file(&output, &windows)
        .with_context(|| format!("writing {}", output.display()))?;

    log_summary(&series, &windows);

    if cli.chart {
        let from = start.and_time(chrono::NaiveTime::MIN);
        let to = from + Duration::days(CHART_DAYS);
        let samples = curve::sample_curve(&series.points, from, to, params.tick);
        draw_ascii(&samples, &params, series.offline);
    }

    Ok(())
}
