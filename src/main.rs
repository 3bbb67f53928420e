mod analysis;
mod config;
mod error;
mod format;
mod indicator;
mod model;
mod render;
mod source;

use std::io;
use std::path::Path;

use clap::{Parser, Subcommand};
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use error::SourceError;
use model::{Asset, HistoryInterval, Page, PriceHistoryPoint, RangePreset};
use render::Renderer;
use render::json::JsonRenderer;
use render::terminal::TerminalRenderer;
use source::MarketSource;
use source::coincap::CoinCapSource;

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("market data error")]
    Source,
    #[display("analysis error")]
    Analysis,
    #[display("output error")]
    Output,
}

#[derive(Parser)]
#[command(name = "coin-trend", about = "Crypto market trend analysis")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "coin-trend.toml")]
    config: String,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List assets by market cap rank
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Assets per page (defaults to `analysis.page_limit`)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..=config::MAX_PAGE_LIMIT as u64))]
        limit: Option<u64>,
        /// Use the built-in fixture assets instead of the API
        #[arg(long)]
        offline: bool,
    },
    /// Show one asset's market data
    Show { id: String },
    /// Run the trend analysis over an asset's price history
    Analyze {
        id: String,
        /// 24h, 7d, 30d, 90d or 1y (defaults to `analysis.default_range`)
        #[arg(long, value_parser = parse_range)]
        range: Option<RangePreset>,
        /// Override the sampling interval implied by the range (m1 .. d1)
        #[arg(long, value_parser = parse_interval)]
        interval: Option<HistoryInterval>,
    },
    /// Print price with short and long EMA overlays
    Chart {
        id: String,
        #[arg(long, value_parser = parse_range)]
        range: Option<RangePreset>,
        #[arg(long, value_parser = parse_interval)]
        interval: Option<HistoryInterval>,
    },
}

fn parse_range(s: &str) -> Result<RangePreset, String> {
    RangePreset::from_str(s).ok_or_else(|| format!("unknown range `{s}` (24h, 7d, 30d, 90d, 1y)"))
}

fn parse_interval(s: &str) -> Result<HistoryInterval, String> {
    HistoryInterval::from_str(s)
        .ok_or_else(|| format!("unknown interval `{s}` (m1, m5, m15, m30, h1, h2, h6, h12, d1)"))
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = config::load(Path::new(&cli.config)).change_context(AppError::Config)?;

    init_tracing(&config);

    let stdout = io::stdout().lock();
    let mut renderer: Box<dyn Renderer> = if cli.json {
        Box::new(JsonRenderer::new(stdout))
    } else {
        Box::new(TerminalRenderer::new(stdout))
    };

    match cli.command {
        Command::List {
            page,
            limit,
            offline,
        } => {
            let limit = limit.map_or(config.analysis.page_limit, |limit| limit as usize);
            let page = Page::new(page, limit);
            let assets = if offline {
                info!("offline mode, using fixture assets");
                CoinCapSource::mock_assets()
            } else {
                let source = build_source(&config)?;
                source
                    .list_assets(page)
                    .await
                    .change_context(AppError::Source)?
            };
            renderer
                .assets(&assets, page)
                .change_context(AppError::Output)?;
        }
        Command::Show { id } => {
            let source = build_source(&config)?;
            let asset = fetch_asset(&source, &id).await?;
            renderer.asset(&asset).change_context(AppError::Output)?;
        }
        Command::Analyze {
            id,
            range,
            interval,
        } => {
            let range = range.unwrap_or_else(|| config.analysis.range());
            let source = build_source(&config)?;
            let (asset, history) =
                fetch_asset_and_history(&source, &id, range, interval).await?;

            let analysis = analysis::analyze_trend(&history)
                .change_context(AppError::Analysis)
                .attach_with(|| format!("asset: {id}"))?;

            info!(
                id = %id,
                range = %range,
                samples = history.len(),
                trend = %analysis.trend,
                confidence = analysis.confidence,
                "trend analysis complete"
            );

            renderer
                .analysis(&asset, range, &analysis)
                .change_context(AppError::Output)?;
        }
        Command::Chart {
            id,
            range,
            interval,
        } => {
            let range = range.unwrap_or_else(|| config.analysis.range());
            let source = build_source(&config)?;
            let (asset, history) =
                fetch_asset_and_history(&source, &id, range, interval).await?;

            let points = analysis::chart::default_overlay(&history)
                .change_context(AppError::Analysis)
                .attach_with(|| format!("asset: {id}"))?;

            renderer
                .chart(&asset, range, &points)
                .change_context(AppError::Output)?;
        }
    }

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    // stdout carries command output, so logs go to stderr
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
}

fn build_source(config: &AppConfig) -> Result<CoinCapSource, Report<AppError>> {
    CoinCapSource::new(&config.coincap).change_context(AppError::Source)
}

async fn fetch_asset(source: &dyn MarketSource, id: &str) -> Result<Asset, Report<AppError>> {
    source
        .asset(id)
        .await
        .change_context(AppError::Source)?
        .ok_or_else(|| Report::new(SourceError::NotFound { id: id.to_owned() }))
        .change_context(AppError::Source)
}

/// Asset metadata and its history for `range`, fetched concurrently.
async fn fetch_asset_and_history(
    source: &dyn MarketSource,
    id: &str,
    range: RangePreset,
    interval: Option<HistoryInterval>,
) -> Result<(Asset, Vec<PriceHistoryPoint>), Report<AppError>> {
    let mut window = range.window(chrono::Utc::now());
    if let Some(interval) = interval {
        window.interval = interval;
    }
    let history = async {
        source
            .history(id, window)
            .await
            .change_context(AppError::Source)
            .attach_with(|| {
                format!(
                    "source: {}, range: {range}, interval: {}",
                    source.name(),
                    window.interval
                )
            })
    };

    tokio::try_join!(fetch_asset(source, id), history)
}
