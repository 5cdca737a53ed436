use analytics::{AnalyticsEngine, CategoryBreakdown, MetricsReport, normalize_with_offset};
use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use configuration::{ReportOverrides, Settings};
use core_types::RawTrade;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// The main entry point for the Tradebook analytics CLI.
fn main() -> anyhow::Result<()> {
    // A missing .env is fine; it only carries optional TRADEBOOK__* overrides.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report(args) => handle_report(args),
        Commands::Normalize(args) => handle_normalize(args),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Performance analytics for an exported trading journal.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the metrics report of a trade list.
    Report(ReportArgs),
    /// Show which records survive validation, and why the others were dropped.
    Normalize(CommonArgs),
}

#[derive(Parser)]
struct CommonArgs {
    /// JSON file holding an array of trade records.
    #[arg(long)]
    trades: PathBuf,

    /// Configuration file (defaults to ./tradebook.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: ReportOverrides,
}

#[derive(Parser)]
struct ReportArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Print the whole report as JSON instead of tables.
    #[arg(long)]
    json: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn handle_report(args: ReportArgs) -> anyhow::Result<()> {
    let (settings, raw_trades) = prepare(args.common)?;

    let report = AnalyticsEngine::new().calculate(&raw_trades, &settings.report);
    tracing::info!(
        trades = report.total_trades(),
        skipped = report.skipped.len(),
        "Report computed."
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn handle_normalize(args: CommonArgs) -> anyhow::Result<()> {
    let (settings, raw_trades) = prepare(args)?;

    let offset = analytics::reporting_offset(&settings.report);
    let normalized = normalize_with_offset(&raw_trades, offset);
    println!("{}", serde_json::to_string_pretty(&normalized)?);
    Ok(())
}

/// Loads settings, installs the tracing subscriber and reads the trade file.
fn prepare(args: CommonArgs) -> anyhow::Result<(Settings, Vec<RawTrade>)> {
    let settings = configuration::load_settings(args.config.as_deref())
        .context("Failed to load configuration")?;
    let settings = args.overrides.apply(settings)?;

    init_tracing(&settings.log_level);

    let raw_trades = read_trades(&args.trades)?;
    tracing::debug!(records = raw_trades.len(), path = %args.trades.display(), "Read trade file.");
    Ok((settings, raw_trades))
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // Logs go to stderr so that JSON output on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_trades(path: &Path) -> anyhow::Result<Vec<RawTrade>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read trade file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of trade records", path.display()))
}

// ==============================================================================
// Table Output
// ==============================================================================

fn print_report(report: &MetricsReport) {
    let s = &report.summary;

    let mut summary = new_table(vec!["Metric", "Value"]);
    summary
        .add_row(vec!["Trades".to_string(), s.total_trades.to_string()])
        .add_row(vec!["Win rate".to_string(), format!("{:.2}%", s.win_rate)])
        .add_row(vec!["Net P&L".to_string(), money(s.net_pnl)])
        .add_row(vec!["Average win".to_string(), money(s.avg_win)])
        .add_row(vec!["Average loss".to_string(), money(s.avg_loss)])
        .add_row(vec!["Profit factor".to_string(), s.profit_factor.to_string()])
        .add_row(vec!["Expectancy".to_string(), money(s.expectancy)])
        .add_row(vec!["Max drawdown".to_string(), money(report.max_drawdown)])
        .add_row(vec![
            format!("Sharpe (per {})", report.bucket),
            format!("{:.3}", s.sharpe_ratio),
        ])
        .add_row(vec![
            format!("Sortino (per {})", report.bucket),
            format!("{:.3}", s.sortino_ratio),
        ])
        .add_row(vec![
            "Max consecutive wins / losses".to_string(),
            format!("{} / {}", s.max_consecutive_wins, s.max_consecutive_losses),
        ]);
    println!("{summary}");

    for breakdown in &report.breakdowns {
        println!("\nBy {}", breakdown.dimension);
        println!("{}", breakdown_table(&breakdown.categories));
    }

    if !report.skipped.is_empty() {
        println!("\nSkipped {} record(s):", report.skipped.len());
        for skipped in &report.skipped {
            println!(
                "  #{} {}: {}",
                skipped.index,
                skipped.id.as_deref().unwrap_or("-"),
                skipped.reason
            );
        }
    }
}

fn breakdown_table(categories: &CategoryBreakdown) -> Table {
    let mut table = new_table(vec![
        "Category", "Trades", "Total", "Average", "Best", "Worst", "Win rate", "PF", "Max DD",
        "Sharpe",
    ]);
    for (key, m) in categories.iter() {
        table.add_row(vec![
            Cell::new(key),
            Cell::new(m.count),
            Cell::new(money(m.total_pnl)),
            Cell::new(money(m.average_pnl)),
            Cell::new(money(m.best_trade)),
            Cell::new(money(m.worst_trade)),
            Cell::new(format!("{:.1}%", m.win_rate)),
            Cell::new(m.profit_factor),
            Cell::new(money(m.max_drawdown)),
            Cell::new(format!("{:.3}", m.sharpe_ratio)),
        ]);
    }
    table
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn money(value: Decimal) -> String {
    value.round_dp(2).to_string()
}
