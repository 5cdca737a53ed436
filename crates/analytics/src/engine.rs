use crate::drawdown::compute_drawdown;
use crate::grouping::group_by_dimension;
use crate::normalizer::{NormalizedTrades, normalize_with_offset};
use crate::ratios::compute_ratios;
use crate::report::{DimensionBreakdown, MetricsReport};
use crate::series::{build_return_series, chronological, period_returns};
use chrono::{FixedOffset, Offset, Utc};
use core_types::{RawTrade, ReportConfig, Trade};

/// A stateless calculator that turns trade lists into a `MetricsReport`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyticsEngine;

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self
    }

    /// Normalizes raw records and assembles the report from the survivors.
    pub fn calculate(&self, raw_trades: &[RawTrade], config: &ReportConfig) -> MetricsReport {
        assemble_raw(raw_trades, config)
    }
}

/// The reporting offset of `config`, falling back to UTC when out of range.
pub fn reporting_offset(config: &ReportConfig) -> FixedOffset {
    FixedOffset::east_opt(config.utc_offset_minutes.saturating_mul(60)).unwrap_or(Utc.fix())
}

/// Runs the normalizer with the configured offset, then [`assemble`].
pub fn assemble_raw(raw_trades: &[RawTrade], config: &ReportConfig) -> MetricsReport {
    let NormalizedTrades { trades, skipped } =
        normalize_with_offset(raw_trades, reporting_offset(config));
    let mut report = assemble(&trades, config);
    report.skipped = skipped;
    report
}

/// Composes the series, drawdown, ratio and breakdown computations into one report.
///
/// Total over all inputs: an empty trade list yields a zeroed report that still lists one
/// empty breakdown per configured dimension. Trade timestamps are used in the offset they carry.
#[tracing::instrument(skip_all, fields(trades = trades.len(), bucket = %config.bucket))]
pub fn assemble(trades: &[Trade], config: &ReportConfig) -> MetricsReport {
    let mut report = MetricsReport::empty(config.bucket);
    report.initial_balance = config.initial_balance;
    report.breakdowns = config
        .dimensions
        .iter()
        .map(|&dimension| DimensionBreakdown {
            dimension,
            categories: group_by_dimension(trades, dimension, config.bucket),
        })
        .collect();
    if trades.is_empty() {
        tracing::debug!("No trades to analyze, returning an empty report.");
        return report;
    }

    report.return_series = build_return_series(trades, config.bucket, config.initial_balance);
    report.period_returns = period_returns(&report.return_series);
    report.drawdown = compute_drawdown(&report.return_series);
    report.max_drawdown = report.drawdown.max_drawdown;

    // Streaks are measured in time order, not input order.
    let sorted = chronological(trades);
    report.summary = compute_ratios(sorted.iter().copied(), &report.period_returns);

    tracing::debug!(
        total_trades = report.summary.total_trades,
        points = report.return_series.len(),
        max_drawdown = %report.max_drawdown,
        "Assembled metrics report."
    );
    report
}
