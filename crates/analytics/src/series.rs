use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate};
use core_types::{Bucket, Trade};
use rust_decimal::Decimal;
use serde::Serialize;

/// One point of a cumulative P&L curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnPoint {
    /// Start of the period (or the trade's timestamp for per-trade series).
    pub date: DateTime<FixedOffset>,
    /// Canonical period label, e.g. `2024-01-05` or `Jan 2024`.
    pub label: String,
    pub period_pnl: Decimal,
    pub cumulative_pnl: Decimal,
    pub trade_count: usize,
}

/// Returns the trades sorted ascending by timestamp. Ties keep their input order.
pub fn chronological(trades: &[Trade]) -> Vec<&Trade> {
    let mut sorted: Vec<&Trade> = trades.iter().collect();
    // `sort_by_key` is stable.
    sorted.sort_by_key(|t| t.timestamp);
    sorted
}

/// Builds the chronologically ordered cumulative P&L series.
///
/// Trades falling into the same period are summed into one point. The running sum
/// starts at `initial_balance` when given, at zero otherwise.
pub fn build_return_series(
    trades: &[Trade],
    bucket: Bucket,
    initial_balance: Option<Decimal>,
) -> Vec<ReturnPoint> {
    let mut series: Vec<ReturnPoint> = Vec::new();
    let mut cumulative = initial_balance.unwrap_or(Decimal::ZERO);

    for trade in chronological(trades) {
        let start = period_start(&trade.timestamp, bucket);

        // Sorted input means a period's trades are contiguous.
        match series.last_mut() {
            Some(last) if bucket != Bucket::Trade && last.date == start => {
                last.period_pnl = last.period_pnl.saturating_add(trade.pnl);
                last.trade_count += 1;
                cumulative = cumulative.saturating_add(trade.pnl);
                last.cumulative_pnl = cumulative;
            }
            _ => {
                cumulative = cumulative.saturating_add(trade.pnl);
                series.push(ReturnPoint {
                    date: start,
                    label: period_label(&start, bucket),
                    period_pnl: trade.pnl,
                    cumulative_pnl: cumulative,
                    trade_count: 1,
                });
            }
        }
    }

    tracing::debug!(bucket = %bucket, points = series.len(), "Built return series.");
    series
}

/// The per-period P&L of a series, the input of the dispersion ratios.
pub fn period_returns(series: &[ReturnPoint]) -> Vec<Decimal> {
    series.iter().map(|p| p.period_pnl).collect()
}

/// The start of the period containing `ts`, in the same offset.
pub fn period_start(ts: &DateTime<FixedOffset>, bucket: Bucket) -> DateTime<FixedOffset> {
    let date = ts.date_naive();
    let start_date = match bucket {
        Bucket::Trade => return *ts,
        Bucket::Day => date,
        Bucket::Week => date - Duration::days(i64::from(date.weekday().num_days_from_monday())),
        Bucket::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date),
    };
    start_date
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| naive.and_local_timezone(*ts.offset()).single())
        .unwrap_or(*ts)
}

pub fn period_label(start: &DateTime<FixedOffset>, bucket: Bucket) -> String {
    match bucket {
        Bucket::Trade => start.to_rfc3339(),
        Bucket::Day => start.format("%Y-%m-%d").to_string(),
        Bucket::Week => start.format("%G-W%V").to_string(),
        Bucket::Month => start.format("%b %Y").to_string(),
    }
}
