use crate::enums::{Bucket, Dimension};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Selects which periods and dimensions a metrics report is computed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// The aggregation period of the return series; its per-period P&L feeds Sharpe and Sortino.
    pub bucket: Bucket,
    /// Added once as the base of the cumulative series.
    pub initial_balance: Option<Decimal>,
    /// Breakdowns to compute, in display order.
    pub dimensions: Vec<Dimension>,
    /// Offset of the trader's local time from UTC, used for hour, day and month bucketing.
    pub utc_offset_minutes: i32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            bucket: Bucket::Day,
            initial_balance: None,
            dimensions: vec![Dimension::Strategy, Dimension::Symbol, Dimension::TimeOfDay],
            utc_offset_minutes: 0,
        }
    }
}
