use crate::drawdown::DrawdownSeries;
use crate::grouping::CategoryBreakdown;
use crate::normalizer::SkippedTrade;
use crate::ratios::{ProfitFactor, RatioMetrics};
use crate::series::ReturnPoint;
use core_types::{Bucket, Dimension};
use rust_decimal::Decimal;
use serde::Serialize;

/// Per-category metrics along one dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionBreakdown {
    pub dimension: Dimension,
    pub categories: CategoryBreakdown,
}

/// The complete output of the analytics pipeline.
///
/// This struct is what presentation layers consume: every value is unformatted,
/// and `profit_factor` must be checked for `Unbounded` before display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    #[serde(flatten)]
    pub summary: RatioMetrics,
    /// Depth of the deepest drawdown of the cumulative curve, non-negative.
    pub max_drawdown: Decimal,

    pub bucket: Bucket,
    pub initial_balance: Option<Decimal>,
    /// The per-period P&L that Sharpe and Sortino were computed from.
    pub period_returns: Vec<Decimal>,
    pub return_series: Vec<ReturnPoint>,
    pub drawdown: DrawdownSeries,

    pub breakdowns: Vec<DimensionBreakdown>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedTrade>,
}

impl MetricsReport {
    /// Creates a new, empty report with zero values.
    pub fn empty(bucket: Bucket) -> Self {
        Self {
            summary: RatioMetrics::default(),
            max_drawdown: Decimal::ZERO,
            bucket,
            initial_balance: None,
            period_returns: Vec::new(),
            return_series: Vec::new(),
            drawdown: DrawdownSeries::default(),
            breakdowns: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn total_trades(&self) -> usize {
        self.summary.total_trades
    }

    pub fn win_rate(&self) -> f64 {
        self.summary.win_rate
    }

    pub fn avg_win(&self) -> Decimal {
        self.summary.avg_win
    }

    pub fn avg_loss(&self) -> Decimal {
        self.summary.avg_loss
    }

    pub fn profit_factor(&self) -> ProfitFactor {
        self.summary.profit_factor
    }

    pub fn sharpe_ratio(&self) -> f64 {
        self.summary.sharpe_ratio
    }

    pub fn sortino_ratio(&self) -> f64 {
        self.summary.sortino_ratio
    }

    pub fn breakdown(&self, dimension: Dimension) -> Option<&CategoryBreakdown> {
        self.breakdowns
            .iter()
            .find(|b| b.dimension == dimension)
            .map(|b| &b.categories)
    }
}

impl Default for MetricsReport {
    fn default() -> Self {
        Self::empty(Bucket::default())
    }
}
