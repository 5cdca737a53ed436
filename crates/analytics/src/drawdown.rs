use crate::series::ReturnPoint;
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawdownPoint {
    pub date: DateTime<FixedOffset>,
    pub label: String,
    /// `cumulative_pnl - running_peak`; never positive.
    pub drawdown: Decimal,
    pub cumulative_pnl: Decimal,
}

/// The underwater curve of a return series and its extremes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DrawdownSeries {
    pub points: Vec<DrawdownPoint>,
    /// Depth of the deepest trough, as a non-negative amount.
    pub max_drawdown: Decimal,
    /// When the deepest trough was reached. `None` if the curve never fell below its peak.
    pub max_drawdown_date: Option<DateTime<FixedOffset>>,
    /// Longest run of consecutive points spent below the running peak.
    pub longest_underwater: usize,
}

/// Tracks the running peak of the cumulative P&L in a single forward pass.
///
/// The peak starts at the first point's cumulative P&L, so a series opening with a loss
/// is not counted as a drawdown from zero.
pub fn compute_drawdown(series: &[ReturnPoint]) -> DrawdownSeries {
    let Some(first) = series.first() else {
        return DrawdownSeries::default();
    };

    let mut result = DrawdownSeries {
        points: Vec::with_capacity(series.len()),
        ..Default::default()
    };
    let mut peak = first.cumulative_pnl;
    let mut deepest = Decimal::ZERO;
    let mut underwater = 0usize;

    for point in series {
        peak = peak.max(point.cumulative_pnl);
        let drawdown = point.cumulative_pnl.saturating_sub(peak);

        if drawdown < deepest {
            deepest = drawdown;
            result.max_drawdown_date = Some(point.date);
        }
        if drawdown < Decimal::ZERO {
            underwater += 1;
            result.longest_underwater = result.longest_underwater.max(underwater);
        } else {
            underwater = 0;
        }

        result.points.push(DrawdownPoint {
            date: point.date,
            label: point.label.clone(),
            drawdown,
            cumulative_pnl: point.cumulative_pnl,
        });
    }

    result.max_drawdown = deepest.abs();
    result
}
