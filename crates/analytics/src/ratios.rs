use core_types::Trade;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gross profit over gross loss.
///
/// `Unbounded` is the "no losses, some profit" case. It must be displayed specially
/// (e.g. as `∞`) rather than treated as a number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "ProfitFactorRepr", try_from = "ProfitFactorRepr")]
pub enum ProfitFactor {
    Ratio(f64),
    Unbounded,
}

impl ProfitFactor {
    pub fn from_gross(gross_profit: Decimal, gross_loss: Decimal) -> Self {
        if gross_loss > Decimal::ZERO {
            let ratio = gross_profit
                .checked_div(gross_loss)
                .and_then(|r| r.to_f64())
                .unwrap_or(0.0);
            ProfitFactor::Ratio(ratio)
        } else if gross_profit > Decimal::ZERO {
            ProfitFactor::Unbounded
        } else {
            ProfitFactor::Ratio(0.0)
        }
    }

    /// The numeric value, with `Unbounded` mapped to positive infinity.
    pub fn as_f64(&self) -> f64 {
        match self {
            ProfitFactor::Ratio(r) => *r,
            ProfitFactor::Unbounded => f64::INFINITY,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, ProfitFactor::Unbounded)
    }
}

impl Default for ProfitFactor {
    fn default() -> Self {
        ProfitFactor::Ratio(0.0)
    }
}

impl fmt::Display for ProfitFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfitFactor::Ratio(r) => write!(f, "{r:.2}"),
            ProfitFactor::Unbounded => f.write_str("∞"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ProfitFactorRepr {
    Ratio(f64),
    Text(String),
}

impl From<ProfitFactor> for ProfitFactorRepr {
    fn from(pf: ProfitFactor) -> Self {
        match pf {
            ProfitFactor::Ratio(r) => ProfitFactorRepr::Ratio(r),
            ProfitFactor::Unbounded => ProfitFactorRepr::Text("inf".to_string()),
        }
    }
}

impl TryFrom<ProfitFactorRepr> for ProfitFactor {
    type Error = String;

    fn try_from(repr: ProfitFactorRepr) -> Result<Self, Self::Error> {
        match repr {
            ProfitFactorRepr::Ratio(r) => Ok(ProfitFactor::Ratio(r)),
            ProfitFactorRepr::Text(t) if t == "inf" => Ok(ProfitFactor::Unbounded),
            ProfitFactorRepr::Text(t) => Err(format!("invalid profit factor '{t}'")),
        }
    }
}

/// Win/loss tallies gathered in one pass over a set of trades.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TradeTally {
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
    pub gross_profit: Decimal,
    /// Absolute value of the summed losses.
    pub gross_loss: Decimal,
    pub net: Decimal,
    pub best: Option<Decimal>,
    pub worst: Option<Decimal>,
    pub max_win_streak: usize,
    pub max_loss_streak: usize,
}

impl TradeTally {
    pub fn collect<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> Self {
        let mut tally = TradeTally::default();
        let (mut win_streak, mut loss_streak) = (0usize, 0usize);

        for trade in trades {
            let pnl = trade.pnl;
            tally.total += 1;
            tally.net = tally.net.saturating_add(pnl);
            tally.best = Some(tally.best.map_or(pnl, |b| b.max(pnl)));
            tally.worst = Some(tally.worst.map_or(pnl, |w| w.min(pnl)));

            if trade.is_win() {
                tally.wins += 1;
                tally.gross_profit = tally.gross_profit.saturating_add(pnl);
                win_streak += 1;
                loss_streak = 0;
                tally.max_win_streak = tally.max_win_streak.max(win_streak);
            } else if trade.is_loss() {
                tally.losses += 1;
                tally.gross_loss = tally.gross_loss.saturating_add(pnl.abs());
                loss_streak += 1;
                win_streak = 0;
                tally.max_loss_streak = tally.max_loss_streak.max(loss_streak);
            }
        }

        tally
    }

    /// Percentage of trades with positive P&L. Break-even trades count toward the total.
    pub fn win_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.wins as f64 / self.total as f64) * 100.0
    }

    /// Net P&L per trade.
    pub fn average(&self) -> Decimal {
        average(self.net, self.total)
    }

    pub fn avg_win(&self) -> Decimal {
        average(self.gross_profit, self.wins)
    }

    pub fn avg_loss(&self) -> Decimal {
        average(self.gross_loss, self.losses)
    }

    pub fn profit_factor(&self) -> ProfitFactor {
        ProfitFactor::from_gross(self.gross_profit, self.gross_loss)
    }
}

fn average(sum: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    sum.checked_div(Decimal::from(count)).unwrap_or(Decimal::ZERO)
}

/// Trade statistics and risk ratios of one report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioMetrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    pub win_rate: f64,

    pub net_pnl: Decimal,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub profit_factor: ProfitFactor,
    pub avg_win: Decimal,
    /// Mean size of a losing trade, as a positive amount.
    pub avg_loss: Decimal,
    pub expectancy: Decimal,
    pub payoff_ratio: f64,
    pub largest_win: Decimal,
    /// Most negative trade P&L, or zero without losses.
    pub largest_loss: Decimal,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,

    pub mean_return: f64,
    pub std_dev: f64,
    pub downside_deviation: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
}

/// Computes win/loss statistics over `trades` and dispersion ratios over `period_returns`.
///
/// Ratios are per period and assume a zero risk-free rate. Streaks follow the order of `trades`.
pub fn compute_ratios<'a>(
    trades: impl IntoIterator<Item = &'a Trade>,
    period_returns: &[Decimal],
) -> RatioMetrics {
    let tally = TradeTally::collect(trades);

    let avg_win = tally.avg_win();
    let avg_loss = tally.avg_loss();
    let payoff_ratio = if avg_win > Decimal::ZERO && avg_loss > Decimal::ZERO {
        avg_win
            .checked_div(avg_loss)
            .and_then(|r| r.to_f64())
            .unwrap_or(0.0)
    } else {
        0.0
    };

    let mean_return = mean(period_returns);
    let std_dev = std_dev(period_returns);
    let downside_deviation = downside_deviation(period_returns);

    RatioMetrics {
        total_trades: tally.total,
        winning_trades: tally.wins,
        losing_trades: tally.losses,
        breakeven_trades: tally.total - tally.wins - tally.losses,
        win_rate: tally.win_rate(),
        net_pnl: tally.net,
        gross_profit: tally.gross_profit,
        gross_loss: tally.gross_loss,
        profit_factor: tally.profit_factor(),
        avg_win,
        avg_loss,
        expectancy: tally.average(),
        payoff_ratio,
        largest_win: if tally.wins > 0 {
            tally.best.unwrap_or_default()
        } else {
            Decimal::ZERO
        },
        largest_loss: if tally.losses > 0 {
            tally.worst.unwrap_or_default()
        } else {
            Decimal::ZERO
        },
        max_consecutive_wins: tally.max_win_streak,
        max_consecutive_losses: tally.max_loss_streak,
        mean_return,
        std_dev,
        downside_deviation,
        sharpe_ratio: ratio(mean_return, std_dev),
        sortino_ratio: ratio(mean_return, downside_deviation),
    }
}

/// Arithmetic mean of the period returns.
pub fn mean(values: &[Decimal]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    match exact_mean(values) {
        Some(mean) => mean.to_f64().unwrap_or(0.0),
        None => floats(values).iter().sum::<f64>() / values.len() as f64,
    }
}

/// Population standard deviation (divides by N).
///
/// The variance is exact in `Decimal`, so equal returns give exactly zero. Only the
/// square root is taken in f64.
pub fn std_dev(values: &[Decimal]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = exact_mean(values).and_then(|mean| {
        mean_square(values.iter().map(|v| v.checked_sub(mean)), values.len())
    });
    match variance {
        Some(variance) => root(variance),
        None => {
            let values = floats(values);
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let variance =
                values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
            variance.sqrt()
        }
    }
}

/// Root mean square of the negative values, still divided by the full N.
pub fn downside_deviation(values: &[Decimal]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let downside = values.iter().map(|v| Some((*v).min(Decimal::ZERO)));
    match mean_square(downside, values.len()) {
        Some(mean_square) => root(mean_square),
        None => {
            let sum_sq = floats(values).iter().map(|v| v.min(0.0).powi(2)).sum::<f64>();
            (sum_sq / values.len() as f64).sqrt()
        }
    }
}

/// `None` when the sum overflows.
fn exact_mean(values: &[Decimal]) -> Option<Decimal> {
    let sum = values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))?;
    sum.checked_div(Decimal::from(values.len()))
}

fn mean_square(
    mut deviations: impl Iterator<Item = Option<Decimal>>,
    count: usize,
) -> Option<Decimal> {
    let sum = deviations.try_fold(Decimal::ZERO, |acc, d| {
        let d = d?;
        acc.checked_add(d.checked_mul(d)?)
    })?;
    sum.checked_div(Decimal::from(count))
}

fn root(value: Decimal) -> f64 {
    value.to_f64().map_or(0.0, f64::sqrt)
}

fn floats(values: &[Decimal]) -> Vec<f64> {
    values.iter().map(|v| v.to_f64().unwrap_or(0.0)).collect()
}

pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use core_types::Direction;
    use rust_decimal_macros::dec;

    fn trades(pnls: &[Decimal]) -> Vec<Trade> {
        pnls.iter()
            .enumerate()
            .map(|(i, &pnl)| Trade {
                id: i.to_string(),
                timestamp: DateTime::parse_from_rfc3339("2024-01-02T10:00:00Z").unwrap(),
                symbol: "NQ".to_string(),
                strategy: "Scalp".to_string(),
                direction: Direction::Long,
                entry_price: None,
                exit_price: None,
                size: dec!(1),
                fees: dec!(0),
                pnl,
            })
            .collect()
    }

    #[test]
    fn test_mixed_trades() {
        let trades = trades(&[dec!(100), dec!(-50), dec!(200)]);

        let metrics = compute_ratios(&trades, &[]);

        assert_eq!(metrics.total_trades, 3);
        assert!((metrics.win_rate - 66.67).abs() < 0.01);
        assert_eq!(metrics.avg_win, dec!(150));
        assert_eq!(metrics.avg_loss, dec!(50));
        assert_eq!(metrics.profit_factor, ProfitFactor::Ratio(6.0));
        assert_eq!(metrics.payoff_ratio, 3.0);
        assert_eq!(metrics.largest_win, dec!(200));
        assert_eq!(metrics.largest_loss, dec!(-50));
        assert_eq!(metrics.expectancy, dec!(250) / dec!(3));
    }

    #[test]
    fn test_breakeven_trades_count_toward_total_only() {
        let trades = trades(&[dec!(10), dec!(0), dec!(0), dec!(-10)]);

        let metrics = compute_ratios(&trades, &[]);

        assert_eq!(metrics.win_rate, 25.0);
        assert_eq!(metrics.breakeven_trades, 2);
        assert_eq!(metrics.winning_trades, 1);
        assert_eq!(metrics.losing_trades, 1);
    }

    #[test]
    fn test_profit_factor_edge_cases() {
        assert_eq!(
            compute_ratios(&trades(&[dec!(5), dec!(7)]), &[]).profit_factor,
            ProfitFactor::Unbounded
        );
        assert_eq!(
            compute_ratios(&trades(&[dec!(-10), dec!(-20)]), &[]).profit_factor,
            ProfitFactor::Ratio(0.0)
        );
        assert_eq!(
            compute_ratios(&trades(&[dec!(0)]), &[]).profit_factor,
            ProfitFactor::Ratio(0.0)
        );
        assert!(ProfitFactor::Unbounded.as_f64().is_infinite());
        assert_eq!(ProfitFactor::Unbounded.to_string(), "∞");
    }

    #[test]
    fn test_profit_factor_serializes_unbounded_as_text() {
        let json = serde_json::to_string(&ProfitFactor::Unbounded).unwrap();
        assert_eq!(json, "\"inf\"");
        let back: ProfitFactor = serde_json::from_str(&json).unwrap();
        assert!(back.is_unbounded());
        assert_eq!(serde_json::to_string(&ProfitFactor::Ratio(1.5)).unwrap(), "1.5");
    }

    #[test]
    fn test_consecutive_streaks_ignore_breakeven() {
        let trades = trades(&[
            dec!(1),
            dec!(2),
            dec!(0),
            dec!(3),
            dec!(-1),
            dec!(-1),
            dec!(0),
            dec!(4),
        ]);

        let metrics = compute_ratios(&trades, &[]);

        assert_eq!(metrics.max_consecutive_wins, 3);
        assert_eq!(metrics.max_consecutive_losses, 2);
    }

    #[test]
    fn test_population_std_dev() {
        let values = [2, 4, 4, 4, 5, 5, 7, 9].map(Decimal::from);
        assert_eq!(mean(&values), 5.0);
        assert_eq!(std_dev(&values), 2.0);
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(std_dev(&[dec!(3)]), 0.0);
    }

    #[test]
    fn test_downside_deviation_divides_by_full_count() {
        let values = [dec!(3), dec!(-4), dec!(0), dec!(1)];
        // sqrt(16 / 4)
        assert_eq!(downside_deviation(&values), 2.0);
        assert_eq!(downside_deviation(&[dec!(1), dec!(2)]), 0.0);
    }

    #[test]
    fn test_sharpe_and_sortino() {
        let returns = [dec!(100), dec!(-50), dec!(200)];
        let metrics = compute_ratios(&trades(&[]), &returns);

        let floats = [100.0, -50.0, 200.0];
        let expected_mean: f64 = 250.0 / 3.0;
        let expected_variance: f64 = floats
            .iter()
            .map(|r| (r - expected_mean).powi(2))
            .sum::<f64>()
            / 3.0;
        let expected_downside = (2500.0_f64 / 3.0).sqrt();

        assert!((metrics.sharpe_ratio - expected_mean / expected_variance.sqrt()).abs() < 1e-9);
        assert!((metrics.sortino_ratio - expected_mean / expected_downside).abs() < 1e-9);
    }

    #[test]
    fn test_flat_returns_give_zero_ratios() {
        let metrics = compute_ratios(&trades(&[]), &[dec!(5), dec!(5), dec!(5)]);
        assert_eq!(metrics.std_dev, 0.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
        assert_eq!(metrics.sortino_ratio, 0.0);
    }

    #[test]
    fn test_flat_fractional_returns_have_exactly_zero_dispersion() {
        // 0.1 has no exact binary representation.
        let returns = [dec!(0.1), dec!(0.1), dec!(0.1)];

        let metrics = compute_ratios(&trades(&[]), &returns);

        assert!((metrics.mean_return - 0.1).abs() < 1e-12);
        assert_eq!(metrics.std_dev, 0.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
    }

    #[test]
    fn test_huge_returns_fall_back_to_float_dispersion() {
        // Squaring these overflows `Decimal`.
        let big = Decimal::from(10i128.pow(20));
        let returns = [big, -big];

        let metrics = compute_ratios(&trades(&[]), &returns);

        assert!((metrics.std_dev - 1e20).abs() / 1e20 < 1e-12);
        assert!((metrics.downside_deviation - 1e20 / 2f64.sqrt()).abs() / 1e20 < 1e-12);
        assert_eq!(metrics.sharpe_ratio, 0.0);
    }

    #[test]
    fn test_tallies_saturate_instead_of_overflowing() {
        let trades = trades(&[Decimal::MAX, Decimal::MAX, Decimal::MIN]);

        let metrics = compute_ratios(&trades, &[]);

        assert_eq!(metrics.gross_profit, Decimal::MAX);
        assert_eq!(metrics.gross_loss, Decimal::MAX);
        assert_eq!(metrics.total_trades, 3);
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let metrics = compute_ratios(&trades(&[]), &[]);
        assert_eq!(metrics, RatioMetrics::default());
    }
}
