use crate::drawdown::compute_drawdown;
use crate::ratios::{self, ProfitFactor, TradeTally};
use crate::series::{build_return_series, period_returns};
use chrono::{Datelike, Timelike};
use core_types::{Bucket, Dimension, Trade};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::collections::HashMap;

/// Fixed intraday ranges of the trade's local hour, each half-open `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeOfDay {
    BeforeNine,
    NineToTen,
    TenToNoon,
    NoonToTwo,
    TwoToFour,
    FourToSix,
    AfterSix,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=8 => TimeOfDay::BeforeNine,
            9 => TimeOfDay::NineToTen,
            10..=11 => TimeOfDay::TenToNoon,
            12..=13 => TimeOfDay::NoonToTwo,
            14..=15 => TimeOfDay::TwoToFour,
            16..=17 => TimeOfDay::FourToSix,
            _ => TimeOfDay::AfterSix,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeOfDay::BeforeNine => "<9h",
            TimeOfDay::NineToTen => "9–10h",
            TimeOfDay::TenToNoon => "10–12h",
            TimeOfDay::NoonToTwo => "12–14h",
            TimeOfDay::TwoToFour => "14–16h",
            TimeOfDay::FourToSix => "16–18h",
            TimeOfDay::AfterSix => ">18h",
        }
    }
}

/// Metrics of the trades that share one category key.
///
/// The same shape as the report summary without the breakdowns. Drawdown and the
/// dispersion ratios come from the group's own return series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMetrics {
    pub count: usize,
    pub total_pnl: Decimal,
    pub average_pnl: Decimal,
    pub best_trade: Decimal,
    pub worst_trade: Decimal,
    pub win_rate: f64,
    pub profit_factor: ProfitFactor,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub max_drawdown: Decimal,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
}

impl GroupMetrics {
    fn from_members(members: &[Trade], bucket: Bucket) -> Self {
        let tally = TradeTally::collect(members);
        let series = build_return_series(members, bucket, None);
        let returns = period_returns(&series);
        let mean = ratios::mean(&returns);

        Self {
            count: tally.total,
            total_pnl: tally.net,
            average_pnl: tally.average(),
            best_trade: tally.best.unwrap_or_default(),
            worst_trade: tally.worst.unwrap_or_default(),
            win_rate: tally.win_rate(),
            profit_factor: tally.profit_factor(),
            winning_trades: tally.wins,
            losing_trades: tally.losses,
            gross_profit: tally.gross_profit,
            gross_loss: tally.gross_loss,
            avg_win: tally.avg_win(),
            avg_loss: tally.avg_loss(),
            max_drawdown: compute_drawdown(&series).max_drawdown,
            sharpe_ratio: ratios::ratio(mean, ratios::std_dev(&returns)),
            sortino_ratio: ratios::ratio(mean, ratios::downside_deviation(&returns)),
        }
    }
}

/// Per-category metrics, in the order the categories were first seen.
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryBreakdown {
    entries: Vec<(String, GroupMetrics)>,
    index: HashMap<String, usize>,
}

impl CategoryBreakdown {
    pub fn get(&self, key: &str) -> Option<&GroupMetrics> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GroupMetrics)> {
        self.entries.iter().map(|(k, m)| (k.as_str(), m))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for CategoryBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, metrics) in &self.entries {
            map.serialize_entry(key, metrics)?;
        }
        map.end()
    }
}

/// Groups trades by `key_fn` and computes metrics per group, with daily return series.
///
/// Keys keep the first-seen order of `trades`; a category exists only if a trade maps to it.
pub fn group_by<F>(trades: &[Trade], key_fn: F) -> CategoryBreakdown
where
    F: Fn(&Trade) -> String,
{
    group_by_bucketed(trades, Bucket::default(), key_fn)
}

/// Like [`group_by`], with each group's return series bucketed by `bucket`.
pub fn group_by_bucketed<F>(trades: &[Trade], bucket: Bucket, key_fn: F) -> CategoryBreakdown
where
    F: Fn(&Trade) -> String,
{
    let mut groups: Vec<(String, Vec<Trade>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for trade in trades {
        let key = key_fn(trade);
        match index.get(&key) {
            Some(&i) => groups[i].1.push(trade.clone()),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![trade.clone()]));
            }
        }
    }

    let entries = groups
        .into_iter()
        .map(|(key, members)| {
            let metrics = GroupMetrics::from_members(&members, bucket);
            (key, metrics)
        })
        .collect();

    CategoryBreakdown { entries, index }
}

/// The category key of `trade` along a built-in dimension.
pub fn dimension_key(dimension: Dimension, trade: &Trade) -> String {
    match dimension {
        Dimension::Strategy => trade.strategy.clone(),
        Dimension::Symbol => trade.symbol.clone(),
        Dimension::Direction => trade.direction.to_string(),
        Dimension::TimeOfDay => TimeOfDay::from_hour(trade.timestamp.hour())
            .label()
            .to_string(),
        Dimension::Weekday => trade.timestamp.weekday().to_string(),
        Dimension::Month => trade.timestamp.format("%b %Y").to_string(),
    }
}

pub fn group_by_dimension(
    trades: &[Trade],
    dimension: Dimension,
    bucket: Bucket,
) -> CategoryBreakdown {
    group_by_bucketed(trades, bucket, |t| dimension_key(dimension, t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use core_types::Direction;
    use rust_decimal_macros::dec;

    fn trade(strategy: &str, timestamp: &str, pnl: Decimal) -> Trade {
        Trade {
            id: format!("{strategy}-{timestamp}"),
            timestamp: DateTime::parse_from_rfc3339(timestamp).unwrap(),
            symbol: "DAX".to_string(),
            strategy: strategy.to_string(),
            direction: Direction::Long,
            entry_price: None,
            exit_price: None,
            size: dec!(1),
            fees: dec!(0),
            pnl,
        }
    }

    #[test]
    fn test_hour_ranges_are_half_open() {
        assert_eq!(TimeOfDay::from_hour(0), TimeOfDay::BeforeNine);
        assert_eq!(TimeOfDay::from_hour(8), TimeOfDay::BeforeNine);
        assert_eq!(TimeOfDay::from_hour(9), TimeOfDay::NineToTen);
        assert_eq!(TimeOfDay::from_hour(10), TimeOfDay::TenToNoon);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::NoonToTwo);
        assert_eq!(TimeOfDay::from_hour(14), TimeOfDay::TwoToFour);
        assert_eq!(TimeOfDay::from_hour(16), TimeOfDay::FourToSix);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::FourToSix);
        assert_eq!(TimeOfDay::from_hour(18), TimeOfDay::AfterSix);
        assert_eq!(TimeOfDay::from_hour(23), TimeOfDay::AfterSix);
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let trades = vec![
            trade("Reversal", "2024-01-05T10:00:00Z", dec!(10)),
            trade("Breakout", "2024-01-01T10:00:00Z", dec!(-5)),
            trade("Reversal", "2024-01-02T10:00:00Z", dec!(20)),
        ];

        let breakdown = group_by(&trades, |t| t.strategy.clone());

        let keys: Vec<&str> = breakdown.keys().collect();
        assert_eq!(keys, vec!["Reversal", "Breakout"]);
    }

    #[test]
    fn test_group_metrics() {
        let trades = vec![
            trade("Reversal", "2024-01-01T10:00:00Z", dec!(30)),
            trade("Reversal", "2024-01-02T10:00:00Z", dec!(-10)),
            trade("Reversal", "2024-01-03T10:00:00Z", dec!(40)),
            trade("Breakout", "2024-01-04T10:00:00Z", dec!(15)),
        ];

        let breakdown = group_by_dimension(&trades, Dimension::Strategy, Bucket::Day);
        let reversal = breakdown.get("Reversal").unwrap();

        assert_eq!(reversal.count, 3);
        assert_eq!(reversal.total_pnl, dec!(60));
        assert_eq!(reversal.average_pnl, dec!(20));
        assert_eq!(reversal.best_trade, dec!(40));
        assert_eq!(reversal.worst_trade, dec!(-10));
        assert!((reversal.win_rate - 66.666).abs() < 0.01);
        assert_eq!(reversal.profit_factor, ProfitFactor::Ratio(7.0));

        let breakout = breakdown.get("Breakout").unwrap();
        assert_eq!(breakout.profit_factor, ProfitFactor::Unbounded);
        assert!(breakdown.get("Scalp").is_none());
    }

    #[test]
    fn test_time_of_day_uses_local_hour() {
        let trades = vec![
            trade("A", "2024-01-01T08:59:00Z", dec!(1)),
            trade("A", "2024-01-01T09:00:00+00:00", dec!(1)),
            // 07:30 UTC, but 09:30 on the trader's clock.
            trade("A", "2024-01-01T09:30:00+02:00", dec!(1)),
            trade("A", "2024-01-01T18:00:00Z", dec!(1)),
        ];

        let breakdown = group_by_dimension(&trades, Dimension::TimeOfDay, Bucket::Day);

        let keys: Vec<&str> = breakdown.keys().collect();
        assert_eq!(keys, vec!["<9h", "9–10h", ">18h"]);
        assert_eq!(breakdown.get("9–10h").unwrap().count, 2);
    }

    #[test]
    fn test_weekday_month_and_direction_keys() {
        let mut short = trade("A", "2024-03-09T10:00:00Z", dec!(1));
        short.direction = Direction::Short;

        assert_eq!(dimension_key(Dimension::Weekday, &short), "Sat");
        assert_eq!(dimension_key(Dimension::Month, &short), "Mar 2024");
        assert_eq!(dimension_key(Dimension::Direction, &short), "short");
        assert_eq!(dimension_key(Dimension::Symbol, &short), "DAX");
    }

    #[test]
    fn test_grouping_is_idempotent() {
        let trades = vec![
            trade("A", "2024-01-01T10:00:00Z", dec!(5)),
            trade("B", "2024-01-01T11:00:00Z", dec!(-5)),
        ];
        let first = group_by_dimension(&trades, Dimension::Strategy, Bucket::Day);
        let second = group_by_dimension(&trades, Dimension::Strategy, Bucket::Day);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_trades_give_no_groups() {
        let breakdown = group_by_dimension(&[], Dimension::Symbol, Bucket::Day);
        assert!(breakdown.is_empty());
    }

    #[test]
    fn test_breakdown_serializes_in_insertion_order() {
        let trades = vec![
            trade("Zeta", "2024-01-01T10:00:00Z", dec!(1)),
            trade("Alpha", "2024-01-01T11:00:00Z", dec!(1)),
        ];
        let breakdown = group_by_dimension(&trades, Dimension::Strategy, Bucket::Day);
        let json = serde_json::to_string(&breakdown).unwrap();
        let zeta = json.find("\"Zeta\"").unwrap();
        let alpha = json.find("\"Alpha\"").unwrap();
        assert!(zeta < alpha);
    }

    #[test]
    fn test_group_metrics_carry_the_summary_shape() {
        let trades = vec![
            trade("Reversal", "2024-01-01T10:00:00Z", dec!(30)),
            trade("Breakout", "2024-01-01T11:00:00Z", dec!(5)),
            trade("Reversal", "2024-01-02T10:00:00Z", dec!(-10)),
            trade("Reversal", "2024-01-03T10:00:00Z", dec!(40)),
        ];

        let breakdown = group_by_dimension(&trades, Dimension::Strategy, Bucket::Day);
        let reversal = breakdown.get("Reversal").unwrap();

        assert_eq!(reversal.avg_win, dec!(35));
        assert_eq!(reversal.avg_loss, dec!(10));
        // Cumulative 30, 20, 60 on the group's own curve.
        assert_eq!(reversal.max_drawdown, dec!(10));
        let returns = [dec!(30), dec!(-10), dec!(40)];
        let mean = ratios::mean(&returns);
        assert_eq!(reversal.sharpe_ratio, mean / ratios::std_dev(&returns));
        assert_eq!(
            reversal.sortino_ratio,
            mean / ratios::downside_deviation(&returns)
        );

        let breakout = breakdown.get("Breakout").unwrap();
        assert_eq!(breakout.max_drawdown, Decimal::ZERO);
        assert_eq!(breakout.sharpe_ratio, 0.0);
        assert_eq!(breakout.avg_loss, Decimal::ZERO);
    }

    #[test]
    fn test_group_return_series_follow_the_bucket() {
        let trades = vec![
            trade("A", "2024-01-01T10:00:00Z", dec!(10)),
            trade("A", "2024-01-01T11:00:00Z", dec!(-4)),
        ];

        let daily = group_by_dimension(&trades, Dimension::Strategy, Bucket::Day);
        let per_trade = group_by_dimension(&trades, Dimension::Strategy, Bucket::Trade);

        assert_eq!(daily.get("A").unwrap().max_drawdown, Decimal::ZERO);
        assert_eq!(per_trade.get("A").unwrap().max_drawdown, dec!(4));
    }

    #[test]
    fn test_lookup_matches_iteration_order() {
        let trades = vec![
            trade("B", "2024-01-01T10:00:00Z", dec!(1)),
            trade("A", "2024-01-01T11:00:00Z", dec!(2)),
            trade("B", "2024-01-01T12:00:00Z", dec!(3)),
        ];

        let breakdown = group_by(&trades, |t| t.strategy.clone());

        for (key, metrics) in breakdown.iter() {
            assert_eq!(breakdown.get(key), Some(metrics));
        }
        assert_eq!(breakdown.get("B").unwrap().total_pnl, dec!(4));
    }
}
