use crate::error::NormalizeError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use core_types::{
    Direction, RawNumber, RawTimestamp, RawTrade, Trade, UNDEFINED_STRATEGY, UNKNOWN_SYMBOL,
};
use rust_decimal::Decimal;
use serde::Serialize;

const NAIVE_DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
];

const NAIVE_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// A raw record that did not survive normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedTrade {
    /// Position of the record in the input list.
    pub index: usize,
    pub id: Option<String>,
    #[serde(serialize_with = "serialize_reason")]
    pub reason: NormalizeError,
}

fn serialize_reason<S: serde::Serializer>(
    reason: &NormalizeError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(reason)
}

/// The output of the normalizer: valid trades in input order, plus what was dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedTrades {
    pub trades: Vec<Trade>,
    pub skipped: Vec<SkippedTrade>,
}

/// Normalizes raw records with timestamps expressed in UTC.
pub fn normalize(raw_trades: &[RawTrade]) -> NormalizedTrades {
    normalize_with_offset(raw_trades, Utc.fix())
}

/// Validates and defaults raw trade records.
///
/// Records without a parseable timestamp are skipped. Naive timestamps are read as local
/// time in `offset`, and every timestamp is converted into `offset`. Input order is preserved.
pub fn normalize_with_offset(raw_trades: &[RawTrade], offset: FixedOffset) -> NormalizedTrades {
    let mut normalized = NormalizedTrades {
        trades: Vec::with_capacity(raw_trades.len()),
        skipped: Vec::new(),
    };

    for (index, raw) in raw_trades.iter().enumerate() {
        match normalize_one(index, raw, offset) {
            Ok(trade) => normalized.trades.push(trade),
            Err(reason) => {
                tracing::warn!(index, id = ?raw.id, %reason, "Skipping trade record.");
                normalized.skipped.push(SkippedTrade {
                    index,
                    id: raw.id.clone(),
                    reason,
                });
            }
        }
    }

    tracing::debug!(
        kept = normalized.trades.len(),
        skipped = normalized.skipped.len(),
        "Normalized trade records."
    );
    normalized
}

fn normalize_one(
    index: usize,
    raw: &RawTrade,
    offset: FixedOffset,
) -> Result<Trade, NormalizeError> {
    let timestamp = match &raw.timestamp {
        Some(ts) => parse_timestamp(ts, offset)?,
        None => return Err(NormalizeError::MissingTimestamp),
    };

    let direction = raw
        .direction
        .as_deref()
        .and_then(|d| d.parse::<Direction>().ok())
        .unwrap_or_default();

    let entry_price = decimal(&raw.entry_price);
    let exit_price = decimal(&raw.exit_price);
    let raw_size = decimal(&raw.size);
    let fees = decimal(&raw.fees).unwrap_or(Decimal::ZERO);

    let pnl = match decimal(&raw.pnl) {
        Some(pnl) => pnl,
        None => derive_pnl(direction, entry_price, exit_price, raw_size, fees),
    };

    Ok(Trade {
        id: non_empty(&raw.id).unwrap_or_else(|| format!("#{index}")),
        timestamp,
        symbol: non_empty(&raw.symbol).unwrap_or_else(|| UNKNOWN_SYMBOL.to_string()),
        strategy: non_empty(&raw.strategy).unwrap_or_else(|| UNDEFINED_STRATEGY.to_string()),
        direction,
        entry_price,
        exit_price,
        size: raw_size.unwrap_or(Decimal::ZERO),
        fees,
        pnl,
    })
}

/// Realized P&L from prices: `(exit - entry) * size - fees`, with the price move inverted for shorts.
///
/// Fees are a cost on either side. Without both prices and a size the P&L is zero, and so
/// it is when the arithmetic overflows.
fn derive_pnl(
    direction: Direction,
    entry_price: Option<Decimal>,
    exit_price: Option<Decimal>,
    size: Option<Decimal>,
    fees: Decimal,
) -> Decimal {
    let (Some(entry), Some(exit), Some(size)) = (entry_price, exit_price, size) else {
        return Decimal::ZERO;
    };
    let price_move = match direction {
        Direction::Long => exit.checked_sub(entry),
        Direction::Short => entry.checked_sub(exit),
    };
    price_move
        .and_then(|m| m.checked_mul(size))
        .and_then(|gross| gross.checked_sub(fees))
        .unwrap_or(Decimal::ZERO)
}

fn parse_timestamp(
    raw: &RawTimestamp,
    offset: FixedOffset,
) -> Result<DateTime<FixedOffset>, NormalizeError> {
    match raw {
        RawTimestamp::Millis(ms) => from_millis(*ms, offset)
            .ok_or_else(|| NormalizeError::InvalidTimestamp(ms.to_string())),
        RawTimestamp::Float(ms) => float_millis(*ms)
            .and_then(|ms| from_millis(ms, offset))
            .ok_or_else(|| NormalizeError::InvalidTimestamp(ms.to_string())),
        RawTimestamp::Other(value) => Err(NormalizeError::InvalidTimestamp(value.to_string())),
        RawTimestamp::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(NormalizeError::MissingTimestamp);
            }
            parse_text_timestamp(text, offset)
                .ok_or_else(|| NormalizeError::InvalidTimestamp(text.to_string()))
        }
    }
}

fn parse_text_timestamp(text: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&offset));
    }
    if let Ok(ms) = text.parse::<i64>() {
        return from_millis(ms, offset);
    }
    let naive = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NAIVE_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    naive.and_local_timezone(offset).single()
}

fn from_millis(ms: i64, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(|ts| ts.with_timezone(&offset))
}

/// Fractional milliseconds are truncated.
fn float_millis(ms: f64) -> Option<i64> {
    (ms.is_finite() && ms.abs() < i64::MAX as f64).then(|| ms.trunc() as i64)
}

fn decimal(raw: &Option<RawNumber>) -> Option<Decimal> {
    raw.as_ref().and_then(RawNumber::to_decimal)
}

fn non_empty(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
