use crate::enums::Direction;
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// The category used for trades that carry no strategy label.
pub const UNDEFINED_STRATEGY: &str = "Non définie";

/// The symbol used for trades that carry no instrument identifier.
pub const UNKNOWN_SYMBOL: &str = "N/A";

/// A numeric field as it arrives from the trade source.
///
/// The source stores numbers loosely: JSON numbers, numeric strings, or junk text.
/// Anything else (booleans, arrays, objects) lands in `Other` and reads as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Value(Decimal),
    Text(String),
    Other(Value),
}

impl RawNumber {
    /// Returns the decimal value, or `None` when the text is not a number.
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            RawNumber::Value(value) => Some(*value),
            RawNumber::Text(text) => {
                let text = text.trim();
                Decimal::from_str(text)
                    .or_else(|_| Decimal::from_scientific(text))
                    .ok()
            }
            RawNumber::Other(_) => None,
        }
    }
}

impl From<Decimal> for RawNumber {
    fn from(value: Decimal) -> Self {
        RawNumber::Value(value)
    }
}

/// A timestamp as it arrives from the trade source: epoch milliseconds or a date string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Millis(i64),
    /// Epoch milliseconds written as a float, e.g. `1704103200000.0`.
    Float(f64),
    Text(String),
    /// Not a timestamp shape at all; the record is skipped as invalid.
    Other(Value),
}

/// A trade record exactly as supplied by the trade source, before any validation.
///
/// Every field is optional; the normalizer decides what to default and what to drop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTrade {
    #[serde(deserialize_with = "loose_text")]
    pub id: Option<String>,
    #[serde(alias = "date", alias = "entryDate", alias = "entry_date")]
    pub timestamp: Option<RawTimestamp>,
    #[serde(alias = "instrument", alias = "pair", deserialize_with = "loose_text")]
    pub symbol: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub strategy: Option<String>,
    #[serde(alias = "side", alias = "type", deserialize_with = "loose_text")]
    pub direction: Option<String>,
    #[serde(alias = "entry_price")]
    pub entry_price: Option<RawNumber>,
    #[serde(alias = "exit_price")]
    pub exit_price: Option<RawNumber>,
    #[serde(alias = "quantity", alias = "positionSize", alias = "position_size")]
    pub size: Option<RawNumber>,
    pub fees: Option<RawNumber>,
    #[serde(alias = "profit", alias = "profitLoss", alias = "profit_loss")]
    pub pnl: Option<RawNumber>,
}

/// Reads a string or a number as text. Other JSON values read as absent.
fn loose_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

/// A validated trade, the unit of input of every analytics computation.
///
/// Produced only by the normalizer: the timestamp is always valid and the P&L always numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    /// Entry time, expressed in the reporting offset.
    pub timestamp: DateTime<FixedOffset>,
    pub symbol: String,
    pub strategy: String,
    pub direction: Direction,
    pub entry_price: Option<Decimal>,
    pub exit_price: Option<Decimal>,
    pub size: Decimal,
    pub fees: Decimal,
    pub pnl: Decimal,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.pnl > Decimal::ZERO
    }

    pub fn is_loss(&self) -> bool {
        self.pnl < Decimal::ZERO
    }
}
