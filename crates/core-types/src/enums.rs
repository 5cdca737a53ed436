use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = CoreError;

    /// Accepts both position vocabulary (`long`/`short`) and order vocabulary (`buy`/`sell`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" | "buy" => Ok(Direction::Long),
            "short" | "sell" => Ok(Direction::Short),
            other => Err(CoreError::InvalidInput("direction".into(), other.into())),
        }
    }
}

/// The aggregation period of a return series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    /// One point per trade.
    Trade,
    #[default]
    Day,
    /// ISO week, starting Monday.
    Week,
    Month,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Trade => "trade",
            Bucket::Day => "day",
            Bucket::Week => "week",
            Bucket::Month => "month",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trade" | "trades" => Ok(Bucket::Trade),
            "day" | "daily" => Ok(Bucket::Day),
            "week" | "weekly" => Ok(Bucket::Week),
            "month" | "monthly" => Ok(Bucket::Month),
            other => Err(CoreError::InvalidInput("bucket".into(), other.into())),
        }
    }
}

/// A categorical axis along which trades can be grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Strategy,
    Symbol,
    Direction,
    /// Local hour of the trade, in the fixed intraday ranges.
    TimeOfDay,
    Weekday,
    Month,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::Strategy,
        Dimension::Symbol,
        Dimension::Direction,
        Dimension::TimeOfDay,
        Dimension::Weekday,
        Dimension::Month,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Strategy => "strategy",
            Dimension::Symbol => "symbol",
            Dimension::Direction => "direction",
            Dimension::TimeOfDay => "time_of_day",
            Dimension::Weekday => "weekday",
            Dimension::Month => "month",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "strategy" => Ok(Dimension::Strategy),
            "symbol" | "instrument" => Ok(Dimension::Symbol),
            "direction" | "side" => Ok(Dimension::Direction),
            "time_of_day" | "hour" => Ok(Dimension::TimeOfDay),
            "weekday" | "day_of_week" => Ok(Dimension::Weekday),
            "month" => Ok(Dimension::Month),
            other => Err(CoreError::InvalidInput("dimension".into(), other.into())),
        }
    }
}
