use crate::error::ConfigError;
use crate::settings::Settings;
use clap::Args;
use core_types::{Bucket, Dimension};
use rust_decimal::Decimal;

/// Command-line flags that take precedence over the file and environment layers.
#[derive(Debug, Clone, Default, Args)]
pub struct ReportOverrides {
    /// Aggregation period of the return series: trade, day, week or month.
    #[arg(long)]
    pub bucket: Option<Bucket>,

    /// Breakdown dimensions, comma-separated (strategy, symbol, direction, time_of_day, weekday, month).
    #[arg(long = "group-by", value_delimiter = ',')]
    pub dimensions: Vec<Dimension>,

    /// Starting balance added once to the cumulative curve.
    #[arg(long)]
    pub initial_balance: Option<Decimal>,

    /// Local time offset from UTC, in minutes.
    #[arg(long, allow_negative_numbers = true)]
    pub utc_offset: Option<i32>,

    /// Default log level when RUST_LOG is not set.
    #[arg(long)]
    pub log_level: Option<String>,
}

impl ReportOverrides {
    /// Applies every flag that was given, then re-validates.
    pub fn apply(self, mut settings: Settings) -> Result<Settings, ConfigError> {
        if let Some(bucket) = self.bucket {
            settings.report.bucket = bucket;
        }
        if !self.dimensions.is_empty() {
            settings.report.dimensions = self.dimensions;
        }
        if let Some(balance) = self.initial_balance {
            settings.report.initial_balance = Some(balance);
        }
        if let Some(offset) = self.utc_offset {
            settings.report.utc_offset_minutes = offset;
        }
        if let Some(level) = self.log_level {
            settings.log_level = level;
        }
        settings.validate()
    }
}
