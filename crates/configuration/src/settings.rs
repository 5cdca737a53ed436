use crate::error::ConfigError;
use core_types::ReportConfig;
use serde::Deserialize;

const MAX_OFFSET_MINUTES: i32 = 14 * 60;
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default tracing filter when `RUST_LOG` is not set.
    pub log_level: String,
    /// Which periods and breakdowns the report is computed for.
    pub report: ReportConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            report: ReportConfig::default(),
        }
    }
}

impl Settings {
    /// Checks ranges and removes repeated dimensions, keeping the first occurrence.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        let offset = self.report.utc_offset_minutes;
        if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&offset) {
            return Err(ConfigError::OffsetOutOfRange(offset));
        }

        self.log_level = self.log_level.trim().to_ascii_lowercase();
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log_level));
        }

        let mut seen = Vec::with_capacity(self.report.dimensions.len());
        self.report.dimensions.retain(|d| {
            if seen.contains(d) {
                false
            } else {
                seen.push(*d);
                true
            }
        });

        Ok(self)
    }
}
