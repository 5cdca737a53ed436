//! # Tradebook Core Types
//!
//! The shared vocabulary of the workspace: raw and validated trade records, the
//! period and dimension enums, and the options that drive a metrics report.
//!
//! As a Layer 0 crate it has no knowledge of how trades are fetched or displayed.

pub mod enums;
pub mod error;
pub mod report_config;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{Bucket, Dimension, Direction};
pub use error::CoreError;
pub use report_config::ReportConfig;
pub use structs::{RawNumber, RawTimestamp, RawTrade, Trade, UNDEFINED_STRATEGY, UNKNOWN_SYMBOL};
