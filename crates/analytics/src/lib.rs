//! # Tradebook Analytics Engine
//!
//! Turns a list of trade records into cumulative-return curves, drawdown series,
//! risk ratios, win/loss statistics and categorical breakdowns.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of where trades
//!   come from or how reports are displayed. It depends only on `core-types` (Layer 0).
//! - **Total Functions:** Every computation accepts any input, including the empty list,
//!   and degrades to zero/empty values instead of failing. Bad records are dropped by the
//!   normalizer and reported, never raised.
//! - **Stateless:** No module-level state; every call is independent and re-entrant.
//!
//! ## Pipeline
//!
//! `normalizer` → `series` → `drawdown` → `ratios` → `grouping`, composed by `engine`
//! into a `MetricsReport`.

pub mod drawdown;
pub mod engine;
pub mod error;
pub mod grouping;
pub mod normalizer;
pub mod ratios;
pub mod report;
pub mod series;

// Re-export the key components to create a clean, public-facing API.
pub use drawdown::{DrawdownPoint, DrawdownSeries, compute_drawdown};
pub use engine::{AnalyticsEngine, assemble, assemble_raw, reporting_offset};
pub use error::NormalizeError;
pub use grouping::{
    CategoryBreakdown, GroupMetrics, TimeOfDay, dimension_key, group_by, group_by_bucketed,
    group_by_dimension,
};
pub use normalizer::{NormalizedTrades, SkippedTrade, normalize, normalize_with_offset};
pub use ratios::{
    ProfitFactor, RatioMetrics, compute_ratios, downside_deviation, mean, std_dev,
};
pub use report::{DimensionBreakdown, MetricsReport};
pub use series::{ReturnPoint, build_return_series, chronological, period_returns};
