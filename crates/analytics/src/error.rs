use thiserror::Error;

/// Why a raw trade record was dropped by the normalizer.
///
/// These never abort a computation; they're collected alongside the surviving trades.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Trade record has no timestamp")]
    MissingTimestamp,

    #[error("Trade timestamp could not be parsed: '{0}'")]
    InvalidTimestamp(String),
}
