use chrono::NaiveDate;
use thiserror::Error;
use ticker_model::{NormalizeError, UpstreamError};

/// Every way a snapshot request can fail. None of them are retried here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TickerError {
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] UpstreamError),

    #[error("invalid timezone location: '{name}'")]
    InvalidTimezone { name: String },
    #[error("error parsing date string: '{value}'")]
    InvalidDateFormat { value: String },
    #[error("time series holds more than one entry for {date}")]
    DuplicateDate { date: NaiveDate },

    #[error("failed to parse close price as decimal: '{value}': {reason}")]
    PriceParseError { value: String, reason: String },

    #[error("insufficient data: window needs {required} entries, upstream returned {available}")]
    InsufficientData { required: usize, available: usize },
}

impl From<NormalizeError> for TickerError {
    fn from(err: NormalizeError) -> TickerError {
        match err {
            NormalizeError::InvalidTimezone { name } => TickerError::InvalidTimezone { name },
            NormalizeError::InvalidDateFormat { value } => TickerError::InvalidDateFormat { value },
            NormalizeError::DuplicateDate { date } => TickerError::DuplicateDate { date },
        }
    }
}
