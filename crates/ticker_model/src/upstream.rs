use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::RawDailyEntry;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Metadata {
    #[serde(rename = "1. Information", default)]
    pub information: String,
    #[serde(rename = "2. Symbol", default)]
    pub symbol: String,
    #[serde(rename = "3. Last Refreshed", default)]
    pub last_refreshed: String,
    #[serde(rename = "4. Output Size", default)]
    pub output_size: String,
    #[serde(rename = "5. Time Zone")]
    pub timezone: String,
}

/// Body of a `TIME_SERIES_DAILY_ADJUSTED` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DailyAdjustedResponse {
    #[serde(rename = "Meta Data")]
    pub metadata: Metadata,
    #[serde(rename = "Time Series (Daily)")]
    pub series: HashMap<String, RawDailyEntry>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct UpstreamError {
    reason: String,
}

impl UpstreamError {
    pub fn new(reason: impl Into<String>) -> Self {
        UpstreamError {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Source of raw daily price history for a symbol.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn fetch_daily_adjusted(&self, symbol: &str)
    -> Result<DailyAdjustedResponse, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_provider_payload() {
        let body = r#"{
            "Meta Data": {
                "1. Information": "Daily Time Series with Splits and Dividend Events",
                "2. Symbol": "IBM",
                "3. Last Refreshed": "2024-01-05",
                "4. Output Size": "Compact",
                "5. Time Zone": "US/Eastern"
            },
            "Time Series (Daily)": {
                "2024-01-05": {
                    "1. open": "160.0000", "2. high": "161.2000", "3. low": "159.5000",
                    "4. close": "160.8600", "5. adjusted close": "160.8600",
                    "6. volume": "3895036", "7. dividend amount": "0.0000",
                    "8. split coefficient": "1.0"
                },
                "2024-01-04": {
                    "1. open": "161.0000", "2. high": "161.9000", "3. low": "160.0000",
                    "4. close": "161.1300", "5. adjusted close": "161.1300",
                    "6. volume": "4123000", "7. dividend amount": "0.0000",
                    "8. split coefficient": "1.0"
                }
            }
        }"#;

        let response: DailyAdjustedResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.metadata.symbol, "IBM");
        assert_eq!(response.metadata.timezone, "US/Eastern");
        assert_eq!(response.series.len(), 2);
        assert_eq!(response.series["2024-01-04"].close, "161.1300");
    }

    #[test]
    fn missing_timezone_is_a_decode_error() {
        let body = r#"{"Meta Data": {"2. Symbol": "IBM"}, "Time Series (Daily)": {}}"#;
        assert!(serde_json::from_str::<DailyAdjustedResponse>(body).is_err());
    }
}
