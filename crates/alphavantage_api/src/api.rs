use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use ticker_model::{DailyAdjustedResponse, UpstreamClient, UpstreamError};

const ALPHAVANTAGE_BASE_API_URL: &str = "https://www.alphavantage.co";
const TIME_SERIES_FUNCTION: &str = "TIME_SERIES_DAILY_ADJUSTED";
const SERIES_KEY: &str = "Time Series (Daily)";
// alphavantage answers 200 with one of these instead of data when it refuses a request
const NOTICE_KEYS: [&str; 3] = ["Error Message", "Note", "Information"];

pub struct AlphaVantageAPI {
    base_url: String,
    api_key: String,
    timeout: Duration,
    client: reqwest::Client,
    headers: HeaderMap,
}

impl AlphaVantageAPI {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("stock_ticker/", env!("CARGO_PKG_VERSION"))),
        );

        AlphaVantageAPI {
            base_url: ALPHAVANTAGE_BASE_API_URL.to_string(),
            api_key: api_key.into(),
            timeout,
            client: reqwest::Client::new(),
            headers,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn query_url(&self) -> String {
        format!("{}/query", self.base_url)
    }

    pub async fn get_daily_adjusted(
        &self,
        symbol: &str,
    ) -> Result<DailyAdjustedResponse, UpstreamError> {
        debug!(
            "get_daily_adjusted | url: {}?function={}&symbol={}&apikey=<redacted>",
            self.query_url(),
            TIME_SERIES_FUNCTION,
            symbol
        );

        let response = self
            .client
            .get(self.query_url())
            .headers(self.headers.clone())
            .query(&[
                ("function", TIME_SERIES_FUNCTION),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                UpstreamError::new(format!(
                    "failed to complete request to alphavantage API: {}",
                    e.without_url()
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::new(format!(
                "alphavantage returned status {}",
                status
            )));
        }

        let body = response.text().await.map_err(|e| {
            UpstreamError::new(format!("failed to read alphavantage response: {}", e.without_url()))
        })?;

        debug!("get_daily_adjusted | received {} bytes", body.len());

        decode_body(&body)
    }
}

#[async_trait]
impl UpstreamClient for AlphaVantageAPI {
    async fn fetch_daily_adjusted(
        &self,
        symbol: &str,
    ) -> Result<DailyAdjustedResponse, UpstreamError> {
        self.get_daily_adjusted(symbol).await
    }
}

fn decode_body(body: &str) -> Result<DailyAdjustedResponse, UpstreamError> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| UpstreamError::new(format!("failed to decode response: {}", e)))?;

    if json.get(SERIES_KEY).is_none() {
        let notice = NOTICE_KEYS
            .iter()
            .find_map(|key| json.get(*key).and_then(Value::as_str));
        return Err(match notice {
            Some(message) => {
                UpstreamError::new(format!("alphavantage refused request: {}", message))
            }
            None => UpstreamError::new(format!("response has no '{}' field", SERIES_KEY)),
        });
    }

    serde_json::from_value(json)
        .map_err(|e| UpstreamError::new(format!("failed to decode response: {}", e)))
}
