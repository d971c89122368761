use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Layout used for `last_refreshed`, e.g. `Mon Jan  2 15:04:05 2006`.
const REFRESHED_AT_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// One calendar day as delivered by the upstream provider.
///
/// Prices are kept as the exact text upstream sent so no precision is lost
/// before they are parsed as decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDailyEntry {
    #[serde(rename(deserialize = "1. open", serialize = "open"))]
    pub open: String,
    #[serde(rename(deserialize = "2. high", serialize = "high"))]
    pub high: String,
    #[serde(rename(deserialize = "3. low", serialize = "low"))]
    pub low: String,
    #[serde(rename(deserialize = "4. close", serialize = "close"))]
    pub close: String,
    #[serde(
        default,
        rename(deserialize = "5. adjusted close", serialize = "adjusted_close"),
        skip_serializing_if = "Option::is_none"
    )]
    pub adjusted_close: Option<String>,
    #[serde(
        rename(deserialize = "6. volume", serialize = "volume"),
        deserialize_with = "deserialize_volume"
    )]
    pub volume: u64,
    #[serde(
        default,
        rename(deserialize = "7. dividend amount", serialize = "dividend_amount"),
        skip_serializing_if = "Option::is_none"
    )]
    pub dividend_amount: Option<String>,
    #[serde(
        default,
        rename(deserialize = "8. split coefficient", serialize = "split_coefficient"),
        skip_serializing_if = "Option::is_none"
    )]
    pub split_coefficient: Option<String>,
}

// upstream sends "6. volume" as a string, accept a bare number too
fn deserialize_volume<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Volume {
        Number(u64),
        Text(String),
    }

    match Volume::deserialize(deserializer)? {
        Volume::Number(n) => Ok(n),
        Volume::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid volume: '{}'", s))),
    }
}

/// A [`RawDailyEntry`] with its key resolved to a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatedEntry {
    pub date: NaiveDate,
    #[serde(serialize_with = "serialize_tz")]
    pub timezone: Tz,
    #[serde(flatten)]
    pub raw: RawDailyEntry,
}

impl DatedEntry {
    pub fn close(&self) -> &str {
        &self.raw.close
    }
}

fn serialize_tz<S: Serializer>(tz: &Tz, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(tz.name())
}

/// Entries ordered newest first, one per calendar date.
///
/// Only [`crate::normalize`] builds a `TimeSeries`, so the ordering is always
/// derived locally and never taken from upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeSeries(Vec<DatedEntry>);

impl TimeSeries {
    pub(crate) fn from_sorted(entries: Vec<DatedEntry>) -> Self {
        TimeSeries(entries)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The `n` most recent entries, or `None` when the series is shorter than `n`.
    pub fn newest(&self, n: usize) -> Option<&[DatedEntry]> {
        self.0.get(..n)
    }
}

/// The derived result served to clients.
///
/// Built once per successful refresh and shared behind an `Arc`, it is
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickerSnapshot {
    #[serde(rename = "last_refreshed", serialize_with = "serialize_refreshed_at")]
    pub refreshed_at: DateTime<Utc>,
    #[serde(rename = "days")]
    pub window_size: usize,
    pub symbol: String,
    #[serde(rename = "average_closing_price")]
    pub average_close: Decimal,
    #[serde(rename = "stock_time_series")]
    pub entries: Vec<DatedEntry>,
}

fn serialize_refreshed_at<S: Serializer>(
    refreshed_at: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&refreshed_at.format(REFRESHED_AT_FORMAT))
}
