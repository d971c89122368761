use chrono::NaiveDate;
use chrono_tz::Tz;
use thiserror::Error;

use crate::{DatedEntry, RawDailyEntry, TimeSeries};

/// Layout of the date keys in the upstream series.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("invalid timezone location: '{name}'")]
    InvalidTimezone { name: String },
    #[error("error parsing date string: '{value}', expected YYYY-MM-DD")]
    InvalidDateFormat { value: String },
    #[error("time series holds more than one entry for {date}")]
    DuplicateDate { date: NaiveDate },
}

/// Resolve every date key of an upstream series and order the entries newest first.
///
/// All keys are anchored to the same `timezone`, which comes from the
/// response metadata. Any bad key fails the whole call.
pub fn normalize<I>(series: I, timezone: &str) -> Result<TimeSeries, NormalizeError>
where
    I: IntoIterator<Item = (String, RawDailyEntry)>,
{
    let tz: Tz = timezone
        .parse()
        .map_err(|_| NormalizeError::InvalidTimezone {
            name: timezone.to_string(),
        })?;

    let series = series.into_iter();
    let mut entries = Vec::with_capacity(series.size_hint().0);
    for (key, raw) in series {
        let date = parse_date(&key)?;
        entries.push(DatedEntry {
            date,
            timezone: tz,
            raw,
        });
    }

    entries.sort_unstable_by(|a, b| b.date.cmp(&a.date));

    if let Some(pair) = entries.windows(2).find(|pair| pair[0].date == pair[1].date) {
        return Err(NormalizeError::DuplicateDate { date: pair[0].date });
    }

    Ok(TimeSeries::from_sorted(entries))
}

// chrono accepts unpadded fields, so insist on the canonical 10-char form
// to keep one key per calendar date
fn parse_date(key: &str) -> Result<NaiveDate, NormalizeError> {
    let invalid = || NormalizeError::InvalidDateFormat {
        value: key.to_string(),
    };

    if key.len() != 10 {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(key, DATE_FORMAT).map_err(|_| invalid())
}
