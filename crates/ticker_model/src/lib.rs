//! Daily price history types shared by the upstream client and the ticker cache.

mod entry;
mod normalize;
mod upstream;

pub use entry::{DatedEntry, RawDailyEntry, TickerSnapshot, TimeSeries};
pub use normalize::{DATE_FORMAT, NormalizeError, normalize};
pub use upstream::{DailyAdjustedResponse, Metadata, UpstreamClient, UpstreamError};
