//! Freshness-bounded cache of the rolling closing-price average for one ticker.

mod cache;
mod clock;
mod error;
mod store;

pub use cache::{
    CacheSettings, DEFAULT_FRESHNESS, DEFAULT_UPSTREAM_TIMEOUT, StalePolicy, StockTickerCache,
    average_close,
};
pub use clock::{Clock, SystemClock};
pub use error::TickerError;
pub use store::{RefreshGate, RefreshOutcome, SnapshotStore};
