use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rust_decimal::{Decimal, RoundingStrategy};
use ticker_model::{
    DatedEntry, TickerSnapshot, TimeSeries, UpstreamClient, UpstreamError, normalize,
};

use crate::clock::{Clock, SystemClock};
use crate::error::TickerError;
use crate::store::{RefreshOutcome, SnapshotStore};

/// Maximum age of a snapshot that is served without asking upstream again.
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(600);
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

const AVERAGE_DECIMAL_PLACES: u32 = 2;

/// What to answer when a refresh fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalePolicy {
    /// Surface the error; the previous snapshot stays cached but is not served.
    #[default]
    Fail,
    /// Serve the last good snapshot if there is one.
    ServeStale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub symbol: String,
    pub window_size: NonZeroUsize,
    pub freshness: Duration,
    pub upstream_timeout: Duration,
    pub stale_policy: StalePolicy,
}

impl CacheSettings {
    pub fn new(symbol: impl Into<String>, window_size: NonZeroUsize) -> Self {
        CacheSettings {
            symbol: symbol.into(),
            window_size,
            freshness: DEFAULT_FRESHNESS,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            stale_policy: StalePolicy::default(),
        }
    }

    pub fn with_freshness(mut self, freshness: Duration) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn with_upstream_timeout(mut self, upstream_timeout: Duration) -> Self {
        self.upstream_timeout = upstream_timeout;
        self
    }

    pub fn with_stale_policy(mut self, stale_policy: StalePolicy) -> Self {
        self.stale_policy = stale_policy;
        self
    }
}

/// Serves the rolling average snapshot for the configured symbol, going
/// upstream only when the cached one is missing or older than the freshness window.
pub struct StockTickerCache {
    settings: CacheSettings,
    upstream: Arc<dyn UpstreamClient>,
    clock: Arc<dyn Clock>,
    store: SnapshotStore,
}

impl StockTickerCache {
    pub fn new(settings: CacheSettings, upstream: Arc<dyn UpstreamClient>) -> Self {
        Self::with_clock(settings, upstream, Arc::new(SystemClock))
    }

    pub fn with_clock(
        settings: CacheSettings,
        upstream: Arc<dyn UpstreamClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        StockTickerCache {
            settings,
            upstream,
            clock,
            store: SnapshotStore::new(),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// The stored snapshot regardless of its age. Never goes upstream.
    pub async fn cached_snapshot(&self) -> Option<Arc<TickerSnapshot>> {
        self.store.get(&self.settings.symbol).await
    }

    /// Current snapshot, refreshed from upstream when missing or expired.
    ///
    /// Concurrent callers that all miss wait on one refresh. A failed refresh
    /// never touches the stored snapshot.
    pub async fn get_snapshot(&self) -> Result<Arc<TickerSnapshot>, TickerError> {
        let symbol = &self.settings.symbol;

        if let Some(snapshot) = self.fresh_snapshot().await {
            debug!("get_snapshot | cache hit | symbol: {}", symbol);
            return Ok(snapshot);
        }

        let gate = self.store.refresh_gate(symbol).await;
        let seen = gate.generation();
        let mut last = gate.lock().await;

        // a refresh finished while we queued, share its result whether it failed or not
        if let Some(outcome) = gate.finished_since(seen, &last) {
            debug!("get_snapshot | refreshed while waiting | symbol: {}", symbol);
            return self.settle(outcome).await;
        }

        // it may also have finished between our miss and reading the generation
        if let Some(snapshot) = self.fresh_snapshot().await {
            debug!("get_snapshot | refreshed before queueing | symbol: {}", symbol);
            return Ok(snapshot);
        }

        debug!("get_snapshot | cache miss | symbol: {}", symbol);

        let outcome = self.refresh().await;
        gate.finish(&mut last, outcome.clone());
        drop(last);

        self.settle(outcome).await
    }

    async fn settle(&self, outcome: RefreshOutcome) -> RefreshOutcome {
        let err = match outcome {
            Ok(snapshot) => return Ok(snapshot),
            Err(err) => err,
        };

        if self.settings.stale_policy == StalePolicy::ServeStale {
            if let Some(stale) = self.cached_snapshot().await {
                warn!(
                    "get_snapshot | refresh failed, serving stale snapshot from {} | symbol: {} | error: {}",
                    stale.refreshed_at, self.settings.symbol, err
                );
                return Ok(stale);
            }
        }
        Err(err)
    }

    async fn fresh_snapshot(&self) -> Option<Arc<TickerSnapshot>> {
        let snapshot = self.cached_snapshot().await?;
        let age = self.clock.now().signed_duration_since(snapshot.refreshed_at);
        // a negative age (clock stepped back) still counts as fresh
        let fresh = match age.to_std() {
            Ok(age) => age < self.settings.freshness,
            Err(_) => true,
        };
        fresh.then_some(snapshot)
    }

    async fn refresh(&self) -> Result<Arc<TickerSnapshot>, TickerError> {
        let symbol = &self.settings.symbol;
        let timeout = self.settings.upstream_timeout;

        let response = tokio::time::timeout(timeout, self.upstream.fetch_daily_adjusted(symbol))
            .await
            .map_err(|_| {
                UpstreamError::new(format!(
                    "request for {} timed out after {}s",
                    symbol,
                    timeout.as_secs_f64()
                ))
            })??;

        let series = normalize(response.series, &response.metadata.timezone)?;
        let snapshot = Arc::new(build_snapshot(
            symbol,
            self.settings.window_size,
            &series,
            self.clock.now(),
        )?);

        self.store.replace(snapshot.clone()).await;
        info!(
            "refresh | symbol: {} | days: {} | average_close: {}",
            symbol, snapshot.window_size, snapshot.average_close
        );

        Ok(snapshot)
    }
}

fn build_snapshot(
    symbol: &str,
    window_size: NonZeroUsize,
    series: &TimeSeries,
    refreshed_at: DateTime<Utc>,
) -> Result<TickerSnapshot, TickerError> {
    let window = series
        .newest(window_size.get())
        .ok_or(TickerError::InsufficientData {
            required: window_size.get(),
            available: series.len(),
        })?;

    Ok(TickerSnapshot {
        refreshed_at,
        window_size: window_size.get(),
        symbol: symbol.to_string(),
        average_close: average_close(window)?,
        entries: window.to_vec(),
    })
}

/// Mean close price of `entries`, rounded half away from zero to two places.
///
/// Prices are parsed as exact decimals. The result always carries a scale of
/// two, so a mean of `4` is reported as `4.00`.
pub fn average_close(entries: &[DatedEntry]) -> Result<Decimal, TickerError> {
    let count = Decimal::from(entries.len());
    if count.is_zero() {
        return Err(TickerError::InsufficientData {
            required: 1,
            available: 0,
        });
    }

    let mut total = Decimal::ZERO;
    for entry in entries {
        let close = Decimal::from_str(entry.close()).map_err(|e| TickerError::PriceParseError {
            value: entry.close().to_string(),
            reason: e.to_string(),
        })?;
        total = total
            .checked_add(close)
            .ok_or_else(|| TickerError::PriceParseError {
                value: entry.close().to_string(),
                reason: "sum of close prices overflows".to_string(),
            })?;
    }

    let mut average = (total / count)
        .round_dp_with_strategy(AVERAGE_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    average.rescale(AVERAGE_DECIMAL_PLACES);
    Ok(average)
}
