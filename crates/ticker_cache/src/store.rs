use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ticker_model::TickerSnapshot;
use tokio::sync::{Mutex, MutexGuard, RwLock};

use crate::error::TickerError;

pub type RefreshOutcome = Result<Arc<TickerSnapshot>, TickerError>;

/// Serializes refreshes of one symbol.
///
/// Every finished refresh bumps the generation and leaves its outcome behind,
/// so callers that queued while it ran can take that outcome instead of going
/// upstream again. A refresh whose future is dropped finishes nothing and
/// leaves the generation alone.
#[derive(Debug, Default)]
pub struct RefreshGate {
    generation: AtomicU64,
    last: Mutex<Option<RefreshOutcome>>,
}

impl RefreshGate {
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub async fn lock(&self) -> MutexGuard<'_, Option<RefreshOutcome>> {
        self.last.lock().await
    }

    /// The outcome of the latest refresh, if one finished after `seen` was read.
    pub fn finished_since(
        &self,
        seen: u64,
        last: &MutexGuard<'_, Option<RefreshOutcome>>,
    ) -> Option<RefreshOutcome> {
        if self.generation() == seen {
            return None;
        }
        (**last).clone()
    }

    pub fn finish(
        &self,
        last: &mut MutexGuard<'_, Option<RefreshOutcome>>,
        outcome: RefreshOutcome,
    ) {
        **last = Some(outcome);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

/// Snapshots keyed by symbol.
///
/// Readers share the map lock for the freshness check; replacing a snapshot
/// takes it exclusively. Each symbol also gets a refresh gate so concurrent
/// misses for the same symbol collapse into one upstream call.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    snapshots: RwLock<HashMap<String, Arc<TickerSnapshot>>>,
    gates: Mutex<HashMap<String, Arc<RefreshGate>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, symbol: &str) -> Option<Arc<TickerSnapshot>> {
        let snapshots = self.snapshots.read().await;
        snapshots.get(symbol).cloned()
    }

    /// Store `snapshot` under its symbol, dropping whatever was there before.
    pub async fn replace(&self, snapshot: Arc<TickerSnapshot>) {
        let mut snapshots = self.snapshots.write().await;
        snapshots.insert(snapshot.symbol.clone(), snapshot);
    }

    pub async fn refresh_gate(&self, symbol: &str) -> Arc<RefreshGate> {
        let mut gates = self.gates.lock().await;
        gates.entry(symbol.to_string()).or_default().clone()
    }

    pub async fn len(&self) -> usize {
        self.snapshots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshots.read().await.is_empty()
    }
}
