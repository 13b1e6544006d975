//! Request coalescing for identical upstream targets.
//!
//! # Responsibilities
//! - Guarantee at most one in-flight computation per key
//! - Hand the single outcome to every concurrent waiter
//! - Tear the entry down on completion so the next request starts fresh
//!
//! # Design Decisions
//! - Sharded map + per-key watch channel, no global lock: unrelated keys
//!   never contend beyond their map shard
//! - The computation runs on a spawned task; a waiter that stops waiting
//!   detaches without cancelling the flight for everyone else
//! - The outcome is published before the key is removed, so attachers that
//!   grabbed a receiver in the completion window still observe the value

use std::future::Future;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::watch;

type Slot<T> = watch::Receiver<Option<T>>;

/// Per-key single-flight executor.
///
/// Concurrent [`run`](Self::run) calls with the same key share one execution
/// of the supplied future; each generation lives exactly as long as its
/// computation.
pub struct FlightGroup<T> {
    inflight: Arc<DashMap<String, Slot<T>>>,
}

/// Removes the in-flight entry when the computation finishes, even if the
/// flight future panics mid-way.
struct FlightCleanup<'a, T> {
    inflight: &'a DashMap<String, Slot<T>>,
    key: &'a str,
}

impl<T> Drop for FlightCleanup<'_, T> {
    fn drop(&mut self) {
        self.inflight.remove(self.key);
    }
}

impl<T: Clone + Send + Sync + 'static> FlightGroup<T> {
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(DashMap::new()),
        }
    }

    /// Number of keys currently in flight.
    pub fn len(&self) -> usize {
        self.inflight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inflight.is_empty()
    }

    /// Runs `flight` for `key`, or attaches to the execution already in
    /// progress for it.
    ///
    /// Returns `None` only if the in-flight task died without publishing an
    /// outcome. Dropping the returned future detaches this waiter; the
    /// underlying computation keeps running for the others.
    pub async fn run<Fut>(&self, key: &str, flight: Fut) -> Option<T>
    where
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut rx = match self.inflight.entry(key.to_owned()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(slot) => {
                let (tx, rx) = watch::channel(None);
                slot.insert(rx.clone());

                let inflight = Arc::clone(&self.inflight);
                let key = key.to_owned();
                tokio::spawn(async move {
                    let _cleanup = FlightCleanup {
                        inflight: inflight.as_ref(),
                        key: key.as_str(),
                    };
                    let outcome = flight.await;
                    let _ = tx.send(Some(outcome));
                });
                rx
            }
        };

        let result = match rx.wait_for(|slot| slot.is_some()).await {
            Ok(published) => published.clone(),
            // Sender dropped without publishing: the flight task panicked.
            Err(_) => None,
        };
        result
    }
}

impl<T: Clone + Send + Sync + 'static> Default for FlightGroup<T> {
    fn default() -> Self {
        Self::new()
    }
}
