//! Time-boxed collections with optimistic mutation.
//!
//! A [`TimedCollection`] holds one wholesale entry `{fetched_at, data}` for a
//! logical collection (inventory, orders, ...). Every write bumps a version
//! counter; fetch completions and rollbacks only land if the version they
//! started from is still the latest, so a slow response can never clobber
//! state written after it was issued.

use crate::{CacheError, Clock};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Default freshness window for back-office collections.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// An immutable view of a collection entry.
///
/// Cloning is cheap: the data sits behind an `Arc`, so two reads served from
/// the same entry point at the same allocation.
#[derive(Debug)]
pub struct Snapshot<T> {
    /// The cached data.
    pub data: Arc<T>,
    /// When the data was stored.
    pub fetched_at: DateTime<Utc>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            fetched_at: self.fetched_at,
        }
    }
}

impl<T> Snapshot<T> {
    /// True when both snapshots come from the same stored entry.
    pub fn same_entry(&self, other: &Snapshot<T>) -> bool {
        Arc::ptr_eq(&self.data, &other.data) && self.fetched_at == other.fetched_at
    }
}

/// Proof that a fetch was started at a given version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    version: u64,
}

struct Slot<T> {
    entry: Option<Snapshot<T>>,
    version: u64,
}

/// A single cached collection with TTL freshness and optimistic writes.
pub struct TimedCollection<T> {
    name: &'static str,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slot: Mutex<Slot<T>>,
    // Held for the whole apply/commit/rollback of an optimistic mutation.
    writes: Mutex<()>,
}

impl<T> std::fmt::Debug for TimedCollection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedCollection")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl<T: Default + Send + Sync> TimedCollection<T> {
    pub fn new(name: &'static str, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            ttl,
            clock,
            slot: Mutex::new(Slot {
                entry: None,
                version: 0,
            }),
            writes: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether an entry stored at `at` is still fresh.
    pub fn is_fresh_at(&self, at: DateTime<Utc>) -> bool {
        let age = self.clock.now().signed_duration_since(at);
        age.num_milliseconds() < self.ttl.as_millis() as i64
    }

    /// The current entry if it is fresh.
    pub async fn peek(&self) -> Result<Snapshot<T>, CacheError> {
        let slot = self.slot.lock().await;
        match &slot.entry {
            None => Err(CacheError::Empty(self.name)),
            Some(entry) if self.is_fresh_at(entry.fetched_at) => Ok(entry.clone()),
            Some(_) => Err(CacheError::Stale(self.name)),
        }
    }

    /// The current entry regardless of freshness.
    pub async fn cached(&self) -> Option<Snapshot<T>> {
        self.slot.lock().await.entry.clone()
    }

    /// Mark the start of a remote fetch.
    pub async fn begin_fetch(&self) -> FetchTicket {
        FetchTicket {
            version: self.slot.lock().await.version,
        }
    }

    /// Store fetched data, unless something was written since `ticket`.
    ///
    /// A superseded fetch is discarded and the newer entry is returned in
    /// its place; if the newer write was an invalidation, the fetched data
    /// is handed back without being stored.
    pub async fn complete_fetch(&self, ticket: FetchTicket, data: T) -> Snapshot<T> {
        let now = self.clock.now();
        let mut slot = self.slot.lock().await;
        if slot.version != ticket.version {
            debug!(
                collection = self.name,
                started = ticket.version,
                latest = slot.version,
                "Discarding superseded fetch"
            );
            return match &slot.entry {
                Some(entry) => entry.clone(),
                None => Snapshot {
                    data: Arc::new(data),
                    fetched_at: now,
                },
            };
        }
        let snapshot = Snapshot {
            data: Arc::new(data),
            fetched_at: now,
        };
        slot.version += 1;
        slot.entry = Some(snapshot.clone());
        snapshot
    }

    /// Serve from cache when fresh, otherwise run `fetch` and store the result.
    pub async fn get<F, Fut, E>(&self, force: bool, fetch: F) -> Result<Snapshot<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !force {
            match self.peek().await {
                Ok(hit) => {
                    debug!(collection = self.name, "Cache hit");
                    return Ok(hit);
                }
                Err(miss) => debug!(collection = self.name, reason = %miss, "Cache miss"),
            }
        }

        let ticket = self.begin_fetch().await;
        let data = fetch().await?;
        Ok(self.complete_fetch(ticket, data).await)
    }

    /// Force the next `get` to refetch.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        slot.entry = None;
        slot.version += 1;
        debug!(collection = self.name, "Invalidated");
    }

    /// Replace the entry wholesale.
    pub async fn replace(&self, data: T) -> Snapshot<T> {
        let snapshot = Snapshot {
            data: Arc::new(data),
            fetched_at: self.clock.now(),
        };
        let mut slot = self.slot.lock().await;
        slot.version += 1;
        slot.entry = Some(snapshot.clone());
        snapshot
    }

    /// Apply `patch` to the latest entry, if there is one.
    ///
    /// Used to reconcile with an authoritative server response: the patch
    /// runs against whatever is current, never against an older copy.
    pub async fn update<F>(&self, patch: F) -> Option<Snapshot<T>>
    where
        F: FnOnce(&T) -> T,
    {
        let now = self.clock.now();
        let mut slot = self.slot.lock().await;
        let current = slot.entry.as_ref()?;
        let snapshot = Snapshot {
            data: Arc::new(patch(&current.data)),
            fetched_at: now,
        };
        slot.version += 1;
        slot.entry = Some(snapshot.clone());
        Some(snapshot)
    }

    /// Apply `updater` locally, then await `commit`.
    ///
    /// With nothing cached there is nothing to update locally, and `commit`
    /// simply runs. On commit failure the pre-mutation entry is restored as it was, unless
    /// a newer write already replaced the optimistic one. Mutations on the
    /// same collection run one at a time.
    pub async fn mutate_optimistic<U, C, Fut, R, E>(&self, updater: U, commit: C) -> Result<R, E>
    where
        U: FnOnce(&T) -> T,
        C: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: std::fmt::Display,
    {
        let _turn = self.writes.lock().await;

        let (previous, applied) = {
            let now = self.clock.now();
            let mut slot = self.slot.lock().await;
            let previous = slot.entry.clone();
            match &previous {
                Some(entry) => {
                    let next = updater(&entry.data);
                    slot.version += 1;
                    slot.entry = Some(Snapshot {
                        data: Arc::new(next),
                        fetched_at: now,
                    });
                }
                None => debug!(collection = self.name, "Nothing cached, committing without a local update"),
            }
            (previous, slot.version)
        };

        match commit().await {
            Ok(value) => Ok(value),
            Err(err) => {
                let mut slot = self.slot.lock().await;
                if previous.is_none() {
                    debug!(collection = self.name, error = %err, "Commit failed, nothing to roll back");
                } else if slot.version == applied {
                    slot.entry = previous;
                    slot.version += 1;
                    warn!(collection = self.name, error = %err, "Commit failed, rolled back");
                } else {
                    debug!(
                        collection = self.name,
                        error = %err,
                        "Commit failed after a newer write; keeping newer state"
                    );
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn setup() -> (Arc<ManualClock>, TimedCollection<Vec<u32>>) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()));
        let coll = TimedCollection::new("orders", DEFAULT_TTL, clock.clone());
        (clock, coll)
    }

    async fn fetch_counting(calls: &AtomicUsize, data: Vec<u32>) -> Result<Vec<u32>, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(data)
    }

    #[tokio::test]
    async fn test_fresh_entry_is_reused() {
        let (clock, coll) = setup();
        let calls = AtomicUsize::new(0);

        let first = coll.get(false, || fetch_counting(&calls, vec![1, 2])).await.unwrap();
        clock.advance(chrono::Duration::seconds(30));
        let second = coll.get(false, || fetch_counting(&calls, vec![9])).await.unwrap();

        assert!(first.same_entry(&second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let (clock, coll) = setup();
        let calls = AtomicUsize::new(0);

        coll.get(false, || fetch_counting(&calls, vec![1])).await.unwrap();
        clock.advance(chrono::Duration::seconds(65));
        assert!(matches!(coll.peek().await, Err(CacheError::Stale("orders"))));

        let refreshed = coll.get(false, || fetch_counting(&calls, vec![2])).await.unwrap();
        assert_eq!(*refreshed.data, vec![2]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_force_always_refetches() {
        let (_clock, coll) = setup();
        let calls = AtomicUsize::new(0);

        coll.get(false, || fetch_counting(&calls, vec![1])).await.unwrap();
        coll.get(true, || fetch_counting(&calls, vec![1])).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let (_clock, coll) = setup();
        let calls = AtomicUsize::new(0);

        coll.get(false, || fetch_counting(&calls, vec![1])).await.unwrap();
        coll.invalidate().await;
        assert!(matches!(coll.peek().await, Err(CacheError::Empty("orders"))));

        coll.get(false, || fetch_counting(&calls, vec![1])).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_entry_untouched() {
        let (_clock, coll) = setup();
        let before = coll.replace(vec![4]).await;

        let result = coll
            .get(true, || async { Err::<Vec<u32>, _>("down".to_string()) })
            .await;
        assert!(result.is_err());
        assert!(coll.cached().await.unwrap().same_entry(&before));
    }

    #[tokio::test]
    async fn test_optimistic_success_keeps_update() {
        let (_clock, coll) = setup();
        coll.replace(vec![1, 2, 3]).await;

        let out = coll
            .mutate_optimistic(
                |v| v.iter().copied().filter(|x| *x != 2).collect(),
                || async { Ok::<_, String>("deleted") },
            )
            .await
            .unwrap();

        assert_eq!(out, "deleted");
        assert_eq!(*coll.cached().await.unwrap().data, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_optimistic_failure_restores_snapshot() {
        let (clock, coll) = setup();
        let before = coll.replace(vec![1, 2, 3]).await;
        clock.advance(chrono::Duration::seconds(5));

        let result = coll
            .mutate_optimistic(
                |v| v.iter().copied().filter(|x| *x != 2).collect(),
                || async { Err::<(), _>("HTTP 500".to_string()) },
            )
            .await;

        assert_eq!(result.unwrap_err(), "HTTP 500");
        let after = coll.cached().await.unwrap();
        assert!(after.same_entry(&before));
        assert_eq!(*after.data, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_update_visible_before_commit_resolves() {
        let (_clock, coll) = setup();
        coll.replace(vec![1]).await;

        let seen = coll
            .mutate_optimistic(
                |v| {
                    let mut next = v.clone();
                    next.push(2);
                    next
                },
                || async { Ok::<_, String>(coll.cached().await.map(|s| (*s.data).clone())) },
            )
            .await
            .unwrap();

        assert_eq!(seen, Some(vec![1, 2]));
    }

    #[tokio::test]
    async fn test_superseded_fetch_is_discarded() {
        let (_clock, coll) = setup();
        coll.replace(vec![1, 2]).await;

        let ticket = coll.begin_fetch().await;
        coll.mutate_optimistic(|_| vec![1], || async { Ok::<_, String>(()) })
            .await
            .unwrap();
        let returned = coll.complete_fetch(ticket, vec![1, 2]).await;

        assert_eq!(*returned.data, vec![1]);
        assert_eq!(*coll.cached().await.unwrap().data, vec![1]);
    }

    #[tokio::test]
    async fn test_rollback_skipped_when_newer_write_landed() {
        let (_clock, coll) = setup();
        coll.replace(vec![1]).await;

        let result = coll
            .mutate_optimistic(
                |_| vec![],
                || async {
                    coll.update(|_| vec![7]).await;
                    Err::<(), _>("timeout".to_string())
                },
            )
            .await;

        assert!(result.is_err());
        assert_eq!(*coll.cached().await.unwrap().data, vec![7]);
    }

    #[tokio::test]
    async fn test_optimistic_on_empty_collection_commits_only() {
        let (_clock, coll) = setup();

        let out = coll
            .mutate_optimistic(|_| vec![9], || async { Ok::<_, String>(1) })
            .await
            .unwrap();

        assert_eq!(out, 1);
        assert!(coll.cached().await.is_none());
    }

    #[tokio::test]
    async fn test_mutations_are_serialized() {
        let (_clock, coll) = setup();
        coll.replace(vec![]).await;

        let first = coll.mutate_optimistic(
            |v| {
                let mut next = v.clone();
                next.push(1);
                next
            },
            || async {
                tokio::task::yield_now().await;
                Err::<(), _>("rejected".to_string())
            },
        );
        let second = coll.mutate_optimistic(
            |v| {
                let mut next = v.clone();
                next.push(2);
                next
            },
            || async { Ok::<(), String>(()) },
        );

        let (a, b) = tokio::join!(first, second);
        assert!(a.is_err());
        assert!(b.is_ok());
        assert_eq!(*coll.cached().await.unwrap().data, vec![2]);
    }
}
