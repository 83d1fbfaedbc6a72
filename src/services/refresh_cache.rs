//! Time-boxed payload cache with single-flight refresh
//!
//! One slot shared by every request in the process. A stale or empty slot
//! is refilled by exactly one caller per source key; concurrent callers
//! wait on that attempt and share its outcome, success or failure. A failed
//! refresh leaves the previous entry in place but is still reported.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, RwLock};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::types::{FloorcalcError, Payload, Result};

/// Default cache TTL in seconds (5 minutes)
pub const CACHE_TTL_SECS: u64 = 300;

/// How a lookup was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Fresh entry already in the slot
    Hit,
    /// Waited on another caller's refresh and reused it
    Coalesced,
    /// This caller ran the refresh
    Refreshed,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    key: String,
    payload: Arc<Payload>,
    stored_at: Instant,
    fetched_at: DateTime<Utc>,
}

/// Point-in-time view of the slot
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    pub key: String,
    pub fetched_at: DateTime<Utc>,
    pub age: Duration,
    pub fresh: bool,
}

/// Result of one refresh attempt as seen by the callers waiting on it
type Outcome = std::result::Result<Arc<Payload>, String>;

type InflightMap = Mutex<HashMap<String, watch::Receiver<Option<Outcome>>>>;

enum Role<'a> {
    Leader(Flight<'a>),
    Follower(watch::Receiver<Option<Outcome>>),
}

/// Registration of the running attempt for a key.
///
/// Dropping it unregisters the attempt; if the leader is cancelled before
/// publishing, the sender goes with it and waiters start over.
struct Flight<'a> {
    inflight: &'a InflightMap,
    key: String,
    tx: watch::Sender<Option<Outcome>>,
}

impl Flight<'_> {
    fn publish(self, outcome: Outcome) {
        let tx = self.tx.clone();
        // Unregister first so later callers start a new attempt
        drop(self);
        tx.send_replace(Some(outcome));
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        self.inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

pub struct RefreshCache {
    ttl: Duration,
    slot: RwLock<Option<CacheEntry>>,
    inflight: InflightMap,
}

impl RefreshCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached payload for `key` if younger than the TTL,
    /// otherwise run `refresh` once and store its result.
    ///
    /// Callers arriving while a refresh for the same key is running wait for
    /// it. If it fails they receive its error as `FloorcalcError::Coalesced`
    /// rather than retrying.
    pub async fn get_or_refresh<F, Fut>(
        &self,
        key: &str,
        refresh: F,
    ) -> Result<(Arc<Payload>, CacheStatus)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Payload>>,
    {
        if let Some(payload) = self.fresh(key).await {
            debug!(key, "pricing cache hit");
            return Ok((payload, CacheStatus::Hit));
        }

        loop {
            let mut rx = match self.join(key) {
                Role::Leader(flight) => return self.lead(flight, key, refresh).await,
                Role::Follower(rx) => rx,
            };

            let outcome = match rx.wait_for(Option::is_some).await {
                Ok(published) => Option::clone(&published),
                Err(_) => None,
            };

            match outcome {
                Some(Ok(payload)) => {
                    debug!(key, "pricing cache filled by concurrent refresh");
                    return Ok((payload, CacheStatus::Coalesced));
                }
                Some(Err(message)) => {
                    debug!(key, error = %message, "concurrent refresh failed");
                    return Err(FloorcalcError::Coalesced(message));
                }
                // Leader went away without publishing
                None => debug!(key, "refresh abandoned, retrying"),
            }
        }
    }

    pub async fn snapshot(&self) -> Option<CacheSnapshot> {
        self.slot.read().await.as_ref().map(|entry| {
            let age = entry.stored_at.elapsed();
            CacheSnapshot {
                key: entry.key.clone(),
                fetched_at: entry.fetched_at,
                age,
                fresh: age < self.ttl,
            }
        })
    }

    async fn lead<F, Fut>(
        &self,
        flight: Flight<'_>,
        key: &str,
        refresh: F,
    ) -> Result<(Arc<Payload>, CacheStatus)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Payload>>,
    {
        // A previous attempt may have stored a payload since our first check
        if let Some(payload) = self.fresh(key).await {
            flight.publish(Ok(Arc::clone(&payload)));
            return Ok((payload, CacheStatus::Coalesced));
        }

        let started = Instant::now();
        let payload = match refresh().await {
            Ok(payload) => Arc::new(payload),
            Err(e) => {
                flight.publish(Err(e.to_string()));
                return Err(e);
            }
        };

        let entry = CacheEntry {
            key: key.to_string(),
            payload: Arc::clone(&payload),
            stored_at: Instant::now(),
            fetched_at: Utc::now(),
        };
        *self.slot.write().await = Some(entry);
        flight.publish(Ok(Arc::clone(&payload)));

        info!(
            key,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pricing cache refreshed"
        );
        Ok((payload, CacheStatus::Refreshed))
    }

    async fn fresh(&self, key: &str) -> Option<Arc<Payload>> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|entry| entry.key == key && entry.stored_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.payload))
    }

    /// Wait on the running attempt for `key`, or register a new one
    fn join(&self, key: &str) -> Role<'_> {
        let mut inflight = self
            .inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(rx) = inflight.get(key) {
            return Role::Follower(rx.clone());
        }

        let (tx, rx) = watch::channel(None);
        inflight.insert(key.to_string(), rx);
        Role::Leader(Flight {
            inflight: &self.inflight,
            key: key.to_string(),
            tx,
        })
    }
}

impl Default for RefreshCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(CACHE_TTL_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Settings;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const KEY: &str = "https://sheets.example/pricing.csv";

    fn payload_with(stain_polished: f64) -> Payload {
        let mut settings = Settings::default();
        settings.set("stain_polished", stain_polished);
        Payload {
            settings,
            ..Payload::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_lookup_within_ttl_is_hit() {
        let cache = RefreshCache::default();
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let refresh = || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, FloorcalcError>(payload_with(500.0))
        };

        let (first, status) = cache.get_or_refresh(KEY, refresh).await.unwrap();
        assert_eq!(status, CacheStatus::Refreshed);

        tokio::time::advance(Duration::from_secs(299)).await;
        let (second, status) = cache.get_or_refresh(KEY, refresh).await.unwrap();

        assert_eq!(status, CacheStatus::Hit);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_after_ttl_refreshes_once() {
        let cache = RefreshCache::default();
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let refresh = || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, FloorcalcError>(payload_with(500.0 + n as f64))
        };

        cache.get_or_refresh(KEY, refresh).await.unwrap();
        tokio::time::advance(Duration::from_secs(300)).await;

        let (payload, status) = cache.get_or_refresh(KEY, refresh).await.unwrap();
        assert_eq!(status, CacheStatus::Refreshed);
        assert_eq!(payload.settings.get("stain_polished"), Some(501.0));

        let (_, status) = cache.get_or_refresh(KEY, refresh).await.unwrap();
        assert_eq!(status, CacheStatus::Hit);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_previous_entry() {
        let cache = RefreshCache::default();
        cache
            .get_or_refresh(KEY, || async { Ok(payload_with(500.0)) })
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(301)).await;
        let result = cache
            .get_or_refresh(KEY, || async {
                Err(FloorcalcError::Fetch {
                    url: KEY.to_string(),
                    status: 500,
                })
            })
            .await;

        // The failing caller sees the error, not stale data
        assert!(result.is_err());
        let snapshot = cache.snapshot().await.unwrap();
        assert_eq!(snapshot.key, KEY);
        assert!(!snapshot.fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_for_other_key_is_not_served() {
        let cache = RefreshCache::default();
        cache
            .get_or_refresh(KEY, || async { Ok(payload_with(500.0)) })
            .await
            .unwrap();

        let (payload, status) = cache
            .get_or_refresh("https://sheets.example/other.csv", || async {
                Ok(payload_with(700.0))
            })
            .await
            .unwrap();

        assert_eq!(status, CacheStatus::Refreshed);
        assert_eq!(payload.settings.get("stain_polished"), Some(700.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_share_one_refresh() {
        let cache = Arc::new(RefreshCache::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let lookups = (0..8).map(|_| {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                cache
                    .get_or_refresh(KEY, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(payload_with(500.0))
                    })
                    .await
                    .map(|(_, status)| status)
            })
        });

        let mut statuses = Vec::new();
        for handle in lookups.collect::<Vec<_>>() {
            statuses.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            statuses
                .iter()
                .filter(|s| **s == CacheStatus::Refreshed)
                .count(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_failures_share_one_attempt() {
        let cache = Arc::new(RefreshCache::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let started = Instant::now();

        let lookups: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    let result = cache
                        .get_or_refresh(KEY, || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_secs(10)).await;
                            Err(FloorcalcError::Fetch {
                                url: KEY.to_string(),
                                status: 503,
                            })
                        })
                        .await;
                    (result.map(|(_, status)| status), started.elapsed())
                })
            })
            .collect();

        let mut coalesced = 0;
        for handle in lookups {
            let (result, elapsed) = handle.await.unwrap();
            let err = result.unwrap_err();
            assert_eq!(err.to_string(), "Failed to fetch CSV: 503");
            if matches!(err, FloorcalcError::Coalesced(_)) {
                coalesced += 1;
            }
            assert!(elapsed < Duration::from_secs(11), "finished at {elapsed:?}");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(coalesced, 3);
        assert!(cache.snapshot().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_lookup_after_shared_failure_retries() {
        let cache = RefreshCache::default();
        let failed = cache
            .get_or_refresh(KEY, || async {
                Err(FloorcalcError::EmptyData("Pricing CSV returned no rows".into()))
            })
            .await;
        assert!(matches!(failed, Err(FloorcalcError::EmptyData(_))));

        let (_, status) = cache
            .get_or_refresh(KEY, || async { Ok(payload_with(500.0)) })
            .await
            .unwrap();
        assert_eq!(status, CacheStatus::Refreshed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_refresh_hands_over_to_waiter() {
        let cache = Arc::new(RefreshCache::default());

        let leader = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .get_or_refresh(KEY, || async {
                        tokio::time::sleep(Duration::from_secs(100)).await;
                        Ok(payload_with(500.0))
                    })
                    .await
                    .map(|(_, status)| status)
            })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;

        let waiter = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .get_or_refresh(KEY, || async { Ok(payload_with(650.0)) })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;

        leader.abort();
        let (payload, status) = waiter.await.unwrap().unwrap();

        assert_eq!(status, CacheStatus::Refreshed);
        assert_eq!(payload.settings.get("stain_polished"), Some(650.0));
    }

    #[tokio::test]
    async fn test_empty_cache_has_no_snapshot() {
        let cache = RefreshCache::new(Duration::from_secs(60));
        assert!(cache.snapshot().await.is_none());
        assert_eq!(cache.ttl(), Duration::from_secs(60));
    }
}
