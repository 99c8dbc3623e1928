//! Response caches in front of the upstream services.
//!
//! Each key has a slot holding a [`OnceCell`]; concurrent requests for the
//! same key wait on the same cell, so at most one upstream fetch per key is
//! in flight. A failed fetch leaves the cell empty and drops the slot, so
//! errors are never cached.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::OnceCell;

struct Slot<V> {
    cell: OnceCell<(Instant, V)>,
}

impl<V> Slot<V> {
    fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    fn stored_at(&self) -> Option<Instant> {
        self.cell.get().map(|(at, _)| *at)
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at().is_some_and(|at| at.elapsed() >= ttl)
    }
}

/// Size-bounded cache whose entries expire `ttl` after they were stored.
pub struct TtlCache<V> {
    name: &'static str,
    ttl: Duration,
    capacity: usize,
    slots: Mutex<HashMap<String, Arc<Slot<V>>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(name: &'static str, ttl: Duration, capacity: usize) -> Self {
        Self {
            name,
            ttl,
            capacity: capacity.max(1),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// The cached value for `key`, or the result of `fetch` stored under it.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.slot(key);
        let result = slot
            .cell
            .get_or_try_init(|| async move {
                tracing::debug!(cache = self.name, key, "Cache miss");
                fetch().await.map(|value| (Instant::now(), value))
            })
            .await;

        match result {
            Ok((_, value)) => Ok(value.clone()),
            Err(e) => {
                self.discard(key, &slot);
                Err(e)
            }
        }
    }

    /// Number of slots, including in-flight ones.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Slot<V>>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, key: &str) -> Arc<Slot<V>> {
        let mut slots = self.lock();
        if let Some(slot) = slots.get(key) {
            if !slot.is_expired(self.ttl) {
                return Arc::clone(slot);
            }
        }

        slots.retain(|_, slot| !slot.is_expired(self.ttl));
        while slots.len() >= self.capacity {
            // In-flight slots have no timestamp and are never evicted.
            let oldest = slots
                .iter()
                .filter_map(|(key, slot)| slot.stored_at().map(|at| (at, key.clone())))
                .min();
            let Some((_, evicted)) = oldest else {
                break;
            };
            tracing::debug!(cache = self.name, key = %evicted, "Evicting entry");
            slots.remove(&evicted);
        }

        let slot = Arc::new(Slot::new());
        slots.insert(key.to_string(), Arc::clone(&slot));
        slot
    }

    fn discard(&self, key: &str, failed: &Arc<Slot<V>>) {
        let mut slots = self.lock();
        let is_same_empty_slot = slots
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, failed) && current.cell.get().is_none());
        if is_same_empty_slot {
            slots.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_fetch<'a>(
        calls: &'a AtomicUsize,
        value: &'static str,
    ) -> impl Future<Output = Result<String, String>> + 'a {
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(value.to_string())
        }
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_fetch() {
        let cache = TtlCache::new("test", Duration::from_secs(60), 10);
        let calls = AtomicUsize::new(0);

        let (a, b) = tokio::join!(
            cache.get_or_fetch("21595", || counting_fetch(&calls, "1195119")),
            cache.get_or_fetch("21595", || counting_fetch(&calls, "1195119")),
        );

        assert_eq!(a.unwrap(), "1195119");
        assert_eq!(b.unwrap(), "1195119");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hit_does_not_fetch() {
        let cache = TtlCache::new("test", Duration::from_secs(60), 10);
        let calls = AtomicUsize::new(0);

        cache
            .get_or_fetch("a", || counting_fetch(&calls, "1"))
            .await
            .unwrap();
        let second = cache
            .get_or_fetch("a", || counting_fetch(&calls, "2"))
            .await
            .unwrap();

        assert_eq!(second, "1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache: TtlCache<String> = TtlCache::new("test", Duration::from_secs(60), 10);

        let failed = cache
            .get_or_fetch("a", || async { Err::<String, _>("upstream down") })
            .await;
        assert_eq!(failed, Err("upstream down"));
        assert!(cache.is_empty());

        let recovered = cache
            .get_or_fetch("a", || async { Ok::<_, &str>("ok".to_string()) })
            .await;
        assert_eq!(recovered, Ok("ok".to_string()));
    }

    #[tokio::test]
    async fn test_expired_entries_are_refetched() {
        let cache = TtlCache::new("test", Duration::ZERO, 10);
        let calls = AtomicUsize::new(0);

        cache
            .get_or_fetch("a", || counting_fetch(&calls, "1"))
            .await
            .unwrap();
        cache
            .get_or_fetch("a", || counting_fetch(&calls, "1"))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let cache = TtlCache::new("test", Duration::from_secs(60), 2);
        let calls = AtomicUsize::new(0);

        for key in ["a", "b", "c"] {
            cache
                .get_or_fetch(key, || counting_fetch(&calls, "v"))
                .await
                .unwrap();
        }
        assert_eq!(cache.len(), 2);

        // "a" was evicted; "c" is still cached.
        cache
            .get_or_fetch("c", || counting_fetch(&calls, "v"))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        cache
            .get_or_fetch("a", || counting_fetch(&calls, "v"))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
