//! TTL Memoization with In-flight De-duplication
//!
//! At most one upstream call per key is in flight: concurrent callers
//! await the same shared future. The call runs on its own task, so a
//! caller that is cancelled neither aborts it nor releases its slot; the
//! task itself stores a successful result and clears the slot when it
//! ends. A successful result is reused until its TTL lapses. Failures
//! are never cached.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::error::GatewayError;

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, GatewayError>>>;

#[derive(Debug, Clone)]
struct CachedValue<V> {
  value: V,
  expires_at: Instant,
}

struct InFlight<V: Clone> {
  id: u64,
  fetch: SharedFetch<V>,
}

struct Slots<V: Clone> {
  values: HashMap<String, CachedValue<V>>,
  in_flight: HashMap<String, InFlight<V>>,
  next_id: u64,
}

/// Keyed TTL cache with request coalescing.
pub struct MemoCache<V: Clone> {
  ttl: Duration,
  fetch_timeout: Duration,
  slots: Arc<Mutex<Slots<V>>>,
}

/// Owned by the fetch task. Releases the in-flight slot when the task
/// ends, including by panic or abort, if the slot is still ours.
struct FetchSlot<V: Clone> {
  slots: Arc<Mutex<Slots<V>>>,
  key: String,
  id: u64,
}

impl<V: Clone> FetchSlot<V> {
  fn store(&self, value: &V, ttl: Duration) {
    if let Ok(mut slots) = self.slots.lock() {
      if slots.in_flight.get(&self.key).is_some_and(|f| f.id == self.id) {
        slots.values.insert(
          self.key.clone(),
          CachedValue {
            value: value.clone(),
            expires_at: Instant::now() + ttl,
          },
        );
      }
    }
  }
}

impl<V: Clone> Drop for FetchSlot<V> {
  fn drop(&mut self) {
    if let Ok(mut slots) = self.slots.lock() {
      if slots.in_flight.get(&self.key).is_some_and(|f| f.id == self.id) {
        slots.in_flight.remove(&self.key);
      }
    }
  }
}

impl<V> MemoCache<V>
where
  V: Clone + Send + Sync + 'static,
{
  /// Create a cache whose entries live for `ttl` and whose upstream
  /// calls are abandoned after `fetch_timeout`.
  pub fn new(ttl: Duration, fetch_timeout: Duration) -> Self {
    Self {
      ttl,
      fetch_timeout,
      slots: Arc::new(Mutex::new(Slots {
        values: HashMap::new(),
        in_flight: HashMap::new(),
        next_id: 0,
      })),
    }
  }

  /// Build a cache key from a function name and its arguments.
  ///
  /// Arguments are serialized to JSON; use ordered maps in argument
  /// types so equal arguments always produce equal keys.
  pub fn key<A: Serialize + ?Sized>(function: &str, args: &A) -> String {
    let args = serde_json::to_string(args).unwrap_or_default();
    format!("{function}:{args}")
  }

  /// Return the cached value for `key`, or run `fetch` (once, shared by
  /// all concurrent callers) and cache its success.
  ///
  /// Must be called from within a tokio runtime.
  pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<V, GatewayError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, GatewayError>> + Send + 'static,
  {
    let shared = {
      let mut slots = self.lock()?;

      if let Some(cached) = slots.values.get(key) {
        if cached.expires_at > Instant::now() {
          debug!(key, "Cache hit");
          return Ok(cached.value.clone());
        }
        slots.values.remove(key);
      }

      if let Some(existing) = slots.in_flight.get(key) {
        debug!(key, "Joining in-flight fetch");
        existing.fetch.clone()
      } else {
        let id = slots.next_id;
        slots.next_id += 1;

        let slot = FetchSlot {
          slots: Arc::clone(&self.slots),
          key: key.to_string(),
          id,
        };
        let ttl = self.ttl;
        let timeout = self.fetch_timeout;
        let fut = fetch();

        let task = tokio::spawn(async move {
          let result = match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::transport(format!(
              "upstream call timed out after {}ms",
              timeout.as_millis()
            ))),
          };
          if let Ok(value) = &result {
            slot.store(value, ttl);
          }
          drop(slot);
          result
        });

        let fetch_fut: BoxFuture<'static, Result<V, GatewayError>> = async move {
          match task.await {
            Ok(result) => result,
            Err(e) => {
              warn!(error = %e, "Upstream fetch task ended abnormally");
              Err(GatewayError::transport(format!("upstream fetch task failed: {e}")))
            }
          }
        }
        .boxed();
        let shared = fetch_fut.shared();
        slots.in_flight.insert(
          key.to_string(),
          InFlight {
            id,
            fetch: shared.clone(),
          },
        );
        shared
      }
    };

    shared.await
  }

  /// Number of fetches currently in flight.
  pub fn in_flight(&self) -> usize {
    self.slots.lock().map(|s| s.in_flight.len()).unwrap_or(0)
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Slots<V>>, GatewayError> {
    self
      .slots
      .lock()
      .map_err(|_| GatewayError::Config("cache lock poisoned".into()))
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicU32, Ordering};

  use super::*;

  fn cache() -> MemoCache<u32> {
    MemoCache::new(Duration::from_secs(300), Duration::from_secs(5))
  }

  #[tokio::test]
  async fn test_concurrent_callers_share_one_fetch() {
    let cache = Arc::new(cache());
    let calls = Arc::new(AtomicU32::new(0));

    let mut handles = Vec::new();
    for _ in 0..10 {
      let cache = Arc::clone(&cache);
      let calls = Arc::clone(&calls);
      handles.push(tokio::spawn(async move {
        cache
          .get_or_fetch("fetch_chains:null", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(7)
          })
          .await
      }));
    }

    for h in handles {
      assert_eq!(h.await.unwrap().unwrap(), 7);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.in_flight(), 0);
  }

  async fn slow_fetch(cache: &MemoCache<u32>, calls: Arc<AtomicU32>) -> Result<u32, GatewayError> {
    cache
      .get_or_fetch("fetch_chains:null", move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(7)
      })
      .await
  }

  #[tokio::test(start_paused = true)]
  async fn test_cancelled_waiter_does_not_release_slot() {
    let cache = Arc::new(cache());
    let calls = Arc::new(AtomicU32::new(0));

    let a = tokio::spawn({
      let (cache, calls) = (Arc::clone(&cache), Arc::clone(&calls));
      async move { slow_fetch(&cache, calls).await }
    });
    let b = tokio::spawn({
      let (cache, calls) = (Arc::clone(&cache), Arc::clone(&calls));
      async move { slow_fetch(&cache, calls).await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(cache.in_flight(), 1);

    a.abort();
    assert!(a.await.unwrap_err().is_cancelled());
    assert_eq!(cache.in_flight(), 1);

    let c = tokio::spawn({
      let (cache, calls) = (Arc::clone(&cache), Arc::clone(&calls));
      async move { slow_fetch(&cache, calls).await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(cache.in_flight(), 1);

    assert_eq!(b.await.unwrap().unwrap(), 7);
    assert_eq!(c.await.unwrap().unwrap(), 7);
    assert_eq!(cache.in_flight(), 0);

    let d = slow_fetch(&cache, Arc::clone(&calls)).await.unwrap();
    assert_eq!(d, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_fetch_completes_after_every_waiter_is_cancelled() {
    let cache = Arc::new(cache());
    let calls = Arc::new(AtomicU32::new(0));

    let a = tokio::spawn({
      let (cache, calls) = (Arc::clone(&cache), Arc::clone(&calls));
      async move { slow_fetch(&cache, calls).await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    a.abort();
    let _ = a.await;

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(cache.in_flight(), 0);

    let v = cache
      .get_or_fetch("fetch_chains:null", || async { Ok(99) })
      .await
      .unwrap();
    assert_eq!(v, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_failure_is_not_cached() {
    let cache = cache();
    let calls = Arc::new(AtomicU32::new(0));

    let c = Arc::clone(&calls);
    let first = cache
      .get_or_fetch("k", move || async move {
        c.fetch_add(1, Ordering::SeqCst);
        Err(GatewayError::transport("boom"))
      })
      .await;
    assert!(first.is_err());
    assert_eq!(cache.in_flight(), 0);

    let c = Arc::clone(&calls);
    let second = cache
      .get_or_fetch("k", move || async move {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(1)
      })
      .await;
    assert_eq!(second.unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_entry_expires_after_ttl() {
    let cache = MemoCache::new(Duration::from_secs(300), Duration::from_secs(5));
    let calls = Arc::new(AtomicU32::new(0));

    for _ in 0..2 {
      let c = Arc::clone(&calls);
      cache
        .get_or_fetch("k", move || async move { Ok(c.fetch_add(1, Ordering::SeqCst)) })
        .await
        .unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(301)).await;

    let c = Arc::clone(&calls);
    let v = cache
      .get_or_fetch("k", move || async move { Ok(c.fetch_add(1, Ordering::SeqCst)) })
      .await
      .unwrap();
    assert_eq!(v, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_timeout_clears_in_flight_slot() {
    let cache = MemoCache::new(Duration::from_secs(300), Duration::from_millis(100));

    let result = cache
      .get_or_fetch("slow", || async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(1)
      })
      .await;
    let err = result.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(cache.in_flight(), 0);

    let v = cache.get_or_fetch("slow", || async { Ok(2) }).await.unwrap();
    assert_eq!(v, 2);
  }

  #[test]
  fn test_key_includes_function_and_args() {
    let a = MemoCache::<u32>::key("pool_balances", &("ETH", 1));
    let b = MemoCache::<u32>::key("pool_balances", &("ETH", 2));
    let c = MemoCache::<u32>::key("tss_public_keys", &("ETH", 1));
    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_eq!(a, r#"pool_balances:["ETH",1]"#);
  }
}
