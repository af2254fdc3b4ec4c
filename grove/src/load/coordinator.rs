//! Per-node load state: `unloaded -> loading -> loaded`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::debug;

use crate::load::cache::LazyCache;
use crate::load::latency::LatencyPolicy;
use crate::load::source::ChildSource;
use crate::tree::{NodeId, NodeRef};

/// Children produced by a settled load.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub children: Vec<NodeRef>,
    /// True when served from the lazy cache instead of the source.
    pub from_cache: bool,
}

/// Tracks outstanding fetches and the lazy cache for one tree.
///
/// A node id enters the loading set through [`LoadCoordinator::begin`] and
/// leaves it when the returned [`LoadGuard`] is dropped, whether the load
/// succeeded, failed, or the caller gave up on it.
pub struct LoadCoordinator<S> {
    source: S,
    latency: LatencyPolicy,
    cache: Mutex<LazyCache>,
    loading: watch::Sender<HashSet<NodeId>>,
}

impl<S: ChildSource> LoadCoordinator<S> {
    pub fn new(source: S, latency: LatencyPolicy) -> Self {
        let (loading, _) = watch::channel(HashSet::new());
        Self {
            source,
            latency,
            cache: Mutex::new(LazyCache::new()),
            loading,
        }
    }

    /// Mark `id` as loading.
    ///
    /// Returns `None` if a load for `id` is already outstanding; the caller
    /// must not start a second fetch.
    pub fn begin(&self, id: &NodeId) -> Option<LoadGuard<'_>> {
        let inserted = self
            .loading
            .send_if_modified(|loading| loading.insert(id.clone()));
        if !inserted {
            debug!(id = %id, "load already in flight");
            return None;
        }
        debug!(id = %id, "load started");
        Some(LoadGuard {
            loading: &self.loading,
            id: id.clone(),
        })
    }

    /// Resolve the children of the node held by `guard`.
    ///
    /// Cached ids are replayed after the short cached latency without
    /// touching the source. Otherwise the source is called after the
    /// first-fetch latency and a successful result becomes the cache entry.
    pub async fn fetch(&self, guard: &LoadGuard<'_>) -> Result<Loaded> {
        let id = guard.id();
        let cached = self.cache().get(id.as_str());

        if let Some(children) = cached {
            tokio::time::sleep(self.latency.cached()).await;
            debug!(id = %id, count = children.len(), "served children from cache");
            return Ok(Loaded {
                children,
                from_cache: true,
            });
        }

        tokio::time::sleep(self.latency.first_fetch()).await;
        let fetched = self
            .source
            .fetch_children(id)
            .await
            .with_context(|| format!("fetch children of '{}'", id))?;
        let fetched: Vec<NodeRef> = fetched.into_iter().map(Arc::new).collect();
        let children = self.cache().record(id.clone(), fetched);
        debug!(id = %id, count = children.len(), "fetched children from source");
        Ok(Loaded {
            children,
            from_cache: false,
        })
    }

    pub fn is_loading(&self, id: &str) -> bool {
        self.loading.borrow().contains(id)
    }

    /// Watch the set of ids with an outstanding load.
    pub fn subscribe(&self) -> watch::Receiver<HashSet<NodeId>> {
        self.loading.subscribe()
    }

    pub fn is_cached(&self, id: &str) -> bool {
        self.cache().contains(id)
    }

    fn cache(&self) -> MutexGuard<'_, LazyCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Membership of one id in the loading set; released on drop.
#[must_use = "dropping the guard ends the load immediately"]
pub struct LoadGuard<'a> {
    loading: &'a watch::Sender<HashSet<NodeId>>,
    id: NodeId,
}

impl LoadGuard<'_> {
    pub fn id(&self) -> &NodeId {
        &self.id
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.loading.send_modify(|loading| {
            loading.remove(&self.id);
        });
        debug!(id = %self.id, "load settled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingSource;
    use crate::tree::Node;
    use std::time::Duration;
    use tokio::time::Instant;

    fn source() -> Arc<RecordingSource> {
        Arc::new(RecordingSource::new().with("p", vec![Node::leaf("c1", "One")]))
    }

    #[tokio::test(start_paused = true)]
    async fn second_begin_is_rejected_while_outstanding() {
        let coordinator = LoadCoordinator::new(source(), LatencyPolicy::immediate());
        let id = NodeId::from("p");

        let guard = coordinator.begin(&id).expect("first begin");
        assert!(coordinator.is_loading("p"));
        assert!(coordinator.begin(&id).is_none());

        drop(guard);
        assert!(!coordinator.is_loading("p"));
        assert!(coordinator.begin(&id).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn cached_fetch_skips_source_and_uses_short_latency() {
        let source = source();
        let coordinator =
            LoadCoordinator::new(Arc::clone(&source), LatencyPolicy::new(100, 500, 900));
        let id = NodeId::from("p");

        let started = Instant::now();
        let guard = coordinator.begin(&id).expect("begin");
        let first = coordinator.fetch(&guard).await.expect("first fetch");
        drop(guard);
        let first_elapsed = started.elapsed();
        assert!(!first.from_cache);
        assert!(first_elapsed >= Duration::from_millis(500));
        assert!(first_elapsed < Duration::from_millis(1000));

        let started = Instant::now();
        let guard = coordinator.begin(&id).expect("begin");
        let second = coordinator.fetch(&guard).await.expect("second fetch");
        drop(guard);
        assert!(second.from_cache);
        let second_elapsed = started.elapsed();
        assert!(second_elapsed >= Duration::from_millis(100));
        assert!(second_elapsed < Duration::from_millis(500));

        assert_eq!(source.calls(), 1);
        assert!(Arc::ptr_eq(&first.children[0], &second.children[0]));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_caches_nothing() {
        let source = source();
        source.fail("p");
        let coordinator = LoadCoordinator::new(Arc::clone(&source), LatencyPolicy::immediate());
        let id = NodeId::from("p");

        let guard = coordinator.begin(&id).expect("begin");
        let err = coordinator.fetch(&guard).await.expect_err("expected error");
        drop(guard);
        assert!(format!("{:#}", err).contains("fetch children of 'p'"));
        assert!(!coordinator.is_cached("p"));
        assert!(!coordinator.is_loading("p"));

        source.heal("p");
        let guard = coordinator.begin(&id).expect("begin");
        let loaded = coordinator.fetch(&guard).await.expect("retry");
        assert_eq!(loaded.children.len(), 1);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_observe_loading_transitions() {
        let coordinator = LoadCoordinator::new(source(), LatencyPolicy::immediate());
        let mut rx = coordinator.subscribe();
        let id = NodeId::from("p");

        let guard = coordinator.begin(&id).expect("begin");
        rx.changed().await.expect("changed");
        assert!(rx.borrow_and_update().contains("p"));

        drop(guard);
        rx.changed().await.expect("changed");
        assert!(rx.borrow_and_update().is_empty());
    }
}
