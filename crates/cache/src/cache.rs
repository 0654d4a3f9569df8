//! Get-or-build cache of assembled forms.
//!
//! # Build protocol
//!
//! 1. Fast path: return the stored form for the key
//! 2. Leader election: the first caller for a key becomes leader, concurrent
//!    callers for the same key become waiters
//! 3. Leader re-checks the map (a previous leader may have just stored),
//!    builds, stores on success, then publishes the result on a `watch`
//!    channel and removes the in-flight entry
//! 4. Waiters receive the leader's result, success or failure
//!
//! A forced rebuild skips steps 1 and 2 and always calls the assembler.
//! Failed builds never touch the map.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use formwright_core::{Form, FormAssembler, FormCacheError, FormRequest};
use serde::Serialize;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, warn};

use crate::key::CacheKey;

type BuildResult = formwright_core::Result<Arc<Form>>;

/// Cache behaviour knobs.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Upper bound on a single assembler call. `None` waits indefinitely.
    pub build_timeout: Option<Duration>,
    /// Share one build between concurrent callers for the same key.
    pub deduplicate: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            build_timeout: None,
            deduplicate: true,
        }
    }
}

/// Point-in-time counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub builds: u64,
    pub failures: u64,
    /// Callers served by another caller's in-flight build.
    pub shared_builds: u64,
    pub entries: usize,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    builds: AtomicU64,
    failures: AtomicU64,
    shared_builds: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

struct InFlight {
    id: u64,
    rx: watch::Receiver<Option<BuildResult>>,
}

type InFlightMap = Arc<Mutex<HashMap<CacheKey, InFlight>>>;

/// Memoizes assembled forms for the lifetime of its owner.
///
/// Entries have no expiry; they live until invalidated or until the cache is
/// dropped. Safe to share between tasks.
pub struct FormCache {
    entries: RwLock<HashMap<CacheKey, Arc<Form>>>,
    inflight: InFlightMap,
    next_build_id: AtomicU64,
    config: CacheConfig,
    counters: Counters,
}

impl Default for FormCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FormCache {
    /// Create an empty cache with default settings.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            inflight: Arc::new(Mutex::new(HashMap::new())),
            next_build_id: AtomicU64::new(0),
            config,
            counters: Counters::default(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Return the cached form for `request`, building it on a miss.
    ///
    /// With `force_rebuild` the lookup is skipped, the assembler always runs,
    /// and a successful result replaces any existing entry. A failed build
    /// leaves the map untouched, so a previously cached form stays available.
    pub async fn get_or_build(
        &self,
        request: &FormRequest,
        force_rebuild: bool,
        assembler: &dyn FormAssembler,
    ) -> formwright_core::Result<Arc<Form>> {
        let key = CacheKey::compute(request)?;

        if force_rebuild {
            debug!(form = %request.name, key = %key.short(), "Forced rebuild");
            return self.build(&key, request, assembler).await;
        }

        // 1. Fast path
        if let Some(form) = self.entries.read().await.get(&key).cloned() {
            Counters::bump(&self.counters.hits);
            debug!(form = %request.name, key = %key.short(), "Form cache hit");
            return Ok(form);
        }
        Counters::bump(&self.counters.misses);

        if !self.config.deduplicate {
            return self.build(&key, request, assembler).await;
        }

        // 2. Leader election
        let guard = {
            let mut inflight = lock_inflight(&self.inflight);
            match inflight.get(&key) {
                Some(existing) => Err(existing.rx.clone()),
                None => {
                    let id = self.next_build_id.fetch_add(1, Ordering::Relaxed);
                    let (tx, rx) = watch::channel(None);
                    inflight.insert(key.clone(), InFlight { id, rx });
                    Ok(BuildGuard {
                        key: key.clone(),
                        id,
                        tx,
                        inflight: Arc::clone(&self.inflight),
                    })
                }
            }
        };

        let guard = match guard {
            Ok(guard) => guard,
            Err(rx) => {
                Counters::bump(&self.counters.shared_builds);
                debug!(form = %request.name, key = %key.short(), "Waiting on in-flight build");
                return wait_for_leader(rx, &request.name).await;
            }
        };

        // 3. Leader work
        if let Some(form) = self.entries.read().await.get(&key).cloned() {
            return guard.complete(Ok(form));
        }

        let result = self.build(&key, request, assembler).await;
        guard.complete(result)
    }

    /// Run the assembler and store a successful result.
    async fn build(
        &self,
        key: &CacheKey,
        request: &FormRequest,
        assembler: &dyn FormAssembler,
    ) -> BuildResult {
        Counters::bump(&self.counters.builds);
        let started = Instant::now();

        let outcome = match self.config.build_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, assembler.assemble(request)).await {
                Ok(result) => result.map_err(FormCacheError::from),
                Err(_) => Err(FormCacheError::Timeout {
                    form: request.name.clone(),
                    timeout,
                }),
            },
            None => assembler.assemble(request).await.map_err(FormCacheError::from),
        };

        match outcome {
            Ok(form) => {
                let form = Arc::new(form);
                let replaced = self
                    .entries
                    .write()
                    .await
                    .insert(key.clone(), Arc::clone(&form))
                    .is_some();
                info!(
                    form = %request.name,
                    key = %key.short(),
                    fields = form.fields.len(),
                    replaced,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Form assembled and cached"
                );
                Ok(form)
            }
            Err(e) => {
                Counters::bump(&self.counters.failures);
                warn!(
                    form = %request.name,
                    key = %key.short(),
                    error = %e,
                    "Form build failed; cache left unchanged"
                );
                Err(e)
            }
        }
    }

    /// Cached form for `request`, without building.
    pub async fn get(&self, request: &FormRequest) -> Option<Arc<Form>> {
        let key = CacheKey::compute(request).ok()?;
        self.entries.read().await.get(&key).cloned()
    }

    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.entries.read().await.contains_key(key)
    }

    /// Drop the entry for `request`. Returns whether one existed.
    pub async fn invalidate(&self, request: &FormRequest) -> formwright_core::Result<bool> {
        let key = CacheKey::compute(request)?;
        let removed = self.entries.write().await.remove(&key).is_some();
        if removed {
            debug!(form = %request.name, key = %key.short(), "Form cache entry invalidated");
        }
        Ok(removed)
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            builds: self.counters.builds.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            shared_builds: self.counters.shared_builds.load(Ordering::Relaxed),
            entries: self.len().await,
        }
    }
}

fn lock_inflight(map: &InFlightMap) -> std::sync::MutexGuard<'_, HashMap<CacheKey, InFlight>> {
    map.lock().unwrap_or_else(|e| e.into_inner())
}

async fn wait_for_leader(
    mut rx: watch::Receiver<Option<BuildResult>>,
    form: &str,
) -> BuildResult {
    loop {
        let published = rx.borrow_and_update().clone();
        if let Some(result) = published {
            return result;
        }
        if rx.changed().await.is_err() {
            // Leader gone; it may still have published right before dropping.
            let last = rx.borrow().clone();
            return last.unwrap_or_else(|| {
                Err(FormCacheError::BuildAbandoned {
                    form: form.to_string(),
                })
            });
        }
    }
}

/// Held by the leader of an in-flight build.
///
/// Dropping it without [`complete`](Self::complete) (leader cancelled or
/// panicked) removes the in-flight entry and closes the channel, so waiters
/// fail with `BuildAbandoned` instead of hanging.
struct BuildGuard {
    key: CacheKey,
    id: u64,
    tx: watch::Sender<Option<BuildResult>>,
    inflight: InFlightMap,
}

impl BuildGuard {
    /// Publish the result to waiters.
    ///
    /// The in-flight slot is released first, so a caller arriving after the
    /// result is visible starts its own build instead of joining this one.
    fn complete(self, result: BuildResult) -> BuildResult {
        self.release();
        // No receivers is fine: nobody waited.
        let _ = self.tx.send(Some(result.clone()));
        result
    }

    fn release(&self) {
        let mut inflight = lock_inflight(&self.inflight);
        // Only remove our own entry; a later leader may own the key by now.
        if inflight.get(&self.key).is_some_and(|entry| entry.id == self.id) {
            inflight.remove(&self.key);
        }
    }
}

impl Drop for BuildGuard {
    fn drop(&mut self) {
        self.release();
    }
}
