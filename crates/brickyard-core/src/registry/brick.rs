//! Brick registry.
//!
//! An explicitly constructed handle; clones share the same storage. Type
//! inference results are memoized per registry generation, and concurrent
//! callers share one in-flight computation.

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use brickyard_protocols::{Brick, BrickError, BrickType, RegistryId};

use super::BrickSource;
use crate::inference::{infer_type, TypedBrickPair};

/// Typed bricks keyed by id.
pub type TypedBricks = Arc<BTreeMap<RegistryId, TypedBrickPair>>;

type SharedTyped = Shared<BoxFuture<'static, TypedBricks>>;

const EVENT_CAPACITY: usize = 64;

/// Change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    Registered(Vec<RegistryId>),
    Removed(RegistryId),
    Cleared,
}

struct RegistryInner {
    bricks: DashMap<RegistryId, Brick>,
    sources: RwLock<Vec<Arc<dyn BrickSource>>>,
    loaded: AtomicBool,
    load_lock: tokio::sync::Mutex<()>,
    generation: AtomicU64,
    typed: Mutex<Option<(u64, SharedTyped)>>,
    events: broadcast::Sender<RegistryEvent>,
}

/// Registry of bricks by id.
#[derive(Clone)]
pub struct BrickRegistry {
    inner: Arc<RegistryInner>,
}

impl BrickRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(RegistryInner {
                bricks: DashMap::new(),
                sources: RwLock::new(Vec::new()),
                loaded: AtomicBool::new(false),
                load_lock: tokio::sync::Mutex::new(()),
                generation: AtomicU64::new(0),
                typed: Mutex::new(None),
                events,
            }),
        }
    }

    /// Add a source consulted on the next load.
    pub fn add_source(&self, source: Arc<dyn BrickSource>) {
        self.inner.sources.write().push(source);
        self.inner.loaded.store(false, Ordering::Release);
    }

    /// Register bricks. An existing brick with the same id is replaced.
    pub fn register(&self, bricks: impl IntoIterator<Item = Brick>) {
        let ids: Vec<RegistryId> = bricks
            .into_iter()
            .map(|brick| {
                let id = brick.id().clone();
                self.inner.bricks.insert(id.clone(), brick);
                id
            })
            .collect();
        if ids.is_empty() {
            return;
        }
        debug!(count = ids.len(), "Registered bricks");
        self.invalidate();
        let _ = self.inner.events.send(RegistryEvent::Registered(ids));
    }

    /// Remove a brick. Returns whether it was present.
    pub fn remove(&self, id: &RegistryId) -> bool {
        let removed = self.inner.bricks.remove(id).is_some();
        if removed {
            self.invalidate();
            let _ = self.inner.events.send(RegistryEvent::Removed(id.clone()));
        }
        removed
    }

    /// Get a brick without consulting sources.
    pub fn get(&self, id: &RegistryId) -> Option<Brick> {
        self.inner.bricks.get(id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: &RegistryId) -> bool {
        self.inner.bricks.contains_key(id)
    }

    /// Look up a brick, loading sources at least once before giving up.
    pub async fn lookup(&self, id: &RegistryId) -> Result<Brick, BrickError> {
        if let Some(brick) = self.get(id) {
            return Ok(brick);
        }
        self.ensure_loaded().await;
        self.get(id)
            .ok_or_else(|| BrickError::BrickNotFound(id.clone()))
    }

    /// All bricks, loading sources if needed.
    pub async fn all(&self) -> Vec<Brick> {
        self.ensure_loaded().await;
        let mut bricks: Vec<Brick> = self
            .inner
            .bricks
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        bricks.sort_by(|a, b| a.id().cmp(b.id()));
        bricks
    }

    /// All registered ids, sorted.
    pub fn ids(&self) -> Vec<RegistryId> {
        let mut ids: Vec<RegistryId> = self.inner.bricks.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.inner.bricks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.bricks.is_empty()
    }

    /// Infer the type of a single brick against the current registry contents.
    pub fn infer(&self, brick: &Brick) -> Result<BrickType, BrickError> {
        Ok(infer_type(brick, |id| self.get(id))?)
    }

    /// Every brick paired with its inferred type.
    ///
    /// Bricks whose type cannot be inferred are left out. The result is
    /// cached until the registry changes.
    pub async fn all_typed(&self) -> TypedBricks {
        self.ensure_loaded().await;
        let shared = {
            let generation = self.inner.generation.load(Ordering::Acquire);
            let mut typed = self.inner.typed.lock();
            match typed.as_ref() {
                Some((cached, future)) if *cached == generation => future.clone(),
                _ => {
                    let future = compute_typed(Arc::downgrade(&self.inner)).boxed().shared();
                    *typed = Some((generation, future.clone()));
                    future
                }
            }
        };
        shared.await
    }

    /// Remove every brick and forget all caches. Sources are kept and reloaded on demand.
    pub fn clear(&self) {
        self.inner.bricks.clear();
        self.inner.loaded.store(false, Ordering::Release);
        self.invalidate();
        let _ = self.inner.events.send(RegistryEvent::Cleared);
        info!("Brick registry cleared");
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.inner.events.subscribe()
    }

    fn invalidate(&self) {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        *self.inner.typed.lock() = None;
    }

    async fn ensure_loaded(&self) {
        if self.inner.loaded.load(Ordering::Acquire) {
            return;
        }
        let _guard = self.inner.load_lock.lock().await;
        if self.inner.loaded.load(Ordering::Acquire) {
            return;
        }
        let sources: Vec<Arc<dyn BrickSource>> = self.inner.sources.read().clone();
        for source in sources {
            match source.load().await {
                Ok(bricks) => {
                    debug!(source = source.name(), count = bricks.len(), "Loaded bricks");
                    self.register(bricks);
                }
                Err(e) => warn!(source = source.name(), error = %e, "Failed to load bricks"),
            }
        }
        self.inner.loaded.store(true, Ordering::Release);
    }
}

impl Default for BrickRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BrickRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrickRegistry")
            .field("bricks", &self.len())
            .field("generation", &self.inner.generation.load(Ordering::Relaxed))
            .finish()
    }
}

async fn compute_typed(inner: Weak<RegistryInner>) -> TypedBricks {
    let Some(inner) = inner.upgrade() else {
        return Arc::new(BTreeMap::new());
    };
    let snapshot: BTreeMap<RegistryId, Brick> = inner
        .bricks
        .iter()
        .map(|entry| (entry.key().clone(), entry.value().clone()))
        .collect();

    let mut typed = BTreeMap::new();
    for (id, brick) in &snapshot {
        match infer_type(brick, |inner_id| snapshot.get(inner_id).cloned()) {
            Ok(brick_type) => {
                typed.insert(
                    id.clone(),
                    TypedBrickPair {
                        brick: brick.clone(),
                        brick_type,
                    },
                );
            }
            Err(e) => warn!(brick_id = %id, error = %e, "Omitting brick with uninferrable type"),
        }
    }
    Arc::new(typed)
}

#[cfg(test)]
#[path = "brick_tests.rs"]
mod tests;
