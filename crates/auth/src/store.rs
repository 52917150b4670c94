//! Process-wide permission state.
//!
//! The store holds exactly one [`PermissionMap`] at a time. Readers take a
//! cheap [`PermissionSnapshot`] and never observe a half-updated map: the only
//! write operation is [`PermissionStore::replace`], a whole-map swap.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::PermissionMap;

type Listener = Arc<dyn Fn(&PermissionSnapshot) + Send + Sync>;

/// Handle returned by [`PermissionStore::subscribe`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Immutable view of the permission map at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSnapshot {
    generation: u64,
    map: Arc<PermissionMap>,
}

impl PermissionSnapshot {
    fn empty() -> Self {
        Self {
            generation: 0,
            map: Arc::new(PermissionMap::new()),
        }
    }

    /// Number of `replace` calls that preceded this snapshot.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, key: &str) -> bool {
        self.map.is_granted(key)
    }

    pub fn map(&self) -> &PermissionMap {
        &self.map
    }
}

impl Default for PermissionSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Holder of the current [`PermissionMap`].
///
/// Only the session provider writes it; everything else reads through
/// [`get`](Self::get) or [`snapshot`](Self::snapshot).
pub struct PermissionStore {
    current: RwLock<PermissionSnapshot>,
    listeners: RwLock<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

impl core::fmt::Debug for PermissionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PermissionStore")
            .field("current", &self.snapshot())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl PermissionStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(PermissionSnapshot::empty()),
            listeners: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Whether `key` is granted in the current map. Absent keys are denied.
    pub fn get(&self, key: &str) -> bool {
        self.snapshot().get(key)
    }

    /// Current snapshot.
    ///
    /// A poisoned lock yields the empty map (fail-closed).
    pub fn snapshot(&self) -> PermissionSnapshot {
        match self.current.read() {
            Ok(current) => current.clone(),
            Err(_) => PermissionSnapshot::empty(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.snapshot().generation
    }

    /// Swap in a new map and notify listeners with the resulting snapshot.
    pub fn replace(&self, map: PermissionMap) -> PermissionSnapshot {
        let snapshot = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            let next = PermissionSnapshot {
                generation: current.generation + 1,
                map: Arc::new(map),
            };
            *current = next.clone();
            next
        };

        tracing::debug!(
            generation = snapshot.generation,
            granted = snapshot.map.granted_count(),
            "permission map replaced"
        );

        // Listeners run outside the lock so they may read the store again.
        let listeners: Vec<Listener> = match self.listeners.read() {
            Ok(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => Vec::new(),
        };
        for listener in listeners {
            listener(&snapshot);
        }

        snapshot
    }

    /// Register a listener invoked after every [`replace`](Self::replace).
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&PermissionSnapshot) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        listeners.push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    fn listener_count(&self) -> usize {
        self.listeners.read().map(|l| l.len()).unwrap_or(0)
    }
}

impl Default for PermissionStore {
    fn default() -> Self {
        Self::new()
    }
}
