//! Click-outside detection.
//!
//! A [`PointerHub`] stands in for the global pointer-event stream. Each mounted
//! row holds a [`PointerSubscription`] guard; dropping the guard removes the
//! listener, so a row that is torn down can never be notified again.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use log::trace;

use crate::geometry::Rect;

#[derive(Debug)]
struct Listener<K> {
    key: K,
    bounds: Option<Rect>,
}

#[derive(Debug)]
struct HubInner<K> {
    next_id: u64,
    listeners: HashMap<u64, Listener<K>>,
}

/// Where a click landed relative to every subscribed boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickRouting<K> {
    /// Listeners whose boundary contains the point.
    pub inside: Vec<K>,
    /// Listeners whose boundary does not contain the point.
    pub outside: Vec<K>,
}

/// Registry of click-outside listeners.
///
/// Cloning the hub yields another handle to the same registry.
pub struct PointerHub<K> {
    inner: Arc<RwLock<HubInner<K>>>,
}

impl<K> Clone for PointerHub<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for PointerHub<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerHub")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<K> Default for PointerHub<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> PointerHub<K> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HubInner {
                next_id: 0,
                listeners: HashMap::new(),
            })),
        }
    }

    /// Register a listener identified by `key`.
    pub fn subscribe(&self, key: K) -> PointerSubscription<K>
    where
        K: Clone,
    {
        let id = match self.inner.write() {
            Ok(mut guard) => {
                let id = guard.next_id;
                guard.next_id += 1;
                guard.listeners.insert(
                    id,
                    Listener {
                        key: key.clone(),
                        bounds: None,
                    },
                );
                id
            }
            Err(_) => u64::MAX,
        };
        PointerSubscription {
            id,
            key,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Number of live listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.read().map(|g| g.listeners.len()).unwrap_or(0)
    }

    /// Route a click at `(x, y)`.
    ///
    /// Listeners that have not been laid out yet are skipped.
    pub fn click(&self, x: u16, y: u16) -> ClickRouting<K>
    where
        K: Clone,
    {
        let mut routing = ClickRouting {
            inside: Vec::new(),
            outside: Vec::new(),
        };
        let Ok(guard) = self.inner.read() else {
            return routing;
        };

        let mut listeners: Vec<_> = guard.listeners.iter().collect();
        listeners.sort_by_key(|(id, _)| **id);
        for (_, listener) in listeners {
            let Some(bounds) = listener.bounds else {
                continue;
            };
            if bounds.contains(x, y) {
                routing.inside.push(listener.key.clone());
            } else {
                routing.outside.push(listener.key.clone());
            }
        }
        trace!(
            "click at ({x}, {y}): {} inside, {} outside",
            routing.inside.len(),
            routing.outside.len()
        );
        routing
    }
}

/// Guard for one registered listener. Deregisters on drop.
#[derive(Debug)]
pub struct PointerSubscription<K> {
    id: u64,
    key: K,
    hub: Weak<RwLock<HubInner<K>>>,
}

impl<K> PointerSubscription<K> {
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Update the boundary clicks are tested against.
    pub fn set_bounds(&self, bounds: Rect) {
        if let Some(hub) = self.hub.upgrade()
            && let Ok(mut guard) = hub.write()
            && let Some(listener) = guard.listeners.get_mut(&self.id)
        {
            listener.bounds = Some(bounds);
        }
    }

    pub fn bounds(&self) -> Option<Rect> {
        let hub = self.hub.upgrade()?;
        let guard = hub.read().ok()?;
        guard.listeners.get(&self.id).and_then(|l| l.bounds)
    }
}

impl<K> Drop for PointerSubscription<K> {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade()
            && let Ok(mut guard) = hub.write()
        {
            guard.listeners.remove(&self.id);
        }
    }
}
