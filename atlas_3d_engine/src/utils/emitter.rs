/// Listener registry.
///
/// Listeners are registered as `Arc<L>` and kept weakly: an emitter never
/// extends a listener's lifetime, and dropped listeners are purged on the next
/// notification. Notifications are synchronous and run without the registry
/// lock held, so a listener may add or remove listeners (or trigger another
/// notification) from inside its callback.

use std::sync::{Arc, Mutex, Weak};
use slotmap::{new_key_type, SlotMap};
use super::sync::lock;

new_key_type! {
    /// Handle returned by [`Emitter::add_listener`], used to remove the listener
    pub struct ListenerKey;
}

pub struct Emitter<L: ?Sized> {
    listeners: Mutex<SlotMap<ListenerKey, Weak<L>>>,
}

impl<L: ?Sized> Emitter<L> {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(SlotMap::with_key()),
        }
    }

    /// Register a listener (kept as a weak reference)
    pub fn add_listener(&self, listener: &Arc<L>) -> ListenerKey {
        lock(&self.listeners).insert(Arc::downgrade(listener))
    }

    /// Unregister a listener. Returns false if the key is unknown.
    pub fn remove_listener(&self, key: ListenerKey) -> bool {
        lock(&self.listeners).remove(key).is_some()
    }

    /// Number of listeners still alive
    pub fn listeners_count(&self) -> usize {
        lock(&self.listeners)
            .values()
            .filter(|l| l.strong_count() > 0)
            .count()
    }

    /// Call `f` on every live listener
    pub fn send(&self, mut f: impl FnMut(&L)) {
        let alive: Vec<Arc<L>> = {
            let mut listeners = lock(&self.listeners);
            listeners.retain(|_, l| l.strong_count() > 0);
            listeners.values().filter_map(Weak::upgrade).collect()
        };

        for listener in &alive {
            f(listener);
        }
    }
}

impl<L: ?Sized> Default for Emitter<L> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "emitter_tests.rs"]
mod tests;
