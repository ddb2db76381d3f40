/// Collection of caches, at most one per renderer.
///
/// Each entry is in one of two states:
/// - `Ready`: a published cache, with its own touch tracker (touched = stale)
/// - `Building`: a renderer is creating or rebuilding the cache; the previous
///   cache, if any, is kept for size queries
///
/// [`PerConsumerCache::acquire`] resolves an entry atomically. Exactly one
/// caller gets to build a missing or stale cache; concurrent callers for the
/// same renderer wait until it is published (or abandoned) and resolve again.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use crate::renderer::RendererId;
use crate::utils::{lock, Touchable};
use super::cached_renderable::RenderCache;

enum EntryState<C: ?Sized> {
    Building { previous: Option<Arc<C>> },
    Ready(Arc<C>),
}

struct Entry<C: ?Sized> {
    renderer: RendererId,
    state: EntryState<C>,
    touch: Touchable,
}

/// Outcome of [`PerConsumerCache::acquire`]
pub enum Acquired<'a, C: ?Sized> {
    /// Up-to-date cache
    Clean(Arc<C>),
    /// Stale cache: rebuild it, then hand it back through the guard
    Stale(Arc<C>, BuildGuard<'a, C>),
    /// No cache yet: create one, then publish it through the guard
    Missing(BuildGuard<'a, C>),
}

/// Exclusive right to build the cache of one renderer.
///
/// Dropping the guard without calling [`complete`](Self::complete) abandons
/// the build: a new entry is removed, a stale one is restored (still stale).
pub struct BuildGuard<'a, C: ?Sized> {
    owner: &'a PerConsumerCache<C>,
    renderer: RendererId,
    published: bool,
}

impl<C: ?Sized> BuildGuard<'_, C> {
    pub fn renderer(&self) -> RendererId {
        self.renderer
    }

    /// Publish the built cache and wake up waiting renderers
    pub fn complete(mut self, cache: Arc<C>) {
        self.published = true;
        self.owner.publish(self.renderer, cache);
    }
}

impl<C: ?Sized> Drop for BuildGuard<'_, C> {
    fn drop(&mut self) {
        if !self.published {
            self.owner.abandon(self.renderer);
        }
    }
}

pub struct PerConsumerCache<C: ?Sized = dyn RenderCache> {
    entries: Mutex<Vec<Entry<C>>>,
    changed: Condvar,
}

impl<C: ?Sized> PerConsumerCache<C> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            changed: Condvar::new(),
        }
    }

    /// Resolve the entry of `renderer`, waiting while another caller builds it
    pub fn acquire(&self, renderer: RendererId) -> Acquired<'_, C> {
        let mut entries = lock(&self.entries);
        loop {
            let Some(index) = entries.iter().position(|e| e.renderer == renderer) else {
                entries.push(Entry {
                    renderer,
                    state: EntryState::Building { previous: None },
                    touch: Touchable::new(),
                });
                return Acquired::Missing(self.guard(renderer));
            };

            let ready = match &entries[index].state {
                EntryState::Ready(cache) => Some(cache.clone()),
                EntryState::Building { .. } => None,
            };
            let Some(cache) = ready else {
                entries = self.wait(entries);
                continue;
            };

            let entry = &mut entries[index];
            if !entry.touch.is_touched() {
                return Acquired::Clean(cache);
            }
            entry.touch.clean();
            entry.state = EntryState::Building { previous: Some(cache.clone()) };
            return Acquired::Stale(cache, self.guard(renderer));
        }
    }

    /// Current cache of `renderer` (the previous one while it is rebuilt)
    pub fn get(&self, renderer: RendererId) -> Option<Arc<C>> {
        lock(&self.entries)
            .iter()
            .find(|e| e.renderer == renderer)
            .and_then(|e| match &e.state {
                EntryState::Ready(cache) => Some(cache.clone()),
                EntryState::Building { previous } => previous.clone(),
            })
    }

    pub fn contains(&self, renderer: RendererId) -> bool {
        lock(&self.entries).iter().any(|e| e.renderer == renderer)
    }

    /// Remove the entry of `renderer`. No-op if there is none.
    pub fn remove(&self, renderer: RendererId) -> Option<Arc<C>> {
        let removed = {
            let mut entries = lock(&self.entries);
            let index = entries.iter().position(|e| e.renderer == renderer)?;
            entries.remove(index)
        };
        self.changed.notify_all();
        match removed.state {
            EntryState::Ready(cache) => Some(cache),
            EntryState::Building { previous } => previous,
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ===== TOUCH STATE =====

    /// Mark every entry stale
    pub fn touch_all(&self) {
        for entry in lock(&self.entries).iter() {
            entry.touch.touch();
        }
    }

    pub fn clean_all(&self) {
        for entry in lock(&self.entries).iter() {
            entry.touch.clean();
        }
    }

    pub fn is_any_touched(&self) -> bool {
        lock(&self.entries).iter().any(|e| e.touch.is_touched())
    }

    pub fn is_touched(&self, renderer: RendererId) -> bool {
        lock(&self.entries)
            .iter()
            .any(|e| e.renderer == renderer && e.touch.is_touched())
    }

    // ===== INTERNALS =====

    fn guard(&self, renderer: RendererId) -> BuildGuard<'_, C> {
        BuildGuard {
            owner: self,
            renderer,
            published: false,
        }
    }

    fn wait<'a>(&self, entries: MutexGuard<'a, Vec<Entry<C>>>) -> MutexGuard<'a, Vec<Entry<C>>> {
        self.changed
            .wait(entries)
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, renderer: RendererId, cache: Arc<C>) {
        {
            let mut entries = lock(&self.entries);
            // An entry removed while building stays removed
            if let Some(entry) = entries.iter_mut().find(|e| e.renderer == renderer) {
                entry.state = EntryState::Ready(cache);
            }
        }
        self.changed.notify_all();
    }

    fn abandon(&self, renderer: RendererId) {
        {
            let mut entries = lock(&self.entries);
            if let Some(index) = entries.iter().position(|e| e.renderer == renderer) {
                let previous = match &mut entries[index].state {
                    EntryState::Building { previous } => Some(previous.take()),
                    EntryState::Ready(_) => None,
                };
                match previous {
                    // Rebuild failed: keep the old cache, still stale
                    Some(Some(cache)) => {
                        entries[index].state = EntryState::Ready(cache);
                        entries[index].touch.touch();
                    }
                    Some(None) => {
                        entries.remove(index);
                    }
                    None => {}
                }
            }
        }
        self.changed.notify_all();
    }
}

impl<C: ?Sized> Default for PerConsumerCache<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "per_consumer_cache_tests.rs"]
mod tests;
