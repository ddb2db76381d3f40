/// Cached rendering protocol.
///
/// [`CachedRenderable::render_cached`] resolves the acting renderer from the
/// command and takes one of three paths:
/// 1. no cache for this renderer: create it with `make_new_cache`, build it,
///    publish it, render it
/// 2. stale cache: rebuild it in place, then render it
/// 3. clean cache: render it
///
/// The resolution is a single pass; renderers racing on the same object wait
/// for the one building the cache instead of building their own.

use std::sync::Arc;
use crate::error::Result;
use crate::renderer::{RenderCommand, Renderer, RendererId};
use crate::{engine_bail, engine_debug};
use super::per_consumer_cache::{Acquired, PerConsumerCache};

/// Renderer-specific derived state of a domain object
pub trait RenderCache: Send + Sync {
    /// Renderer the cache was created for
    fn renderer(&self) -> RendererId;

    fn is_from(&self, renderer: RendererId) -> bool {
        self.renderer() == renderer
    }

    /// (Re)compute the cache from its owner's current state
    fn build(&self, renderer: &Renderer) -> Result<()>;

    /// Record the cached state into `command`
    fn render(&self, command: &dyn RenderCommand) -> Result<()>;

    /// Bytes held by the cache
    fn size(&self) -> usize {
        0
    }
}

pub trait CachedRenderable: Send + Sync {
    /// Stable name of the cached kind, key of the renderer's cache registry
    const CACHE_KIND: &'static str;

    fn caches(&self) -> &PerConsumerCache;

    /// Create (not build) a new cache for `renderer`
    fn make_new_cache(&self, renderer: &Renderer) -> Result<Arc<dyn RenderCache>>;

    /// Make sure the cache of `renderer` exists and is up to date
    fn build_cache(&self, renderer: &Renderer) -> Result<Arc<dyn RenderCache>> {
        match self.caches().acquire(renderer.id()) {
            Acquired::Clean(cache) => Ok(cache),
            Acquired::Stale(cache, guard) => {
                cache.build(renderer)?;
                guard.complete(cache.clone());
                Ok(cache)
            }
            Acquired::Missing(guard) => {
                let cache = self.make_new_cache(renderer)?;
                if !cache.is_from(renderer.id()) {
                    engine_bail!("atlas3d::CachedRenderable", InvalidConsumer,
                        "New {} cache belongs to renderer {} instead of {}",
                        Self::CACHE_KIND, cache.renderer(), renderer.id());
                }
                cache.build(renderer)?;
                engine_debug!("atlas3d::CachedRenderable", "Created {} cache for renderer {}",
                    Self::CACHE_KIND, renderer.id());
                guard.complete(cache.clone());
                Ok(cache)
            }
        }
    }

    /// Render through the cache of the command's renderer
    fn render_cached(&self, command: &dyn RenderCommand) -> Result<()> {
        let renderer = command.renderer()?;
        self.build_cache(&renderer)?.render(command)
    }

    /// Mark the caches of every renderer stale
    fn touch_caches(&self) {
        self.caches().touch_all();
    }

    fn is_any_cache_touched(&self) -> bool {
        self.caches().is_any_touched()
    }

    fn clean_caches(&self) {
        self.caches().clean_all();
    }

    fn has_cache_for(&self, renderer: RendererId) -> bool {
        self.caches().contains(renderer)
    }

    fn caches_count(&self) -> usize {
        self.caches().len()
    }

    /// Bytes held by the cache of `renderer`, 0 without cache
    fn cached_size(&self, renderer: RendererId) -> usize {
        self.caches().get(renderer).map_or(0, |cache| cache.size())
    }

    /// Drop the cache of `renderer`. No-op if there is none.
    fn remove_cache(&self, renderer: RendererId) {
        self.caches().remove(renderer);
    }
}

#[cfg(test)]
#[path = "cached_renderable_tests.rs"]
mod tests;
