//! Per-renderer caches.
//!
//! A domain object (material, transformation, mesh) stays renderer-agnostic
//! and keeps one [`RenderCache`] per renderer in a [`PerConsumerCache`]. The
//! [`CachedRenderable`] trait drives lazy creation, rebuild of stale caches
//! and invalidation.

mod cache_factory;
mod cached_renderable;
mod per_consumer_cache;

pub use cache_factory::CacheFactory;
pub use cached_renderable::{CachedRenderable, RenderCache};
pub use per_consumer_cache::{Acquired, BuildGuard, PerConsumerCache};
