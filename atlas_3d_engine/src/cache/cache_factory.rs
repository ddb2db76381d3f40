/// Per-renderer registry of cache constructors.
///
/// One constructor per [`CachedRenderable`] kind, keyed by
/// `CachedRenderable::CACHE_KIND`. Constructors are stored with their full
/// signature (`Fn(&Arc<T>, &Renderer)`); registering a constructor for `T`
/// and looking it up for `T` always agree on the type.

use std::any::Any;
use std::sync::{Arc, RwLock};
use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::renderer::Renderer;
use crate::utils::{read, write};
use crate::engine_bail;
use super::cached_renderable::{CachedRenderable, RenderCache};

type CacheConstructor<T> = Arc<dyn Fn(&Arc<T>, &Renderer) -> Result<Arc<dyn RenderCache>> + Send + Sync>;

pub struct CacheFactory {
    constructors: RwLock<FxHashMap<&'static str, Box<dyn Any + Send + Sync>>>,
}

impl CacheFactory {
    pub fn new() -> Self {
        Self {
            constructors: RwLock::new(FxHashMap::default()),
        }
    }

    /// Register (or replace) the cache constructor of `T`.
    /// Returns true if a previous constructor was replaced.
    pub fn register<T, F>(&self, constructor: F) -> bool
    where
        T: CachedRenderable + 'static,
        F: Fn(&Arc<T>, &Renderer) -> Result<Arc<dyn RenderCache>> + Send + Sync + 'static,
    {
        let constructor: CacheConstructor<T> = Arc::new(constructor);
        write(&self.constructors)
            .insert(T::CACHE_KIND, Box::new(constructor))
            .is_some()
    }

    pub fn contains(&self, kind: &str) -> bool {
        read(&self.constructors).contains_key(kind)
    }

    pub fn unregister(&self, kind: &str) -> bool {
        write(&self.constructors).remove(kind).is_some()
    }

    /// Build a cache for `owner` with the constructor registered for `T`
    ///
    /// # Errors
    ///
    /// `NotFound` if no constructor of `T` is registered.
    pub fn construct<T>(&self, owner: &Arc<T>, renderer: &Renderer) -> Result<Arc<dyn RenderCache>>
    where
        T: CachedRenderable + 'static,
    {
        let constructor = read(&self.constructors)
            .get(T::CACHE_KIND)
            .and_then(|c| c.downcast_ref::<CacheConstructor<T>>())
            .cloned();

        match constructor {
            Some(constructor) => constructor(owner, renderer),
            None => engine_bail!("atlas3d::CacheFactory", NotFound,
                "No {} cache constructor for renderer {}", T::CACHE_KIND, renderer.id()),
        }
    }
}

impl Default for CacheFactory {
    fn default() -> Self {
        Self::new()
    }
}
