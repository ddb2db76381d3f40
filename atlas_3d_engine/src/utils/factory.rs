/// Typed constructor registry keyed by a stable tag.
///
/// Backends register one constructor per key (buffer type, command kind...).
/// The constructor signature is part of the registry type, so a mismatched
/// constructor is rejected at compile time when it is registered.
///
/// ```ignore
/// let factory: Factory<&'static str, Arc<dyn RenderCommand>, Weak<Renderer>> =
///     Factory::new("atlas3d::CommandFactory");
/// factory.register("standard", move |renderer| Ok(Arc::new(StandardCommand::new(id, renderer.clone())) as _));
/// let command = factory.construct(&"standard", &renderer_weak)?;
/// ```

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, RwLock};
use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::engine_bail;
use super::sync::{read, write};

/// Shared constructor function
pub type Constructor<R, A> = Arc<dyn Fn(&A) -> Result<R> + Send + Sync>;

pub struct Factory<K, R, A = ()> {
    source: &'static str,
    constructors: RwLock<FxHashMap<K, Constructor<R, A>>>,
}

impl<K, R, A> Factory<K, R, A>
where
    K: Eq + Hash + Clone + Debug,
{
    /// Create an empty factory. `source` is the log source used for errors.
    pub fn new(source: &'static str) -> Self {
        Self {
            source,
            constructors: RwLock::new(FxHashMap::default()),
        }
    }

    /// Register (or replace) the constructor for `key`.
    /// Returns true if a previous constructor was replaced.
    pub fn register<F>(&self, key: K, constructor: F) -> bool
    where
        F: Fn(&A) -> Result<R> + Send + Sync + 'static,
    {
        write(&self.constructors)
            .insert(key, Arc::new(constructor))
            .is_some()
    }

    pub fn unregister(&self, key: &K) -> bool {
        write(&self.constructors).remove(key).is_some()
    }

    pub fn contains(&self, key: &K) -> bool {
        read(&self.constructors).contains_key(key)
    }

    pub fn len(&self) -> usize {
        read(&self.constructors).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Construct a product with the constructor registered for `key`.
    ///
    /// The registry lock is released before the constructor runs.
    pub fn construct(&self, key: &K, args: &A) -> Result<R> {
        let constructor = read(&self.constructors).get(key).cloned();
        match constructor {
            Some(constructor) => constructor(args),
            None => engine_bail!(self.source, NotFound,
                "No constructor registered for {:?}", key),
        }
    }
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
