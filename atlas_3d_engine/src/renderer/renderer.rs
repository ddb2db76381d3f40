/// Renderer: the consumer identity under which caches, commands and GPU
/// buffers are created.
///
/// A renderer owns three registries a backend can customize:
/// - render command constructors, keyed by name (`"standard"` by default)
/// - render cache constructors, one per cached renderable kind
/// - buffer storage constructors, inside its [`RenderHdwBufferManager`]
///
/// Everything built for a renderer is tagged with its [`RendererId`]; caches
/// and buffers of another renderer are rejected with `InvalidConsumer`.

use std::fmt;
use std::sync::{Arc, Weak};
use crate::buffer::{BufferManagerDesc, HardwareBuffer, HardwareBufferType, RenderHdwBuffer, RenderHdwBufferManager};
use crate::cache::{CacheFactory, CachedRenderable, RenderCache};
use crate::error::Result;
use crate::resource::{Material, MaterialCache, Mesh, MeshCache, Transformation, TransformationCache};
use crate::utils::{Factory, IndexCounter};
use crate::{engine_bail, engine_debug, engine_info};
use super::command::{RenderCommand, StandardCommand};

const SOURCE: &str = "atlas3d::Renderer";

/// Key of the default command constructor
pub const STANDARD_COMMAND: &str = "standard";

static RENDERER_IDS: IndexCounter = IndexCounter::new();

/// Unique identity of a renderer, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RendererId(u64);

impl RendererId {
    pub(crate) fn next() -> Self {
        Self(RENDERER_IDS.next())
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RendererId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Render command constructors
pub type CommandFactory = Factory<&'static str, Arc<dyn RenderCommand>, Weak<Renderer>>;

/// Renderer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RendererDesc {
    pub name: String,
    pub buffers: BufferManagerDesc,
}

impl Default for RendererDesc {
    fn default() -> Self {
        Self {
            name: "renderer".to_string(),
            buffers: BufferManagerDesc::default(),
        }
    }
}

pub struct Renderer {
    id: RendererId,
    name: String,
    commands: CommandFactory,
    caches: CacheFactory,
    buffers: Arc<RenderHdwBufferManager>,
}

impl Renderer {
    /// Create a renderer with the default command, caches and host-memory
    /// buffer storage registered
    pub fn new(desc: RendererDesc) -> Arc<Self> {
        let id = RendererId::next();

        let commands = CommandFactory::new("atlas3d::CommandFactory");
        commands.register(STANDARD_COMMAND, move |renderer: &Weak<Renderer>| {
            Ok(Arc::new(StandardCommand::new(id, renderer.clone())) as Arc<dyn RenderCommand>)
        });

        let caches = CacheFactory::new();
        caches.register::<Material, _>(|material, renderer| {
            Ok(Arc::new(MaterialCache::new(material, renderer.id())) as Arc<dyn RenderCache>)
        });
        caches.register::<Transformation, _>(|transformation, renderer| {
            Ok(Arc::new(TransformationCache::new(transformation, renderer.id())) as Arc<dyn RenderCache>)
        });
        caches.register::<Mesh, _>(|mesh, renderer| {
            Ok(Arc::new(MeshCache::new(mesh, renderer.id())) as Arc<dyn RenderCache>)
        });

        let renderer = Arc::new(Self {
            id,
            name: desc.name,
            commands,
            caches,
            buffers: RenderHdwBufferManager::new(id, desc.buffers),
        });
        engine_info!(SOURCE, "Renderer '{}' created ({})", renderer.name, id);
        renderer
    }

    // ===== ACCESSORS =====

    pub fn id(&self) -> RendererId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render command constructors (backends register their commands here)
    pub fn commands(&self) -> &CommandFactory {
        &self.commands
    }

    /// Render cache constructors
    pub fn caches(&self) -> &CacheFactory {
        &self.caches
    }

    /// GPU buffers of this renderer
    pub fn hdw_buffers(&self) -> &Arc<RenderHdwBufferManager> {
        &self.buffers
    }

    // ===== COMMANDS =====

    /// Register (or replace) the command constructor for `kind`.
    /// Returns true if a previous constructor was replaced.
    pub fn set_command_constructor<F>(&self, kind: &'static str, constructor: F) -> bool
    where
        F: Fn(&Weak<Renderer>) -> Result<Arc<dyn RenderCommand>> + Send + Sync + 'static,
    {
        self.commands.register(kind, constructor)
    }

    /// New command of the default kind
    pub fn new_command(self: &Arc<Self>) -> Result<Arc<dyn RenderCommand>> {
        self.new_command_of(STANDARD_COMMAND)
    }

    /// New command built by the constructor registered under `kind`
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing is registered under `kind`, `InvalidConsumer` if
    /// the constructor returns a command of another renderer.
    pub fn new_command_of(self: &Arc<Self>, kind: &'static str) -> Result<Arc<dyn RenderCommand>> {
        let command = self.commands.construct(&kind, &Arc::downgrade(self))?;
        if command.renderer_id() != self.id {
            engine_bail!(SOURCE, InvalidConsumer,
                "Command '{}' was built for renderer {} instead of {}", kind, command.renderer_id(), self.id);
        }
        Ok(command)
    }

    /// Run a recorded command (prepare / execute / finish of its sub-commands)
    ///
    /// # Errors
    ///
    /// `InvalidConsumer` if the command belongs to another renderer.
    pub fn submit(&self, command: &dyn RenderCommand) -> Result<()> {
        if command.renderer_id() != self.id {
            engine_bail!(SOURCE, InvalidConsumer,
                "Command of renderer {} submitted to renderer {}", command.renderer_id(), self.id);
        }
        engine_debug!(SOURCE, "Submitting {}", command.label());
        command.prepare()?;
        command.execute()?;
        command.finish()
    }

    // ===== CACHES =====

    /// Register (or replace) the cache constructor of `T`
    pub fn set_cache_constructor<T, F>(&self, constructor: F) -> bool
    where
        T: CachedRenderable + 'static,
        F: Fn(&Arc<T>, &Renderer) -> Result<Arc<dyn RenderCache>> + Send + Sync + 'static,
    {
        self.caches.register::<T, F>(constructor)
    }

    /// Build a new cache of this renderer for `owner`
    ///
    /// # Errors
    ///
    /// `NotFound` if no constructor is registered for `T`, `InvalidConsumer`
    /// if the constructor returns a cache of another renderer.
    pub fn new_cache<T: CachedRenderable + 'static>(&self, owner: &Arc<T>) -> Result<Arc<dyn RenderCache>> {
        let cache = self.caches.construct(owner, self)?;
        if !cache.is_from(self.id) {
            engine_bail!(SOURCE, InvalidConsumer,
                "{} cache was built for renderer {} instead of {}", T::CACHE_KIND, cache.renderer(), self.id);
        }
        Ok(cache)
    }

    // ===== BUFFERS =====

    /// Create a registered GPU buffer of `size` bytes
    pub fn new_hdw_buffer(
        &self,
        buffer_type: HardwareBufferType,
        size: usize,
        data: Option<&[u8]>,
    ) -> Result<Arc<RenderHdwBuffer>> {
        let buffer = self.buffers.new_buffer(buffer_type, size, data)?;
        engine_debug!(SOURCE, "New {:?} buffer #{} ({} bytes)", buffer_type, buffer.index(), size);
        Ok(buffer)
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
