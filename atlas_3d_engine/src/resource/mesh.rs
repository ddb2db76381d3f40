/// Geometry held in CPU memory buffers.
///
/// A mesh owns a vertex [`MemBuffer`] and an optional index buffer. Its
/// [`MeshCache`] mirrors them on the renderer's GPU buffer manager, where
/// mirrors are shared by every mesh referencing the same CPU buffer.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use bytemuck::Pod;
use crate::buffer::{HardwareBuffer, HardwareBufferType, MemBuffer, RenderHdwBuffer};
use crate::cache::{CachedRenderable, PerConsumerCache, RenderCache};
use crate::error::Result;
use crate::renderer::{DrawCommand, RenderCommand, Renderable, Renderer, RendererId};
use crate::utils::{lock, read, write};
use crate::{engine_debug, engine_err};

fn element_count(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        engine_err!("atlas3d::Mesh", OutOfRange, "{} {} exceed the u32 draw range", len, what)
    })
}

pub struct Mesh {
    name: String,
    vertices: RwLock<Arc<MemBuffer>>,
    indices: RwLock<Option<Arc<MemBuffer>>>,
    vertex_count: AtomicU32,
    index_count: AtomicU32,
    caches: PerConsumerCache,
    self_ref: Weak<Mesh>,
}

impl Mesh {
    /// Empty mesh
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        let name = name.into();
        Arc::new_cyclic(|self_ref| Self {
            name,
            vertices: RwLock::new(Arc::new(MemBuffer::new(HardwareBufferType::Vertex))),
            indices: RwLock::new(None),
            vertex_count: AtomicU32::new(0),
            index_count: AtomicU32::new(0),
            caches: PerConsumerCache::new(),
            self_ref: self_ref.clone(),
        })
    }

    /// Mesh drawing `vertices` in order
    ///
    /// # Errors
    ///
    /// `OutOfRange` if there are more than `u32::MAX` vertices.
    pub fn from_vertices<V: Pod>(name: impl Into<String>, vertices: &[V]) -> Result<Arc<Self>> {
        let mesh = Self::new(name);
        mesh.set_vertices(vertices)?;
        Ok(mesh)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ===== GEOMETRY =====

    /// Replace the vertex buffer with the bytes of `vertices`
    pub fn set_vertices<V: Pod>(&self, vertices: &[V]) -> Result<()> {
        let count = element_count(vertices.len(), "vertices")?;
        let buffer = Arc::new(MemBuffer::from_slice(HardwareBufferType::Vertex, vertices));
        self.set_vertex_buffer(buffer, count);
        Ok(())
    }

    /// Share an existing vertex buffer holding `vertex_count` vertices
    pub fn set_vertex_buffer(&self, buffer: Arc<MemBuffer>, vertex_count: u32) {
        *write(&self.vertices) = buffer;
        self.vertex_count.store(vertex_count, Ordering::Release);
        self.touch_caches();
    }

    pub fn set_indices(&self, indices: &[u32]) -> Result<()> {
        let count = element_count(indices.len(), "indices")?;
        let buffer = Arc::new(MemBuffer::from_slice(HardwareBufferType::Index, indices));
        self.set_index_buffer(Some(buffer), count);
        Ok(())
    }

    /// Share an existing index buffer, or draw without indices (`None`)
    pub fn set_index_buffer(&self, buffer: Option<Arc<MemBuffer>>, index_count: u32) {
        let index_count = if buffer.is_some() { index_count } else { 0 };
        *write(&self.indices) = buffer;
        self.index_count.store(index_count, Ordering::Release);
        self.touch_caches();
    }

    pub fn vertex_buffer(&self) -> Arc<MemBuffer> {
        read(&self.vertices).clone()
    }

    pub fn index_buffer(&self) -> Option<Arc<MemBuffer>> {
        read(&self.indices).clone()
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count.load(Ordering::Acquire)
    }

    pub fn index_count(&self) -> u32 {
        self.index_count.load(Ordering::Acquire)
    }
}

impl CachedRenderable for Mesh {
    const CACHE_KIND: &'static str = "Mesh";

    fn caches(&self) -> &PerConsumerCache {
        &self.caches
    }

    fn make_new_cache(&self, renderer: &Renderer) -> Result<Arc<dyn RenderCache>> {
        let this = self.self_ref.upgrade().ok_or_else(|| {
            engine_err!("atlas3d::Mesh", NullReference, "Mesh '{}' is being dropped", self.name)
        })?;
        renderer.new_cache(&this)
    }
}

impl Renderable for Mesh {
    fn render(&self, command: &dyn RenderCommand) -> Result<()> {
        self.render_cached(command)
    }

    fn build(&self, renderer: &Renderer) -> Result<()> {
        self.build_cache(renderer).map(|_| ())
    }

    fn size(&self, renderer: &Renderer) -> usize {
        self.cached_size(renderer.id())
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("name", &self.name)
            .field("vertex_count", &self.vertex_count())
            .field("index_count", &self.index_count())
            .finish()
    }
}

// ===== MESH CACHE =====

/// GPU mirrors of a mesh's buffers, resolved at build time
struct GpuGeometry {
    vertices: Arc<RenderHdwBuffer>,
    indices: Option<Arc<RenderHdwBuffer>>,
    vertex_count: u32,
    index_count: u32,
}

pub struct MeshCache {
    renderer: RendererId,
    mesh: Weak<Mesh>,
    geometry: Mutex<Option<GpuGeometry>>,
}

impl MeshCache {
    pub fn new(mesh: &Arc<Mesh>, renderer: RendererId) -> Self {
        Self {
            renderer,
            mesh: Arc::downgrade(mesh),
            geometry: Mutex::new(None),
        }
    }

    /// GPU mirror of the vertex buffer, once built
    pub fn vertex_buffer(&self) -> Option<Arc<RenderHdwBuffer>> {
        lock(&self.geometry).as_ref().map(|g| g.vertices.clone())
    }

    pub fn index_buffer(&self) -> Option<Arc<RenderHdwBuffer>> {
        lock(&self.geometry).as_ref().and_then(|g| g.indices.clone())
    }
}

impl RenderCache for MeshCache {
    fn renderer(&self) -> RendererId {
        self.renderer
    }

    fn build(&self, renderer: &Renderer) -> Result<()> {
        let mesh = self.mesh.upgrade().ok_or_else(|| {
            engine_err!("atlas3d::MeshCache", NullReference, "Mesh was dropped")
        })?;

        let buffers = renderer.hdw_buffers();
        let vertices = buffers.find_or_create_related(&mesh.vertex_buffer())?;
        let indices = match mesh.index_buffer() {
            Some(indices) => Some(buffers.find_or_create_related(&indices)?),
            None => None,
        };

        engine_debug!("atlas3d::MeshCache", "Mesh '{}' mirrored on renderer {} (vertex buffer #{})",
            mesh.name(), self.renderer, vertices.index());

        *lock(&self.geometry) = Some(GpuGeometry {
            vertices,
            indices,
            vertex_count: mesh.vertex_count(),
            index_count: mesh.index_count(),
        });
        Ok(())
    }

    fn render(&self, command: &dyn RenderCommand) -> Result<()> {
        let draw = {
            let geometry = lock(&self.geometry);
            let Some(geometry) = geometry.as_ref() else {
                return Err(engine_err!("atlas3d::MeshCache", NullReference,
                    "Mesh cache of renderer {} was never built", self.renderer));
            };
            if geometry.vertex_count == 0 {
                return Ok(());
            }
            DrawCommand {
                vertex_buffer: geometry.vertices.clone(),
                index_buffer: geometry.indices.clone(),
                vertex_count: geometry.vertex_count,
                index_count: geometry.index_count,
            }
        };
        command.add_sub_command(Arc::new(draw));
        Ok(())
    }

    fn size(&self) -> usize {
        lock(&self.geometry).as_ref().map_or(0, |g| {
            g.vertices.size() + g.indices.as_ref().map_or(0, |i| i.size())
        })
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
