/// Per-renderer registry of GPU buffers.
///
/// The manager owns the renderer's [`MemoryPool`], constructs buffer storages
/// through a [`Factory`] keyed by [`HardwareBufferType`], and keeps every live
/// GPU buffer of its renderer. GPU mirrors of CPU buffers are deduplicated by
/// the CPU buffer's stable index.
///
/// When its pool reports low memory and `free_unused_on_low_memory` is set,
/// the manager drops every buffer nobody else holds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use crate::error::Result;
use crate::memory::{MemoryPool, MemoryPoolDesc, MemoryPoolListener};
use crate::renderer::RendererId;
use crate::utils::{lock, Factory};
use crate::{engine_bail, engine_debug, engine_info};
use super::hardware_buffer::{HardwareBuffer, HardwareBufferType};
use super::mem_buffer::MemBuffer;
use super::render_hdw_buffer::{GpuBufferStorage, HostBufferStorage, RenderHdwBuffer};

const SOURCE: &str = "atlas3d::RenderHdwBufferManager";

/// Backend storage constructors, one per buffer type
pub type StorageFactory = Factory<HardwareBufferType, Box<dyn GpuBufferStorage>>;

/// Buffer manager configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferManagerDesc {
    pub pool: MemoryPoolDesc,
    /// Drop unused buffers automatically when the pool runs low
    pub free_unused_on_low_memory: bool,
}

impl Default for BufferManagerDesc {
    fn default() -> Self {
        Self {
            pool: MemoryPoolDesc::default(),
            free_unused_on_low_memory: true,
        }
    }
}

pub struct RenderHdwBufferManager {
    renderer: RendererId,
    pool: Arc<MemoryPool>,
    factory: StorageFactory,
    buffers: Mutex<Vec<Arc<RenderHdwBuffer>>>,
    /// Serializes find-or-create so a CPU buffer gets a single mirror
    creation: Mutex<()>,
    free_unused_on_low_memory: AtomicBool,
}

impl RenderHdwBufferManager {
    /// Create a manager for `renderer`.
    ///
    /// Host-memory storage is registered for every buffer type; backends
    /// replace it through [`factory`](Self::factory).
    pub fn new(renderer: RendererId, desc: BufferManagerDesc) -> Arc<Self> {
        let factory = StorageFactory::new(SOURCE);
        for buffer_type in [HardwareBufferType::Vertex, HardwareBufferType::Index, HardwareBufferType::Misc] {
            factory.register(buffer_type, |_| {
                Ok(Box::new(HostBufferStorage::default()) as Box<dyn GpuBufferStorage>)
            });
        }

        let manager = Arc::new(Self {
            renderer,
            pool: Arc::new(MemoryPool::new(desc.pool)),
            factory,
            buffers: Mutex::new(Vec::new()),
            creation: Mutex::new(()),
            free_unused_on_low_memory: AtomicBool::new(desc.free_unused_on_low_memory),
        });

        let listener: Arc<dyn MemoryPoolListener> = manager.clone();
        manager.pool.add_listener(&listener);
        manager
    }

    // ===== ACCESSORS =====

    pub fn renderer(&self) -> RendererId {
        self.renderer
    }

    pub fn pool(&self) -> &Arc<MemoryPool> {
        &self.pool
    }

    /// Storage constructors (register backend storages here)
    pub fn factory(&self) -> &StorageFactory {
        &self.factory
    }

    pub fn free_unused_on_low_memory(&self) -> bool {
        self.free_unused_on_low_memory.load(Ordering::Acquire)
    }

    pub fn set_free_unused_on_low_memory(&self, enabled: bool) {
        self.free_unused_on_low_memory.store(enabled, Ordering::Release);
    }

    pub fn buffers_count(&self) -> usize {
        lock(&self.buffers).len()
    }

    /// Snapshot of the registered buffers
    pub fn buffers(&self) -> Vec<Arc<RenderHdwBuffer>> {
        lock(&self.buffers).clone()
    }

    // ===== CREATION =====

    /// Create and register an empty buffer of `buffer_type`
    pub fn make(&self, buffer_type: HardwareBufferType) -> Result<Arc<RenderHdwBuffer>> {
        let buffer = Arc::new(self.construct(buffer_type)?);
        lock(&self.buffers).push(buffer.clone());
        Ok(buffer)
    }

    /// Create, allocate and register a buffer
    pub fn new_buffer(
        &self,
        buffer_type: HardwareBufferType,
        size: usize,
        data: Option<&[u8]>,
    ) -> Result<Arc<RenderHdwBuffer>> {
        let buffer = self.construct(buffer_type)?;
        buffer.allocate(size, data)?;
        let buffer = Arc::new(buffer);
        lock(&self.buffers).push(buffer.clone());
        Ok(buffer)
    }

    /// Register a buffer created elsewhere
    ///
    /// # Errors
    ///
    /// `InvalidConsumer` if the buffer belongs to another renderer.
    pub fn add(&self, buffer: Arc<RenderHdwBuffer>) -> Result<()> {
        self.check_owner(&buffer)?;
        let mut buffers = lock(&self.buffers);
        if !buffers.iter().any(|b| Arc::ptr_eq(b, &buffer)) {
            buffers.push(buffer);
        }
        Ok(())
    }

    /// Unregister a buffer. Returns false if it was not registered.
    pub fn remove(&self, buffer: &Arc<RenderHdwBuffer>) -> bool {
        let removed = {
            let mut buffers = lock(&self.buffers);
            buffers
                .iter()
                .position(|b| Arc::ptr_eq(b, buffer))
                .map(|index| buffers.remove(index))
        };
        removed.is_some()
    }

    // ===== MIRRORS =====

    /// GPU buffer mirroring the CPU buffer of index `index`, if any
    pub fn find_related(&self, index: u64) -> Option<Arc<RenderHdwBuffer>> {
        lock(&self.buffers)
            .iter()
            .find(|b| b.related_index() == Some(index))
            .cloned()
    }

    /// GPU mirror of `source`, created (and filled with its bytes) if needed.
    ///
    /// # Errors
    ///
    /// `CapacityExceeded` if the pool has no room for the source's size.
    pub fn find_or_create_related(&self, source: &MemBuffer) -> Result<Arc<RenderHdwBuffer>> {
        let _creation = lock(&self.creation);
        if let Some(buffer) = self.find_related(source.index()) {
            return Ok(buffer);
        }

        let buffer = {
            let bytes = source.lock();
            if !self.pool.is_available(0, bytes.len()) {
                engine_bail!(SOURCE, CapacityExceeded,
                    "No room for a {} bytes mirror of buffer #{} ({} / {} bytes in use)",
                    bytes.len(), source.index(), self.pool.current_size(), self.pool.max_size());
            }
            let buffer = self.construct(source.buffer_type())?;
            buffer.allocate(bytes.len(), Some(&bytes))?;
            buffer
        };
        buffer.set_related_index(Some(source.index()));

        engine_debug!(SOURCE, "Created mirror #{} of buffer #{} ({} bytes)",
            buffer.index(), source.index(), buffer.size());

        let buffer = Arc::new(buffer);
        lock(&self.buffers).push(buffer.clone());
        Ok(buffer)
    }

    /// Duplicate one of this renderer's buffers into a new registered buffer
    ///
    /// # Errors
    ///
    /// `InvalidConsumer` for a buffer of another renderer, `CapacityExceeded`
    /// if the pool has no room for the copy.
    pub fn copy(&self, source: &RenderHdwBuffer) -> Result<Arc<RenderHdwBuffer>> {
        self.check_owner(source)?;

        let bytes = source.read()?;
        if !self.pool.is_available(0, bytes.len()) {
            engine_bail!(SOURCE, CapacityExceeded,
                "No room to copy buffer #{} ({} bytes)", source.index(), bytes.len());
        }

        let buffer = self.construct(source.buffer_type())?;
        buffer.allocate(bytes.len(), Some(&bytes))?;
        buffer.set_related_index(source.related_index());

        let buffer = Arc::new(buffer);
        lock(&self.buffers).push(buffer.clone());
        Ok(buffer)
    }

    // ===== EVICTION =====

    /// Drop every registered buffer held only by this manager.
    /// Returns the number of buffers released.
    pub fn remove_unused_buffers(&self) -> usize {
        let unused: Vec<Arc<RenderHdwBuffer>> = {
            let mut buffers = lock(&self.buffers);
            let (unused, used): (Vec<_>, Vec<_>) = buffers
                .drain(..)
                .partition(|b| Arc::strong_count(b) == 1);
            *buffers = used;
            unused
        };

        let count = unused.len();
        if count > 0 {
            engine_info!(SOURCE, "Released {} unused buffers", count);
        }
        // Buffers are dropped here, outside the registry lock
        drop(unused);
        count
    }

    // ===== INTERNALS =====

    fn construct(&self, buffer_type: HardwareBufferType) -> Result<RenderHdwBuffer> {
        let storage = self.factory.construct(&buffer_type, &())?;
        RenderHdwBuffer::new(buffer_type, self.renderer, storage, self.pool.clone())
    }

    fn check_owner(&self, buffer: &RenderHdwBuffer) -> Result<()> {
        if !buffer.is_from(self.renderer) {
            engine_bail!(SOURCE, InvalidConsumer,
                "Buffer #{} belongs to renderer {} and not to renderer {}",
                buffer.index(), buffer.renderer(), self.renderer);
        }
        Ok(())
    }
}

impl MemoryPoolListener for RenderHdwBufferManager {
    fn on_memory_low(&self, _pool: &MemoryPool) {
        if self.free_unused_on_low_memory() {
            self.remove_unused_buffers();
        }
    }
}

#[cfg(test)]
#[path = "buffer_manager_tests.rs"]
mod tests;
