/// GPU-side buffer owned by one renderer.
///
/// The actual storage is provided by the backend through [`GpuBufferStorage`];
/// `RenderHdwBuffer` adds identity (stable index, owning renderer, mirrored CPU
/// buffer) and reports every size transition to the renderer's memory pool.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use crate::error::Result;
use crate::memory::MemoryPool;
use crate::renderer::RendererId;
use crate::utils::lock;
use crate::engine_bail;
use super::hardware_buffer::{HardwareBuffer, HardwareBufferType, BUFFER_INDICES};

/// Backend storage for a GPU buffer
pub trait GpuBufferStorage: Send {
    /// Resize to `size` bytes, optionally uploading `data` (exactly `size` bytes)
    fn allocate(&mut self, size: usize, data: Option<&[u8]>) -> Result<()>;

    fn size(&self) -> usize;

    /// Read the contents back
    fn read(&self) -> Result<Vec<u8>>;
}

/// Host-memory storage, used when no backend storage is registered
#[derive(Debug, Default)]
pub struct HostBufferStorage {
    bytes: Vec<u8>,
}

impl GpuBufferStorage for HostBufferStorage {
    fn allocate(&mut self, size: usize, data: Option<&[u8]>) -> Result<()> {
        match data {
            Some(data) if data.len() != size => engine_bail!("atlas3d::HostBufferStorage", OutOfRange,
                "{} bytes of data for an allocation of {} bytes", data.len(), size),
            Some(data) => self.bytes = data.to_vec(),
            None => self.bytes = vec![0; size],
        }
        Ok(())
    }

    fn size(&self) -> usize {
        self.bytes.len()
    }

    fn read(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

pub struct RenderHdwBuffer {
    buffer_type: HardwareBufferType,
    index: u64,
    renderer: RendererId,
    /// Index of the mirrored CPU buffer, 0 = none
    related_index: AtomicU64,
    storage: Mutex<Box<dyn GpuBufferStorage>>,
    pool: Arc<MemoryPool>,
}

impl RenderHdwBuffer {
    /// Wrap a backend storage. Its current size is charged to `pool`.
    pub fn new(
        buffer_type: HardwareBufferType,
        renderer: RendererId,
        storage: Box<dyn GpuBufferStorage>,
        pool: Arc<MemoryPool>,
    ) -> Result<Self> {
        pool.change(0, storage.size())?;
        Ok(Self {
            buffer_type,
            index: BUFFER_INDICES.next(),
            renderer,
            related_index: AtomicU64::new(0),
            storage: Mutex::new(storage),
            pool,
        })
    }

    /// Renderer owning this buffer
    pub fn renderer(&self) -> RendererId {
        self.renderer
    }

    pub fn is_from(&self, renderer: RendererId) -> bool {
        self.renderer == renderer
    }

    /// Index of the CPU buffer this buffer mirrors
    pub fn related_index(&self) -> Option<u64> {
        match self.related_index.load(Ordering::Acquire) {
            0 => None,
            index => Some(index),
        }
    }

    pub fn set_related_index(&self, index: Option<u64>) {
        self.related_index.store(index.unwrap_or(0), Ordering::Release);
    }
}

impl HardwareBuffer for RenderHdwBuffer {
    fn buffer_type(&self) -> HardwareBufferType {
        self.buffer_type
    }

    fn index(&self) -> u64 {
        self.index
    }

    fn size(&self) -> usize {
        lock(&self.storage).size()
    }

    fn allocate(&self, size: usize, data: Option<&[u8]>) -> Result<()> {
        let mut storage = lock(&self.storage);
        let old_size = storage.size();
        self.pool.change(old_size, size)?;

        if let Err(err) = storage.allocate(size, data) {
            // Shrinking back never fails
            let _ = self.pool.change(size, old_size);
            return Err(err);
        }
        Ok(())
    }

    fn read(&self) -> Result<Vec<u8>> {
        lock(&self.storage).read()
    }
}

impl Drop for RenderHdwBuffer {
    fn drop(&mut self) {
        let size = self
            .storage
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .size();
        let _ = self.pool.change(size, 0);
    }
}

impl std::fmt::Debug for RenderHdwBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderHdwBuffer")
            .field("buffer_type", &self.buffer_type)
            .field("index", &self.index)
            .field("renderer", &self.renderer)
            .field("related_index", &self.related_index())
            .field("size", &self.size())
            .finish()
    }
}
