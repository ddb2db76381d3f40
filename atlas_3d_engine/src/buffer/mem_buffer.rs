/// CPU-resident byte buffer.
///
/// A `MemBuffer` is the source a GPU mirror is created from. Its contents are
/// guarded by a lock: [`MemBuffer::lock`] holds the buffer for the lifetime of
/// the returned guard.

use std::sync::{Mutex, MutexGuard};
use bytemuck::Pod;
use crate::error::Result;
use crate::engine_bail;
use crate::utils::lock;
use super::hardware_buffer::{HardwareBuffer, HardwareBufferType, BUFFER_INDICES};

#[derive(Debug)]
pub struct MemBuffer {
    buffer_type: HardwareBufferType,
    index: u64,
    data: Mutex<Vec<u8>>,
}

impl MemBuffer {
    /// Empty buffer
    pub fn new(buffer_type: HardwareBufferType) -> Self {
        Self::with_bytes(buffer_type, Vec::new())
    }

    pub fn with_bytes(buffer_type: HardwareBufferType, bytes: Vec<u8>) -> Self {
        Self {
            buffer_type,
            index: BUFFER_INDICES.next(),
            data: Mutex::new(bytes),
        }
    }

    /// Buffer holding the raw bytes of `values`
    pub fn from_slice<T: Pod>(buffer_type: HardwareBufferType, values: &[T]) -> Self {
        Self::with_bytes(buffer_type, bytemuck::cast_slice(values).to_vec())
    }

    /// Lock the contents. The buffer is unlocked when the guard is dropped.
    pub fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        lock(&self.data)
    }

    /// Replace the contents with the bytes of `values`
    pub fn write<T: Pod>(&self, values: &[T]) {
        *self.lock() = bytemuck::cast_slice(values).to_vec();
    }
}

impl HardwareBuffer for MemBuffer {
    fn buffer_type(&self) -> HardwareBufferType {
        self.buffer_type
    }

    fn index(&self) -> u64 {
        self.index
    }

    fn size(&self) -> usize {
        self.lock().len()
    }

    fn allocate(&self, size: usize, data: Option<&[u8]>) -> Result<()> {
        let mut bytes = self.lock();
        match data {
            Some(data) if data.len() != size => engine_bail!("atlas3d::MemBuffer", OutOfRange,
                "Buffer #{}: {} bytes of data for an allocation of {} bytes",
                self.index, data.len(), size),
            Some(data) => *bytes = data.to_vec(),
            None => *bytes = vec![0; size],
        }
        Ok(())
    }

    fn read(&self) -> Result<Vec<u8>> {
        Ok(self.lock().clone())
    }
}
