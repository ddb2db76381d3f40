/// Common interface of CPU-side and GPU-side byte buffers.

use crate::error::Result;
use crate::utils::IndexCounter;

/// Shared by every hardware buffer, CPU or GPU side: indices are unique across
/// both kinds and never reused.
pub(crate) static BUFFER_INDICES: IndexCounter = IndexCounter::new();

/// Usage of a buffer's contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardwareBufferType {
    Vertex,
    Index,
    Misc,
}

pub trait HardwareBuffer: Send + Sync {
    fn buffer_type(&self) -> HardwareBufferType;

    /// Stable, process-wide unique index assigned at construction
    fn index(&self) -> u64;

    /// Size in bytes
    fn size(&self) -> usize;

    /// Resize the buffer to `size` bytes, optionally filling it with `data`.
    ///
    /// `data`, when given, must be exactly `size` bytes long. Without data the
    /// new contents are zeroed.
    fn allocate(&self, size: usize, data: Option<&[u8]>) -> Result<()>;

    /// Copy of the buffer contents
    fn read(&self) -> Result<Vec<u8>>;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }
}
