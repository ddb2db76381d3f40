//! Hardware buffers: CPU-side memory buffers, their GPU-side mirrors and the
//! per-renderer manager that creates, deduplicates and evicts mirrors.

mod buffer_manager;
mod hardware_buffer;
mod mem_buffer;
mod render_hdw_buffer;

pub use buffer_manager::{BufferManagerDesc, RenderHdwBufferManager, StorageFactory};
pub use hardware_buffer::{HardwareBuffer, HardwareBufferType};
pub use mem_buffer::MemBuffer;
pub use render_hdw_buffer::{GpuBufferStorage, HostBufferStorage, RenderHdwBuffer};
