//! Memory budget shared by hardware buffers.

mod memory_pool;

pub use memory_pool::{MemoryPool, MemoryPoolDesc, MemoryPoolListener};
