/// Memory pool: an aggregate byte budget shared by many buffers.
///
/// Buffers report every size transition through [`MemoryPool::change`]
/// (creation `0 -> n`, destruction `n -> 0`, resize `a -> b`). Growth is
/// checked against `max_size`; shrinking always succeeds. Crossing the
/// low-memory threshold on growth notifies listeners synchronously, before
/// `change` returns.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use crate::error::Result;
use crate::utils::{Emitter, ListenerKey};
use crate::{engine_bail, engine_debug, engine_warn};

const SOURCE: &str = "atlas3d::MemoryPool";

/// Pool configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryPoolDesc {
    /// Budget in bytes, 0 = unbounded
    pub max_size: usize,
    /// Fraction of `max_size` above which listeners are told memory is low
    pub low_memory_threshold: f32,
}

impl Default for MemoryPoolDesc {
    fn default() -> Self {
        Self {
            max_size: 0,
            low_memory_threshold: 0.8,
        }
    }
}

/// Receives low-memory notifications
pub trait MemoryPoolListener: Send + Sync {
    /// Called after a growth leaves `current_size / max_size` above the threshold
    fn on_memory_low(&self, _pool: &MemoryPool) {}
}

pub struct MemoryPool {
    current_size: AtomicUsize,
    max_size: AtomicUsize,
    /// f32 bits of the low-memory threshold
    threshold: AtomicU32,
    listeners: Emitter<dyn MemoryPoolListener>,
}

impl MemoryPool {
    pub fn new(desc: MemoryPoolDesc) -> Self {
        let pool = Self {
            current_size: AtomicUsize::new(0),
            max_size: AtomicUsize::new(desc.max_size),
            threshold: AtomicU32::new(0),
            listeners: Emitter::new(),
        };
        pool.set_low_memory_threshold(desc.low_memory_threshold);
        pool
    }

    // ===== SIZE ACCOUNTING =====

    /// Record a size transition from `old_size` to `new_size` bytes.
    ///
    /// # Errors
    ///
    /// `CapacityExceeded` when the growth would exceed `max_size`; the pool is
    /// left unchanged.
    pub fn change(&self, old_size: usize, new_size: usize) -> Result<()> {
        if new_size <= old_size {
            self.release(old_size - new_size);
            return Ok(());
        }

        let delta = new_size - old_size;
        let max_size = self.max_size();
        let committed = self.current_size.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
            let next = current.checked_add(delta)?;
            if max_size > 0 && next > max_size {
                None
            } else {
                Some(next)
            }
        });

        match committed {
            Ok(previous) => {
                let current = previous + delta;
                if self.is_low(current, max_size) {
                    engine_warn!(SOURCE, "Memory low: {} / {} bytes in use", current, max_size);
                    self.listeners.send(|listener| listener.on_memory_low(self));
                }
                Ok(())
            }
            Err(current) => engine_bail!(SOURCE, CapacityExceeded,
                "Cannot grow by {} bytes: {} / {} bytes in use", delta, current, max_size),
        }
    }

    /// Whether `change(old_size, new_size)` would currently succeed
    pub fn is_available(&self, old_size: usize, new_size: usize) -> bool {
        if new_size <= old_size {
            return true;
        }
        let max_size = self.max_size();
        if max_size == 0 {
            return true;
        }
        self.current_size()
            .checked_add(new_size - old_size)
            .is_some_and(|next| next <= max_size)
    }

    fn release(&self, delta: usize) {
        if delta == 0 {
            return;
        }
        let previous = self.current_size.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
            Some(current.saturating_sub(delta))
        });
        if let Ok(previous) = previous {
            if previous < delta {
                engine_warn!(SOURCE, "Released {} bytes but only {} were accounted", delta, previous);
            }
        }
    }

    fn is_low(&self, current: usize, max_size: usize) -> bool {
        max_size > 0 && (current as f64 / max_size as f64) > self.low_memory_threshold() as f64
    }

    // ===== GETTERS / SETTERS =====

    pub fn current_size(&self) -> usize {
        self.current_size.load(Ordering::Acquire)
    }

    pub fn max_size(&self) -> usize {
        self.max_size.load(Ordering::Acquire)
    }

    /// Change the budget. Lowering it below the current size does not evict
    /// anything, it only makes further growth fail.
    pub fn set_max_size(&self, max_size: usize) {
        self.max_size.store(max_size, Ordering::Release);
        engine_debug!(SOURCE, "Max size set to {} bytes", max_size);
    }

    pub fn low_memory_threshold(&self) -> f32 {
        f32::from_bits(self.threshold.load(Ordering::Acquire))
    }

    /// Set the low-memory threshold, clamped to (0, 1]
    pub fn set_low_memory_threshold(&self, threshold: f32) {
        let threshold = if threshold.is_finite() {
            threshold.clamp(f32::EPSILON, 1.0)
        } else {
            1.0
        };
        self.threshold.store(threshold.to_bits(), Ordering::Release);
    }

    /// `current_size / max_size`, or 0 when unbounded
    pub fn usage_ratio(&self) -> f32 {
        match self.max_size() {
            0 => 0.0,
            max_size => self.current_size() as f32 / max_size as f32,
        }
    }

    // ===== LISTENERS =====

    pub fn add_listener(&self, listener: &Arc<dyn MemoryPoolListener>) -> ListenerKey {
        self.listeners.add_listener(listener)
    }

    pub fn remove_listener(&self, key: ListenerKey) -> bool {
        self.listeners.remove_listener(key)
    }
}

impl Default for MemoryPool {
    fn default() -> Self {
        Self::new(MemoryPoolDesc::default())
    }
}

#[cfg(test)]
#[path = "memory_pool_tests.rs"]
mod tests;
