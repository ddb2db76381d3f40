use super::*;
use crate::error::Error;
use std::sync::atomic::AtomicUsize;

// ============================================================================
// Helpers
// ============================================================================

fn manager_with_budget(max_size: usize, free_unused: bool) -> Arc<RenderHdwBufferManager> {
    RenderHdwBufferManager::new(
        RendererId::next(),
        BufferManagerDesc {
            pool: MemoryPoolDesc { max_size, low_memory_threshold: 0.8 },
            free_unused_on_low_memory: free_unused,
        },
    )
}

fn vertices(count: usize) -> MemBuffer {
    let data: Vec<f32> = (0..count).map(|i| i as f32).collect();
    MemBuffer::from_slice(HardwareBufferType::Vertex, &data)
}

/// Storage that refuses every allocation
struct BrokenStorage;

impl GpuBufferStorage for BrokenStorage {
    fn allocate(&mut self, _size: usize, _data: Option<&[u8]>) -> Result<()> {
        Err(Error::BackendError("device lost".to_string()))
    }
    fn size(&self) -> usize {
        0
    }
    fn read(&self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

// ============================================================================
// Creation
// ============================================================================

#[test]
fn test_new_buffer_charges_pool() {
    let manager = manager_with_budget(0, false);
    let buffer = manager.new_buffer(HardwareBufferType::Index, 64, None).unwrap();

    assert_eq!(buffer.size(), 64);
    assert_eq!(buffer.buffer_type(), HardwareBufferType::Index);
    assert!(buffer.is_from(manager.renderer()));
    assert_eq!(manager.pool().current_size(), 64);
    assert_eq!(manager.buffers_count(), 1);
}

#[test]
fn test_dropping_buffer_releases_pool() {
    let manager = manager_with_budget(0, false);
    let buffer = manager.new_buffer(HardwareBufferType::Misc, 32, None).unwrap();
    assert!(manager.remove(&buffer));
    drop(buffer);
    assert_eq!(manager.pool().current_size(), 0);
}

#[test]
fn test_backend_failure_reverts_accounting() {
    let manager = manager_with_budget(0, false);
    manager.factory().register(HardwareBufferType::Vertex, |_| {
        Ok(Box::new(BrokenStorage) as Box<dyn GpuBufferStorage>)
    });

    let result = manager.new_buffer(HardwareBufferType::Vertex, 128, None);
    assert!(matches!(result, Err(Error::BackendError(_))));
    assert_eq!(manager.pool().current_size(), 0);
    assert_eq!(manager.buffers_count(), 0);
}

#[test]
fn test_missing_storage_constructor() {
    let manager = manager_with_budget(0, false);
    manager.factory().unregister(&HardwareBufferType::Misc);
    assert!(matches!(manager.make(HardwareBufferType::Misc), Err(Error::NotFound(_))));
}

#[test]
fn test_add_rejects_foreign_buffer() {
    let ours = manager_with_budget(0, false);
    let theirs = manager_with_budget(0, false);
    let foreign = theirs.new_buffer(HardwareBufferType::Vertex, 4, None).unwrap();

    assert!(matches!(ours.add(foreign), Err(Error::InvalidConsumer(_))));
    assert_eq!(ours.buffers_count(), 0);
}

// ============================================================================
// Mirrors
// ============================================================================

#[test]
fn test_find_or_create_related_copies_bytes() {
    let manager = manager_with_budget(0, false);
    let source = vertices(4);

    let mirror = manager.find_or_create_related(&source).unwrap();
    assert_eq!(mirror.related_index(), Some(source.index()));
    assert_eq!(mirror.read().unwrap(), *source.lock());
    assert_eq!(mirror.size(), 16);
    assert_ne!(mirror.index(), source.index());
}

#[test]
fn test_find_or_create_related_deduplicates() {
    let manager = manager_with_budget(0, false);
    let source = vertices(8);

    let first = manager.find_or_create_related(&source).unwrap();
    let second = manager.find_or_create_related(&source).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(manager.buffers_count(), 1);
    assert!(manager.find_related(source.index()).is_some());
}

#[test]
fn test_find_related_absent() {
    let manager = manager_with_budget(0, false);
    assert!(manager.find_related(u64::MAX).is_none());
}

#[test]
fn test_find_or_create_related_over_budget() {
    let manager = manager_with_budget(8, false);
    let source = vertices(4); // 16 bytes

    let result = manager.find_or_create_related(&source);
    assert!(matches!(result, Err(Error::CapacityExceeded(_))));
    assert_eq!(manager.pool().current_size(), 0);
    assert_eq!(manager.buffers_count(), 0);
}

#[test]
fn test_concurrent_find_or_create_related_single_mirror() {
    let manager = manager_with_budget(0, false);
    let source = Arc::new(vertices(16));

    let mirrors: Vec<Arc<RenderHdwBuffer>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| manager.find_or_create_related(&source).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(mirrors.iter().all(|m| Arc::ptr_eq(m, &mirrors[0])));
    assert_eq!(manager.buffers_count(), 1);
}

#[test]
fn test_copy() {
    let manager = manager_with_budget(0, false);
    let source = vertices(2);
    let mirror = manager.find_or_create_related(&source).unwrap();

    let copy = manager.copy(&mirror).unwrap();
    assert!(!Arc::ptr_eq(&copy, &mirror));
    assert_eq!(copy.read().unwrap(), mirror.read().unwrap());
    assert_eq!(copy.buffer_type(), HardwareBufferType::Vertex);
    assert_eq!(manager.buffers_count(), 2);
    assert_eq!(manager.pool().current_size(), 16);
}

#[test]
fn test_copy_rejects_foreign_buffer() {
    let ours = manager_with_budget(0, false);
    let theirs = manager_with_budget(0, false);
    let foreign = theirs.new_buffer(HardwareBufferType::Index, 8, None).unwrap();
    assert!(matches!(ours.copy(&foreign), Err(Error::InvalidConsumer(_))));
}

#[test]
fn test_copy_over_budget() {
    let manager = manager_with_budget(20, false);
    let mirror = manager.find_or_create_related(&vertices(4)).unwrap();
    assert!(matches!(manager.copy(&mirror), Err(Error::CapacityExceeded(_))));
}

// ============================================================================
// Eviction
// ============================================================================

#[test]
fn test_remove_unused_buffers_keeps_held_ones() {
    let manager = manager_with_budget(0, false);
    let held = manager.new_buffer(HardwareBufferType::Vertex, 10, None).unwrap();
    manager.new_buffer(HardwareBufferType::Vertex, 20, None).unwrap();
    manager.new_buffer(HardwareBufferType::Index, 30, None).unwrap();

    assert_eq!(manager.remove_unused_buffers(), 2);
    assert_eq!(manager.buffers_count(), 1);
    assert_eq!(manager.pool().current_size(), 10);
    assert!(Arc::ptr_eq(&manager.buffers()[0], &held));
}

#[test]
fn test_low_memory_evicts_when_enabled() {
    let manager = manager_with_budget(100, true);
    // Unused mirror: nobody keeps the returned Arc
    manager.new_buffer(HardwareBufferType::Misc, 50, None).unwrap();
    assert_eq!(manager.buffers_count(), 1);

    // 50 + 40 = 90% > 80%: the unused buffer is evicted
    let kept = manager.new_buffer(HardwareBufferType::Misc, 40, None).unwrap();
    assert_eq!(manager.buffers_count(), 1);
    assert!(Arc::ptr_eq(&manager.buffers()[0], &kept));
    assert_eq!(manager.pool().current_size(), 40);
}

#[test]
fn test_low_memory_keeps_buffers_when_disabled() {
    let manager = manager_with_budget(100, false);
    manager.new_buffer(HardwareBufferType::Misc, 50, None).unwrap();
    manager.new_buffer(HardwareBufferType::Misc, 40, None).unwrap();
    assert_eq!(manager.buffers_count(), 2);
    assert_eq!(manager.pool().current_size(), 90);
}

#[test]
fn test_low_memory_reaches_other_listeners() {
    #[derive(Default)]
    struct Counter(AtomicUsize);
    impl MemoryPoolListener for Counter {
        fn on_memory_low(&self, _pool: &MemoryPool) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let manager = manager_with_budget(10, true);
    let counter = Arc::new(Counter::default());
    let listener: Arc<dyn MemoryPoolListener> = counter.clone();
    manager.pool().add_listener(&listener);

    let _buffer = manager.new_buffer(HardwareBufferType::Vertex, 9, None).unwrap();
    assert_eq!(counter.0.load(Ordering::SeqCst), 1);
}
