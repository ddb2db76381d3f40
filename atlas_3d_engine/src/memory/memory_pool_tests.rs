use super::*;
use crate::error::Error;
use std::sync::atomic::AtomicUsize;
use std::thread;

// ============================================================================
// Helpers
// ============================================================================

#[derive(Default)]
struct LowMemoryCounter {
    calls: AtomicUsize,
}

impl MemoryPoolListener for LowMemoryCounter {
    fn on_memory_low(&self, _pool: &MemoryPool) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn bounded(max_size: usize) -> MemoryPool {
    MemoryPool::new(MemoryPoolDesc { max_size, low_memory_threshold: 0.8 })
}

// ============================================================================
// change / is_available
// ============================================================================

#[test]
fn test_grow_and_shrink() {
    let pool = bounded(100);
    pool.change(0, 40).unwrap();
    pool.change(40, 70).unwrap();
    assert_eq!(pool.current_size(), 70);

    pool.change(70, 10).unwrap();
    assert_eq!(pool.current_size(), 10);
    pool.change(10, 0).unwrap();
    assert_eq!(pool.current_size(), 0);
}

#[test]
fn test_growth_over_budget_fails_without_mutation() {
    let pool = bounded(100);
    pool.change(0, 90).unwrap();

    let result = pool.change(0, 20);
    assert!(matches!(result, Err(Error::CapacityExceeded(_))));
    assert_eq!(pool.current_size(), 90);
}

#[test]
fn test_growth_to_exact_budget_succeeds() {
    let pool = bounded(100);
    pool.change(0, 100).unwrap();
    assert_eq!(pool.current_size(), 100);
    assert!(!pool.is_available(0, 1));
}

#[test]
fn test_unbounded_pool_accepts_anything() {
    let pool = MemoryPool::default();
    assert_eq!(pool.max_size(), 0);
    pool.change(0, usize::MAX / 2).unwrap();
    assert!(pool.is_available(0, 1000));
    assert_eq!(pool.usage_ratio(), 0.0);
}

#[test]
fn test_is_available_is_pure() {
    let pool = bounded(50);
    pool.change(0, 30).unwrap();

    assert!(pool.is_available(0, 20));
    assert!(!pool.is_available(0, 21));
    // Shrinking is always available
    assert!(pool.is_available(30, 0));
    assert_eq!(pool.current_size(), 30);
}

#[test]
fn test_shrink_below_zero_saturates() {
    let pool = bounded(100);
    pool.change(0, 10).unwrap();
    pool.change(50, 0).unwrap();
    assert_eq!(pool.current_size(), 0);
}

#[test]
fn test_budget_respected_when_steps_check_availability() {
    let pool = bounded(256);
    let mut sizes = vec![0usize; 8];
    let targets = [64, 128, 32, 200, 16, 90, 40, 10, 300, 5, 0, 120];

    for (step, target) in targets.iter().enumerate() {
        let slot = step % sizes.len();
        let old = sizes[slot];
        if pool.is_available(old, *target) {
            pool.change(old, *target).unwrap();
            sizes[slot] = *target;
        }
        assert!(pool.current_size() <= pool.max_size());
        assert_eq!(pool.current_size(), sizes.iter().sum::<usize>());
    }
}

#[test]
fn test_concurrent_growth_never_exceeds_budget() {
    let pool = Arc::new(bounded(1000));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pool = pool.clone();
            thread::spawn(move || {
                let mut granted = 0;
                for _ in 0..100 {
                    if pool.change(0, 7).is_ok() {
                        granted += 1;
                    }
                }
                granted
            })
        })
        .collect();

    let granted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert!(pool.current_size() <= 1000);
    assert_eq!(pool.current_size(), granted * 7);
    assert_eq!(granted, 1000 / 7);
}

// ============================================================================
// Low-memory signal
// ============================================================================

#[test]
fn test_low_memory_fires_once_on_growth_only() {
    let pool = bounded(100);
    let counter = Arc::new(LowMemoryCounter::default());
    let listener: Arc<dyn MemoryPoolListener> = counter.clone();
    pool.add_listener(&listener);

    pool.change(0, 85).unwrap();
    assert_eq!(counter.calls.load(Ordering::SeqCst), 1);

    pool.change(85, 60).unwrap();
    assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_low_memory_not_fired_below_threshold() {
    let pool = bounded(100);
    let counter = Arc::new(LowMemoryCounter::default());
    let listener: Arc<dyn MemoryPoolListener> = counter.clone();
    pool.add_listener(&listener);

    pool.change(0, 80).unwrap();
    assert_eq!(counter.calls.load(Ordering::SeqCst), 0);
    assert!((pool.usage_ratio() - 0.8).abs() < 1e-6);
}

#[test]
fn test_removed_listener_not_notified() {
    let pool = bounded(10);
    let counter = Arc::new(LowMemoryCounter::default());
    let listener: Arc<dyn MemoryPoolListener> = counter.clone();
    let key = pool.add_listener(&listener);
    assert!(pool.remove_listener(key));

    pool.change(0, 10).unwrap();
    assert_eq!(counter.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_threshold_is_clamped() {
    let pool = MemoryPool::default();
    pool.set_low_memory_threshold(80.0);
    assert_eq!(pool.low_memory_threshold(), 1.0);
    pool.set_low_memory_threshold(-1.0);
    assert!(pool.low_memory_threshold() > 0.0);
    pool.set_low_memory_threshold(0.5);
    assert_eq!(pool.low_memory_threshold(), 0.5);
}

#[test]
fn test_set_max_size() {
    let pool = MemoryPool::default();
    pool.change(0, 500).unwrap();
    pool.set_max_size(400);
    assert!(pool.change(500, 501).is_err());
    pool.change(500, 300).unwrap();
    pool.change(300, 400).unwrap();
}
