/// Monotonic, never-recycled index source.
///
/// Unlike a slot allocator, an index handed out by an [`IndexCounter`] is never
/// given out again for the lifetime of the process. The first index is 1, so 0
/// can be used as "no index".
///
/// ```ignore
/// static BUFFERS: IndexCounter = IndexCounter::new();
/// let a = BUFFERS.next(); // 1
/// let b = BUFFERS.next(); // 2
/// ```

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct IndexCounter {
    next: AtomicU64,
}

impl IndexCounter {
    pub const fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }

    /// Take the next index
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Index the next call to [`next`](Self::next) will return
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for IndexCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_starts_at_one() {
        let counter = IndexCounter::new();
        assert_eq!(counter.peek(), 1);
        assert_eq!(counter.next(), 1);
        assert_eq!(counter.next(), 2);
    }

    #[test]
    fn test_concurrent_indices_are_unique() {
        let counter = Arc::new(IndexCounter::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = counter.clone();
                thread::spawn(move || (0..100).map(|_| counter.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 400);
        assert_eq!(all[0], 1);
    }
}
