/// Dirty/clean tracking through a pair of timestamps.
///
/// Timestamps are ticks of a process-wide strictly increasing clock, so two
/// successive `touch()`/`clean()` calls can never share a stamp, whatever the
/// resolution of the system clock.

use std::sync::atomic::{AtomicU64, Ordering};

static CLOCK: AtomicU64 = AtomicU64::new(1);

fn tick() -> u64 {
    CLOCK.fetch_add(1, Ordering::Relaxed)
}

/// `is_touched() == last_modified > last_cleaned`
#[derive(Debug)]
pub struct Touchable {
    last_modified: AtomicU64,
    last_cleaned: AtomicU64,
}

impl Touchable {
    /// Create a clean tracker (both stamps equal)
    pub fn new() -> Self {
        let now = tick();
        Self {
            last_modified: AtomicU64::new(now),
            last_cleaned: AtomicU64::new(now),
        }
    }

    /// Create a tracker that starts touched
    pub fn new_touched() -> Self {
        let touchable = Self::new();
        touchable.touch();
        touchable
    }

    pub fn touch(&self) {
        // fetch_max keeps the stamps monotonic when touch/clean race
        self.last_modified.fetch_max(tick(), Ordering::AcqRel);
    }

    pub fn clean(&self) {
        self.last_cleaned.fetch_max(tick(), Ordering::AcqRel);
    }

    pub fn is_touched(&self) -> bool {
        self.last_modified.load(Ordering::Acquire) > self.last_cleaned.load(Ordering::Acquire)
    }

    pub fn last_modified(&self) -> u64 {
        self.last_modified.load(Ordering::Acquire)
    }

    pub fn last_cleaned(&self) -> u64 {
        self.last_cleaned.load(Ordering::Acquire)
    }
}

impl Default for Touchable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "touchable_tests.rs"]
mod tests;
