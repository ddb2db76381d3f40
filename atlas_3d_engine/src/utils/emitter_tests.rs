use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

trait Ping: Send + Sync {
    fn ping(&self, value: usize);
}

#[derive(Default)]
struct Counter {
    total: AtomicUsize,
}

impl Ping for Counter {
    fn ping(&self, value: usize) {
        self.total.fetch_add(value, Ordering::SeqCst);
    }
}

#[test]
fn test_send_reaches_all_listeners() {
    let emitter: Emitter<dyn Ping> = Emitter::new();
    let a = Arc::new(Counter::default());
    let b = Arc::new(Counter::default());
    let a_dyn: Arc<dyn Ping> = a.clone();
    let b_dyn: Arc<dyn Ping> = b.clone();
    emitter.add_listener(&a_dyn);
    emitter.add_listener(&b_dyn);

    emitter.send(|l| l.ping(3));

    assert_eq!(a.total.load(Ordering::SeqCst), 3);
    assert_eq!(b.total.load(Ordering::SeqCst), 3);
    assert_eq!(emitter.listeners_count(), 2);
}

#[test]
fn test_remove_listener() {
    let emitter: Emitter<dyn Ping> = Emitter::new();
    let a = Arc::new(Counter::default());
    let a_dyn: Arc<dyn Ping> = a.clone();
    let key = emitter.add_listener(&a_dyn);

    assert!(emitter.remove_listener(key));
    assert!(!emitter.remove_listener(key));

    emitter.send(|l| l.ping(1));
    assert_eq!(a.total.load(Ordering::SeqCst), 0);
}

#[test]
fn test_dropped_listener_is_purged() {
    let emitter: Emitter<dyn Ping> = Emitter::new();
    {
        let a: Arc<dyn Ping> = Arc::new(Counter::default());
        emitter.add_listener(&a);
        assert_eq!(emitter.listeners_count(), 1);
    }
    assert_eq!(emitter.listeners_count(), 0);

    let mut calls = 0;
    emitter.send(|_| calls += 1);
    assert_eq!(calls, 0);
}

#[test]
fn test_listener_may_register_from_callback() {
    let emitter: Arc<Emitter<dyn Ping>> = Arc::new(Emitter::new());
    let first: Arc<dyn Ping> = Arc::new(Counter::default());
    let second: Arc<dyn Ping> = Arc::new(Counter::default());
    emitter.add_listener(&first);

    // The registry lock is not held while listeners run
    emitter.send(|_| {
        emitter.add_listener(&second);
    });
    assert_eq!(emitter.listeners_count(), 2);
}
