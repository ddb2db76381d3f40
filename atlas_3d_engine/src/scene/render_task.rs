/// Render tasks of a render node.
///
/// A task renders one drawable through a weak reference: a task whose
/// drawable was dropped does nothing. Ordered tasks run in insertion order on
/// the calling thread, then unordered tasks run concurrently on scoped
/// threads. Every unordered task is joined before `render` returns.

use std::sync::{Arc, Mutex, Weak};
use std::thread;
use crate::error::Result;
use crate::renderer::{RenderCommand, Renderable};
use crate::utils::lock;
use crate::engine_err;

#[derive(Clone)]
pub struct RenderTask {
    target: Weak<dyn Renderable>,
}

impl RenderTask {
    pub fn new(target: &Arc<dyn Renderable>) -> Self {
        Self {
            target: Arc::downgrade(target),
        }
    }

    pub fn from_weak(target: Weak<dyn Renderable>) -> Self {
        Self { target }
    }

    pub fn is_expired(&self) -> bool {
        self.target.strong_count() == 0
    }

    /// Render the target into `command`; no-op once the target is dropped
    pub fn run(&self, command: &dyn RenderCommand) -> Result<()> {
        match self.target.upgrade() {
            Some(target) => target.render(command),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct RenderTaskContainer {
    ordered: Mutex<Vec<RenderTask>>,
    unordered: Mutex<Vec<RenderTask>>,
}

impl RenderTaskContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_ordered(&self, task: RenderTask) {
        lock(&self.ordered).push(task);
    }

    pub fn add_unordered(&self, task: RenderTask) {
        lock(&self.unordered).push(task);
    }

    /// Swap the whole ordered list in one step
    pub fn replace_ordered(&self, tasks: Vec<RenderTask>) {
        *lock(&self.ordered) = tasks;
    }

    pub fn ordered_count(&self) -> usize {
        lock(&self.ordered).len()
    }

    pub fn unordered_count(&self) -> usize {
        lock(&self.unordered).len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_count() == 0 && self.unordered_count() == 0
    }

    pub fn clear(&self) {
        lock(&self.ordered).clear();
        lock(&self.unordered).clear();
    }

    /// Run every task against `command`.
    ///
    /// The first ordered failure stops the ordered pass. Unordered tasks all
    /// run to completion; the first failure among them is returned.
    pub fn render(&self, command: &dyn RenderCommand) -> Result<()> {
        let ordered = lock(&self.ordered).clone();
        let unordered = lock(&self.unordered).clone();

        for task in &ordered {
            task.run(command)?;
        }

        if unordered.is_empty() {
            return Ok(());
        }

        let results: Vec<Result<()>> = thread::scope(|s| {
            let handles: Vec<_> = unordered
                .iter()
                .map(|task| s.spawn(move || task.run(command)))
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        Err(engine_err!("atlas3d::RenderTaskContainer", BackendError,
                            "Unordered render task panicked"))
                    })
                })
                .collect()
        });

        results.into_iter().collect()
    }
}

#[cfg(test)]
#[path = "render_task_tests.rs"]
mod tests;
