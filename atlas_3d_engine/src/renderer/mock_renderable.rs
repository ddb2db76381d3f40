/// Mock renderables and caches for unit tests (no GPU required)

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use crate::cache::{CachedRenderable, PerConsumerCache, RenderCache};
use crate::error::{Error, Result};
use crate::renderer::{RenderCommand, Renderable, Renderer, RendererDesc, RendererId, SubCommand};

pub fn create_renderer() -> Arc<Renderer> {
    Renderer::new(RendererDesc {
        name: "mock".to_string(),
        ..RendererDesc::default()
    })
}

// ============================================================================
// Mock sub-command
// ============================================================================

#[derive(Debug, Clone)]
pub struct MockSubCommand {
    pub label: String,
}

impl SubCommand for MockSubCommand {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn execute(&self) -> Result<()> {
        Ok(())
    }
}

/// Labels of the sub-commands recorded in `command`
pub fn labels(command: &dyn RenderCommand) -> Vec<String> {
    command.sub_commands().iter().map(|c| c.label()).collect()
}

// ============================================================================
// Mock drawable
// ============================================================================

/// Renderable that records its label into the command
pub struct MockDrawable {
    pub label: String,
    pub renders: AtomicUsize,
    pub builds: AtomicUsize,
    pub fail: AtomicBool,
    pub delay: Duration,
}

impl MockDrawable {
    pub fn new(label: &str) -> Arc<Self> {
        Self::with_delay(label, Duration::ZERO)
    }

    pub fn with_delay(label: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            renders: AtomicUsize::new(0),
            builds: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            delay,
        })
    }

    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl Renderable for MockDrawable {
    fn render(&self, command: &dyn RenderCommand) -> Result<()> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::BackendError(format!("{} failed", self.label)));
        }
        self.renders.fetch_add(1, Ordering::SeqCst);
        command.add_sub_command(Arc::new(MockSubCommand { label: self.label.clone() }));
        Ok(())
    }

    fn build(&self, _renderer: &Renderer) -> Result<()> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn size(&self, _renderer: &Renderer) -> usize {
        self.label.len()
    }
}

// ============================================================================
// Mock cached renderable
// ============================================================================

/// Shared counters of a [`CountingCached`] and its caches
#[derive(Default)]
pub struct CacheCounters {
    pub created: AtomicUsize,
    pub builds: AtomicUsize,
    pub renders: AtomicUsize,
    pub fail_builds: AtomicBool,
}

pub struct MockCache {
    renderer: RendererId,
    counters: Arc<CacheCounters>,
    version: Mutex<usize>,
}

impl RenderCache for MockCache {
    fn renderer(&self) -> RendererId {
        self.renderer
    }

    fn build(&self, _renderer: &Renderer) -> Result<()> {
        if self.counters.fail_builds.load(Ordering::SeqCst) {
            return Err(Error::BackendError("build failed".to_string()));
        }
        *self.version.lock().unwrap() += 1;
        self.counters.builds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn render(&self, command: &dyn RenderCommand) -> Result<()> {
        self.counters.renders.fetch_add(1, Ordering::SeqCst);
        let label = format!("cache v{}", self.version.lock().unwrap());
        command.add_sub_command(Arc::new(MockSubCommand { label }));
        Ok(())
    }

    fn size(&self) -> usize {
        64
    }
}

/// Cached renderable counting cache creations
pub struct CountingCached {
    caches: PerConsumerCache,
    pub counters: Arc<CacheCounters>,
    /// Time spent in `make_new_cache`, to widen race windows
    pub creation_delay: Duration,
    /// Renderer id stamped on new caches (None = the building renderer)
    pub foreign_renderer: Option<RendererId>,
}

impl CountingCached {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(creation_delay: Duration) -> Self {
        Self {
            caches: PerConsumerCache::new(),
            counters: Arc::new(CacheCounters::default()),
            creation_delay,
            foreign_renderer: None,
        }
    }

    pub fn created(&self) -> usize {
        self.counters.created.load(Ordering::SeqCst)
    }

    pub fn builds(&self) -> usize {
        self.counters.builds.load(Ordering::SeqCst)
    }
}

impl CachedRenderable for CountingCached {
    const CACHE_KIND: &'static str = "MockCache";

    fn caches(&self) -> &PerConsumerCache {
        &self.caches
    }

    fn make_new_cache(&self, renderer: &Renderer) -> Result<Arc<dyn RenderCache>> {
        if !self.creation_delay.is_zero() {
            thread::sleep(self.creation_delay);
        }
        self.counters.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockCache {
            renderer: self.foreign_renderer.unwrap_or(renderer.id()),
            counters: self.counters.clone(),
            version: Mutex::new(0),
        }))
    }
}

impl Renderable for CountingCached {
    fn render(&self, command: &dyn RenderCommand) -> Result<()> {
        self.render_cached(command)
    }

    fn build(&self, renderer: &Renderer) -> Result<()> {
        self.build_cache(renderer).map(|_| ())
    }

    fn size(&self, renderer: &Renderer) -> usize {
        self.cached_size(renderer.id())
    }
}
