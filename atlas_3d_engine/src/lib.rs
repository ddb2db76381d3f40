/*!
# Atlas 3D Engine

Scene and render core of the Atlas 3D engine.

This crate holds the renderer-agnostic orchestration that sits above a GPU
backend: a scene tree with change tracking, render techniques that sort and
cull nodes against a camera, per-renderer caches of derived render state, and
a memory pool arbitrating GPU buffer allocation.

## Architecture

- **Node / RenderNode**: scene tree with recursive touch state and drawables
- **RenderTechnique**: traversal, nearest-first, farthest-first, transparency
- **CachedRenderable**: lazy, per-renderer caches rebuilt when stale
- **MemoryPool / RenderHdwBufferManager**: GPU buffer budget and mirrors
- **Renderer**: consumer identity, command and cache registries

Backends plug in through the renderer's factories (commands, caches, buffer
storages). A host-memory storage is registered by default, so the whole core
runs without a GPU.
*/

// Internal modules
mod error;
pub mod log;
pub mod buffer;
pub mod cache;
pub mod camera;
pub mod memory;
pub mod renderer;
pub mod resource;
pub mod scene;
pub mod technique;
pub mod utils;

// Main atlas3d namespace module
pub mod atlas3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Consumer
    pub use crate::renderer::{Renderer, RendererDesc, RendererId};

    // Logging sub-module (types and global logger control, NOT macros)
    pub mod log {
        pub use crate::log::{
            Logger, LogEntry, LogSeverity, DefaultLogger,
            set_logger, reset_logger, set_min_severity, min_severity,
            log, log_detailed,
        };
    }

    // Render sub-module: commands and renderables
    pub mod render {
        pub use crate::renderer::*;
    }

    pub mod buffer {
        pub use crate::buffer::*;
    }

    pub mod cache {
        pub use crate::cache::*;
    }

    pub mod camera {
        pub use crate::camera::*;
    }

    pub mod memory {
        pub use crate::memory::*;
    }

    pub mod resource {
        pub use crate::resource::*;
    }

    pub mod scene {
        pub use crate::scene::*;
    }

    pub mod technique {
        pub use crate::technique::*;
    }

    pub mod utils {
        pub use crate::utils::{Emitter, Factory, ListenerKey, Touchable};
    }
}

// Re-export math library at crate root
pub use glam;
