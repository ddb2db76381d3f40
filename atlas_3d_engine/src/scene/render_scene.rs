/// Render scene: what a scene driver renders each frame.
///
/// A scene ties a root render node to a camera and, optionally, a technique.
/// Without technique, the tree is rendered directly (`render_tree`) against
/// the camera frustum, unless `render_without_technique` is turned off.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use crate::camera::Camera;
use crate::error::Result;
use crate::renderer::RenderCommand;
use crate::technique::RenderTechnique;
use crate::utils::{read, write, Emitter, ListenerKey, Touchable};
use crate::engine_debug;
use super::render_node::RenderNode;

pub trait RenderSceneListener: Send + Sync {
    fn on_camera_changed(&self, _scene: &RenderScene) {}
    fn on_root_changed(&self, _scene: &RenderScene) {}
}

pub struct RenderScene {
    name: String,
    root: RwLock<Arc<RenderNode>>,
    camera: RwLock<Camera>,
    technique: RwLock<Option<Arc<dyn RenderTechnique>>>,
    render_without_technique: AtomicBool,
    touch: Touchable,
    listeners: Emitter<dyn RenderSceneListener>,
}

impl RenderScene {
    pub fn new(name: impl Into<String>, root: Arc<RenderNode>, camera: Camera) -> Self {
        Self {
            name: name.into(),
            root: RwLock::new(root),
            camera: RwLock::new(camera),
            technique: RwLock::new(None),
            render_without_technique: AtomicBool::new(true),
            touch: Touchable::new_touched(),
            listeners: Emitter::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> Arc<RenderNode> {
        read(&self.root).clone()
    }

    pub fn set_root(&self, root: Arc<RenderNode>) {
        *write(&self.root) = root;
        self.touch.touch();
        self.listeners.send(|l| l.on_root_changed(self));
    }

    pub fn camera(&self) -> Camera {
        read(&self.camera).clone()
    }

    pub fn set_camera(&self, camera: Camera) {
        *write(&self.camera) = camera;
        self.touch.touch();
        self.listeners.send(|l| l.on_camera_changed(self));
    }

    pub fn technique(&self) -> Option<Arc<dyn RenderTechnique>> {
        read(&self.technique).clone()
    }

    pub fn set_technique(&self, technique: Option<Arc<dyn RenderTechnique>>) {
        *write(&self.technique) = technique;
        self.touch.touch();
    }

    pub fn renders_without_technique(&self) -> bool {
        self.render_without_technique.load(Ordering::Acquire)
    }

    pub fn set_render_without_technique(&self, enabled: bool) {
        self.render_without_technique.store(enabled, Ordering::Release);
        self.touch.touch();
    }

    /// True if a setter ran since the last render, or the tree changed
    pub fn is_touched(&self) -> bool {
        self.touch.is_touched() || self.root().is_touched()
    }

    /// Render the scene into `command`.
    ///
    /// Returns the number of nodes the technique rendered; direct tree
    /// renders report 0.
    pub fn render(&self, command: &dyn RenderCommand) -> Result<usize> {
        let root = self.root();
        let camera = self.camera();

        let count = match self.technique() {
            Some(technique) => technique.render(command, &root, &camera)?,
            None if self.renders_without_technique() => {
                root.render_tree(command, &camera.frustum())?;
                0
            }
            None => 0,
        };

        self.touch.clean();
        engine_debug!("atlas3d::RenderScene", "Scene '{}' rendered ({} sorted nodes)", self.name, count);
        Ok(count)
    }

    // ===== LISTENERS =====

    pub fn add_listener(&self, listener: &Arc<dyn RenderSceneListener>) -> ListenerKey {
        self.listeners.add_listener(listener)
    }

    pub fn remove_listener(&self, key: ListenerKey) -> bool {
        self.listeners.remove_listener(key)
    }
}

#[cfg(test)]
#[path = "render_scene_tests.rs"]
mod tests;
