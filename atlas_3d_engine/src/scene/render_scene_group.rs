/// Render scene group: several scenes sharing cameras, techniques and a root.
///
/// The group owns indexed lists of scenes, cameras, techniques and commands.
/// Each command is bound to one scene with [`RenderSceneGroup::select_command`];
/// [`RenderSceneGroup::render`] then re-records every bound command whose
/// scene changed, and leaves the others as they are.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, RwLock};
use crate::camera::Camera;
use crate::error::Result;
use crate::renderer::{RenderCommand, Renderer};
use crate::technique::RenderTechnique;
use crate::utils::{lock, read, write, Touchable};
use crate::{engine_bail, engine_debug, engine_err};
use super::render_node::RenderNode;
use super::render_scene::RenderScene;

const SOURCE: &str = "atlas3d::RenderSceneGroup";

/// Technique given to [`RenderSceneGroup::make_new_scene`]
#[derive(Clone)]
pub enum TechniqueChoice {
    /// Added to the group, then used
    New(Arc<dyn RenderTechnique>),
    /// Index of a technique already in the group
    Index(usize),
}

#[derive(Default)]
pub struct RenderSceneGroup {
    scenes: RwLock<Vec<Arc<RenderScene>>>,
    cameras: RwLock<Vec<Camera>>,
    techniques: RwLock<Vec<Arc<dyn RenderTechnique>>>,
    commands: RwLock<Vec<Arc<dyn RenderCommand>>>,
    shared_node: RwLock<Option<Arc<RenderNode>>>,
    /// command index -> scene index
    bindings: Mutex<BTreeMap<usize, usize>>,
    /// Commands bound since the last render, re-recorded even if their
    /// scene is clean
    rebound: Mutex<BTreeSet<usize>>,
    touch: Touchable,
}

fn item_at<T: Clone>(items: &[T], index: usize, what: &str) -> Result<T> {
    items.get(index).cloned().ok_or_else(|| {
        engine_err!(SOURCE, OutOfRange,
            "{} index {} out of bounds ({} {}s)", what, index, items.len(), what)
    })
}

impl RenderSceneGroup {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== CONTENT =====

    /// Add `scene` and return its index. When a shared node is set, it
    /// becomes the scene's root.
    pub fn add_scene(&self, scene: Arc<RenderScene>) -> usize {
        if let Some(node) = self.shared_node() {
            scene.set_root(node);
        }
        let mut scenes = write(&self.scenes);
        scenes.push(scene);
        self.touch.touch();
        scenes.len() - 1
    }

    pub fn add_camera(&self, camera: Camera) -> usize {
        let mut cameras = write(&self.cameras);
        cameras.push(camera);
        self.touch.touch();
        cameras.len() - 1
    }

    pub fn add_technique(&self, technique: Arc<dyn RenderTechnique>) -> usize {
        let mut techniques = write(&self.techniques);
        techniques.push(technique);
        self.touch.touch();
        techniques.len() - 1
    }

    pub fn add_command(&self, command: Arc<dyn RenderCommand>) -> usize {
        let mut commands = write(&self.commands);
        commands.push(command);
        self.touch.touch();
        commands.len() - 1
    }

    /// Create a command on `renderer` and add it
    ///
    /// # Errors
    ///
    /// Propagates the renderer's command construction errors.
    pub fn make_command(&self, renderer: &Arc<Renderer>) -> Result<usize> {
        Ok(self.add_command(renderer.new_command()?))
    }

    /// Add `scene` together with a new command bound to it
    pub fn add_scene_command(&self, scene: Arc<RenderScene>, renderer: &Arc<Renderer>) -> Result<usize> {
        let command = self.make_command(renderer)?;
        let scene = self.add_scene(scene);
        self.select_command(command, scene)?;
        Ok(scene)
    }

    /// Create a scene rooted at the shared node, looking through the first
    /// camera, and bind it to a new command
    ///
    /// # Errors
    ///
    /// - `NullReference` if no shared node is set
    /// - `NotFound` if the group has no camera
    /// - `OutOfRange` for an unknown technique index
    pub fn make_new_scene(
        &self,
        name: &str,
        renderer: &Arc<Renderer>,
        technique: TechniqueChoice,
    ) -> Result<usize> {
        let root = self.shared_node().ok_or_else(|| {
            engine_err!(SOURCE, NullReference, "Scene '{}' needs a shared node", name)
        })?;
        let camera = read(&self.cameras).first().cloned().ok_or_else(|| {
            engine_err!(SOURCE, NotFound, "Scene '{}' needs a camera in the group", name)
        })?;
        let technique = match technique {
            TechniqueChoice::New(technique) => {
                self.add_technique(technique.clone());
                technique
            }
            TechniqueChoice::Index(index) => self.technique_at(index)?,
        };

        let scene = Arc::new(RenderScene::new(name, root, camera));
        scene.set_technique(Some(technique));
        self.add_scene_command(scene, renderer)
    }

    // ===== ACCESS =====

    pub fn scene_at(&self, index: usize) -> Result<Arc<RenderScene>> {
        item_at(&read(&self.scenes), index, "scene")
    }

    pub fn scenes_count(&self) -> usize {
        read(&self.scenes).len()
    }

    pub fn camera_at(&self, index: usize) -> Result<Camera> {
        item_at(&read(&self.cameras), index, "camera")
    }

    pub fn cameras_count(&self) -> usize {
        read(&self.cameras).len()
    }

    pub fn technique_at(&self, index: usize) -> Result<Arc<dyn RenderTechnique>> {
        item_at(&read(&self.techniques), index, "technique")
    }

    pub fn techniques_count(&self) -> usize {
        read(&self.techniques).len()
    }

    pub fn command_at(&self, index: usize) -> Result<Arc<dyn RenderCommand>> {
        item_at(&read(&self.commands), index, "command")
    }

    pub fn commands_count(&self) -> usize {
        read(&self.commands).len()
    }

    /// Scene index bound to command `command`, if any
    pub fn scene_for_command(&self, command: usize) -> Option<usize> {
        lock(&self.bindings).get(&command).copied()
    }

    // ===== SELECTION =====

    pub fn select_technique(&self, technique: usize, scene: usize) -> Result<()> {
        let technique = self.technique_at(technique)?;
        self.scene_at(scene)?.set_technique(Some(technique));
        Ok(())
    }

    pub fn select_camera(&self, camera: usize, scene: usize) -> Result<()> {
        let camera = self.camera_at(camera)?;
        self.scene_at(scene)?.set_camera(camera);
        Ok(())
    }

    /// Bind `command` to `scene`, replacing the command's previous scene
    pub fn select_command(&self, command: usize, scene: usize) -> Result<()> {
        self.command_at(command)?;
        self.scene_at(scene)?;
        lock(&self.bindings).insert(command, scene);
        lock(&self.rebound).insert(command);
        self.touch.touch();
        Ok(())
    }

    /// Select technique, camera and command of `scene` at once.
    ///
    /// Every index is checked before anything changes.
    pub fn select_all(&self, technique: usize, camera: usize, command: usize, scene: usize) -> Result<()> {
        let technique = self.technique_at(technique)?;
        let camera = self.camera_at(camera)?;
        self.command_at(command)?;
        let target = self.scene_at(scene)?;

        target.set_camera(camera);
        target.set_technique(Some(technique));
        lock(&self.bindings).insert(command, scene);
        lock(&self.rebound).insert(command);
        self.touch.touch();
        Ok(())
    }

    // ===== SHARED NODE =====

    pub fn shared_node(&self) -> Option<Arc<RenderNode>> {
        read(&self.shared_node).clone()
    }

    /// Set the root shared by every scene of the group
    pub fn set_shared_node(&self, node: Arc<RenderNode>) {
        *write(&self.shared_node) = Some(node.clone());
        for scene in read(&self.scenes).iter() {
            scene.set_root(node.clone());
        }
        self.touch.touch();
    }

    // ===== RENDER =====

    /// True if the group changed since the last render, or one of its
    /// scenes did
    pub fn is_touched(&self) -> bool {
        self.touch.is_touched() || read(&self.scenes).iter().any(|scene| scene.is_touched())
    }

    /// Re-record every bound command whose scene is touched, or which was
    /// bound since the last render. Each such command is cleared first.
    ///
    /// Returns the number of commands recorded.
    ///
    /// # Errors
    ///
    /// The first scene render error. Commands after it are left as they are.
    pub fn render(&self) -> Result<usize> {
        if !self.is_touched() {
            return Ok(0);
        }

        let bindings = lock(&self.bindings).clone();
        let rebound = std::mem::take(&mut *lock(&self.rebound));
        let scenes = read(&self.scenes).clone();
        let commands = read(&self.commands).clone();

        // A scene bound to several commands is cleaned by its first render
        let touched: Vec<bool> = scenes.iter().map(|scene| scene.is_touched()).collect();

        let mut recorded = 0;
        for (command, scene) in bindings {
            let (Some(target), Some(scene_touched)) = (commands.get(command), touched.get(scene)) else {
                engine_bail!(SOURCE, OutOfRange,
                    "Binding of command {} to scene {} is out of bounds", command, scene);
            };
            if !scene_touched && !rebound.contains(&command) {
                continue;
            }
            target.clear();
            scenes[scene].render(target.as_ref())?;
            recorded += 1;
        }

        self.touch.clean();
        engine_debug!(SOURCE, "Recorded {} commands", recorded);
        Ok(recorded)
    }
}

#[cfg(test)]
#[path = "render_scene_group_tests.rs"]
mod tests;
