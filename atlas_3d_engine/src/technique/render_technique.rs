/// Render technique trait.
///
/// Implementors only provide [`RenderTechnique::sort`]; the provided
/// [`RenderTechnique::render`] builds the camera frustum, sorts the tree and
/// renders the collected nodes in ascending key order.

use std::sync::Arc;
use crate::camera::{Camera, Frustum};
use crate::error::Result;
use crate::renderer::RenderCommand;
use crate::scene::RenderNode;
use crate::utils::Emitter;
use crate::engine_debug;
use super::nodes_map::NodesMap;

pub trait TechniqueListener: Send + Sync {
    /// Called once per render, after sorting and before any node renders
    fn on_nodes_sorted(&self, _technique: &str, _count: usize) {}
}

pub trait RenderTechnique: Send + Sync {
    fn name(&self) -> &str;

    fn listeners(&self) -> &Emitter<dyn TechniqueListener>;

    /// Collect `node` and its sub-tree into `nodes`.
    /// Returns the number of nodes added.
    ///
    /// # Errors
    ///
    /// `InvalidNodeType` if a child is not a render node.
    fn sort(
        &self,
        node: &Arc<RenderNode>,
        camera: &Camera,
        frustum: &Frustum,
        nodes: &mut NodesMap,
    ) -> Result<usize>;

    /// Sort the tree under `root` and render the collected nodes.
    /// Returns the number of nodes rendered.
    fn render(&self, command: &dyn RenderCommand, root: &Arc<RenderNode>, camera: &Camera) -> Result<usize> {
        let frustum = camera.frustum();
        let mut nodes = NodesMap::new();
        let count = self.sort(root, camera, &frustum, &mut nodes)?;

        engine_debug!("atlas3d::RenderTechnique", "{} sorted {} nodes", self.name(), count);
        self.listeners().send(|l| l.on_nodes_sorted(self.name(), count));

        for node in nodes.iter() {
            node.render(command)?;
        }
        Ok(count)
    }
}
