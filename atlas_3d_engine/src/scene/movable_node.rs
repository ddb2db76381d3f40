/// Render node positioned by its own transformation.
///
/// The transformation is the node's first drawable, so it is recorded before
/// any other drawable of the node.

use std::ops::Deref;
use std::sync::Arc;
use glam::{Mat4, Vec3};
use crate::error::Result;
use crate::resource::Transformation;
use super::node::{Node, TreeNode};
use super::render_node::{RenderNode, RenderNodeDesc};

pub struct MovableNode {
    render_node: Arc<RenderNode>,
    transformation: Arc<Transformation>,
}

impl MovableNode {
    /// # Errors
    ///
    /// `CapacityExceeded` if `desc.max_renderables` leaves no room for the
    /// transformation.
    pub fn new(desc: RenderNodeDesc) -> Result<Arc<Self>> {
        let render_node = RenderNode::new(desc);
        let transformation = Transformation::new();
        render_node.insert_renderable(0, transformation.clone())?;
        Ok(Arc::new(Self { render_node, transformation }))
    }

    pub fn render_node(&self) -> &Arc<RenderNode> {
        &self.render_node
    }

    pub fn transformation(&self) -> &Arc<Transformation> {
        &self.transformation
    }

    pub fn matrix(&self) -> Mat4 {
        self.transformation.matrix()
    }

    pub fn position(&self) -> Vec3 {
        self.transformation.position()
    }

    pub fn set_position(&self, position: Vec3) {
        self.transformation.set_position(position);
    }

    pub fn translate(&self, offset: Vec3) {
        self.transformation.translate(offset);
    }

    /// Orient the node toward `target`, with +Y up
    pub fn look_at(&self, target: Vec3) {
        self.transformation.look_at(target, Vec3::Y);
    }
}

impl Deref for MovableNode {
    type Target = RenderNode;

    fn deref(&self) -> &RenderNode {
        &self.render_node
    }
}

impl TreeNode for MovableNode {
    fn node(&self) -> &Node {
        self.render_node.node()
    }

    fn into_render_node(self: Arc<Self>) -> Option<Arc<RenderNode>> {
        Some(self.render_node.clone())
    }
}
