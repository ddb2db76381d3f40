/// Built-in techniques.
///
/// | Technique | Key | Collects |
/// |---|---|---|
/// | [`NodeTraversalTechnique`] | 0 | every visible node (optionally not culled) |
/// | [`NearestTechnique`] | camera to bounding box center | visible, not culled nodes |
/// | [`FarthestTechnique`] | same as nearest | same as nearest |
/// | [`TransparentTechnique`] | same as nearest | nodes holding a transparent material |
///
/// Nodes without bounding box are keyed `+inf`. An invisible or culled node
/// prunes its whole sub-tree.

use std::sync::Arc;
use crate::camera::{Camera, Frustum};
use crate::error::Result;
use crate::resource::Material;
use crate::scene::RenderNode;
use crate::utils::Emitter;
use super::nodes_map::NodesMap;
use super::render_technique::{RenderTechnique, TechniqueListener};

fn camera_distance(node: &RenderNode, camera: &Camera) -> f32 {
    node.bounding_box()
        .map_or(f32::INFINITY, |aabb| camera.distance(aabb.center()).length())
}

/// Shared walk of the distance-keyed techniques.
/// `collect` decides whether a node contributes itself; children are always
/// walked.
fn sort_by_distance(
    node: &Arc<RenderNode>,
    camera: &Camera,
    frustum: &Frustum,
    nodes: &mut NodesMap,
    collect: &dyn Fn(&RenderNode) -> bool,
) -> Result<usize> {
    if !node.is_visible() || node.is_culled(frustum) {
        return Ok(0);
    }

    let own = collect(node.as_ref());
    let renderables_first = node.renders_renderables_first();
    let mut count = 0;

    if own && renderables_first {
        nodes.insert(camera_distance(node, camera), node.clone());
        count += 1;
    }
    for child in node.child_render_nodes()? {
        count += sort_by_distance(&child, camera, frustum, nodes, collect)?;
    }
    if own && !renderables_first {
        nodes.insert(camera_distance(node, camera), node.clone());
        count += 1;
    }
    Ok(count)
}

// ===== NODE TRAVERSAL =====

/// Tree order, no distance sorting
#[derive(Default)]
pub struct NodeTraversalTechnique {
    cull: bool,
    listeners: Emitter<dyn TechniqueListener>,
}

impl NodeTraversalTechnique {
    pub fn new() -> Self {
        Self::default()
    }

    /// Traversal skipping nodes outside the frustum
    pub fn with_culling() -> Self {
        Self {
            cull: true,
            listeners: Emitter::new(),
        }
    }

    pub fn culls(&self) -> bool {
        self.cull
    }
}

impl RenderTechnique for NodeTraversalTechnique {
    fn name(&self) -> &str {
        "NodeTraversalTechnique"
    }

    fn listeners(&self) -> &Emitter<dyn TechniqueListener> {
        &self.listeners
    }

    fn sort(
        &self,
        node: &Arc<RenderNode>,
        camera: &Camera,
        frustum: &Frustum,
        nodes: &mut NodesMap,
    ) -> Result<usize> {
        if !node.is_visible() || (self.cull && node.is_culled(frustum)) {
            return Ok(0);
        }

        let renderables_first = node.renders_renderables_first();
        let mut count = 0;
        if renderables_first {
            nodes.insert(0.0, node.clone());
            count += 1;
        }
        for child in node.child_render_nodes()? {
            count += self.sort(&child, camera, frustum, nodes)?;
        }
        if !renderables_first {
            nodes.insert(0.0, node.clone());
            count += 1;
        }
        Ok(count)
    }
}

// ===== NEAREST / FARTHEST =====

/// Nearest nodes render first
#[derive(Default)]
pub struct NearestTechnique {
    listeners: Emitter<dyn TechniqueListener>,
}

impl NearestTechnique {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderTechnique for NearestTechnique {
    fn name(&self) -> &str {
        "NearestTechnique"
    }

    fn listeners(&self) -> &Emitter<dyn TechniqueListener> {
        &self.listeners
    }

    fn sort(
        &self,
        node: &Arc<RenderNode>,
        camera: &Camera,
        frustum: &Frustum,
        nodes: &mut NodesMap,
    ) -> Result<usize> {
        sort_by_distance(node, camera, frustum, nodes, &|_| true)
    }
}

/// Keys nodes like [`NearestTechnique`]; consumers read the map back to front
#[derive(Default)]
pub struct FarthestTechnique {
    listeners: Emitter<dyn TechniqueListener>,
}

impl FarthestTechnique {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderTechnique for FarthestTechnique {
    fn name(&self) -> &str {
        "FarthestTechnique"
    }

    fn listeners(&self) -> &Emitter<dyn TechniqueListener> {
        &self.listeners
    }

    fn sort(
        &self,
        node: &Arc<RenderNode>,
        camera: &Camera,
        frustum: &Frustum,
        nodes: &mut NodesMap,
    ) -> Result<usize> {
        sort_by_distance(node, camera, frustum, nodes, &|_| true)
    }
}

// ===== TRANSPARENT =====

/// Collects only nodes whose first material is transparent.
/// Opaque nodes still have their children walked.
#[derive(Default)]
pub struct TransparentTechnique {
    listeners: Emitter<dyn TechniqueListener>,
}

impl TransparentTechnique {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderTechnique for TransparentTechnique {
    fn name(&self) -> &str {
        "TransparentTechnique"
    }

    fn listeners(&self) -> &Emitter<dyn TechniqueListener> {
        &self.listeners
    }

    fn sort(
        &self,
        node: &Arc<RenderNode>,
        camera: &Camera,
        frustum: &Frustum,
        nodes: &mut NodesMap,
    ) -> Result<usize> {
        sort_by_distance(node, camera, frustum, nodes, &|node| {
            node.renderable_of::<Material>()
                .is_some_and(|material| material.is_transparent())
        })
    }
}

#[cfg(test)]
#[path = "techniques_tests.rs"]
mod tests;
