//! Render techniques.
//!
//! A technique walks a render node tree, collects the nodes to draw into a
//! [`NodesMap`] keyed by distance, then renders them in ascending key order.

mod nodes_map;
mod render_technique;
mod techniques;

pub use nodes_map::{DistanceKey, NodesMap};
pub use render_technique::{RenderTechnique, TechniqueListener};
pub use techniques::{FarthestTechnique, NearestTechnique, NodeTraversalTechnique, TransparentTechnique};
