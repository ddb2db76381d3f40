//! Scene tree.
//!
//! - [`Node`]: generic parent/child hierarchy with recursive touch state
//! - [`RenderNode`]: node carrying drawables, rendered through a task list
//! - [`MovableNode`]: render node positioned by its own transformation
//! - [`RenderScene`]: root node + camera + optional technique
//! - [`RenderSceneGroup`]: scenes sharing cameras, techniques and a root,
//!   each recorded into its own command

mod drawable;
mod movable_node;
mod node;
mod render_node;
mod render_scene;
mod render_scene_group;
mod render_task;

pub use drawable::{Drawable, DrawableAspect};
pub use movable_node::MovableNode;
pub use node::{Node, NodeListener, TreeNode};
pub use render_node::{RenderNode, RenderNodeDesc, RenderNodeFlags, RenderNodeListener};
pub use render_scene::{RenderScene, RenderSceneListener};
pub use render_scene_group::{RenderSceneGroup, TechniqueChoice};
pub use render_task::{RenderTask, RenderTaskContainer};
