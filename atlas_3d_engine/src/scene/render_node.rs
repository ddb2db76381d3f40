/// Render node: a tree node carrying drawables.
///
/// The node turns its drawables into a task list, rebuilt on the first
/// render after any change (its own or a descendant's). Rendering an
/// untouched node only runs the cached tasks.
///
/// Two walks are offered:
/// - [`RenderNode::render`] renders this node's drawables only
/// - [`RenderNode::render_tree`] renders the visible, non-culled sub-tree
///
/// Techniques (see [`crate::technique`]) sort nodes first and call `render`
/// on each of them.

use std::ops::Deref;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use bitflags::bitflags;
use crate::camera::{Frustum, AABB};
use crate::error::Result;
use crate::renderer::{RenderCommand, Renderable, Renderer};
use crate::utils::{lock, read, write, Emitter, ListenerKey};
use crate::{engine_bail, engine_debug, engine_err};
use super::drawable::{Drawable, DrawableAspect};
use super::node::{Node, TreeNode};
use super::render_task::{RenderTask, RenderTaskContainer};

const SOURCE: &str = "atlas3d::RenderNode";

bitflags! {
    /// Rendering behaviour of a render node
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderNodeFlags: u32 {
        /// Render own drawables before the children (after them otherwise)
        const RENDERABLES_FIRST = 1 << 0;
        const VISIBLE = 1 << 1;
        /// Skip the sub-tree when its bounding box is outside the frustum
        const CULL_ON_FRUSTUM = 1 << 2;
        const RENDER_CHILDREN = 1 << 3;
        /// Record drawables into a private command nested in the caller's
        const OWN_RENDER_COMMAND = 1 << 4;
    }
}

impl Default for RenderNodeFlags {
    fn default() -> Self {
        RenderNodeFlags::VISIBLE | RenderNodeFlags::CULL_ON_FRUSTUM | RenderNodeFlags::RENDER_CHILDREN
    }
}

/// Render node configuration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderNodeDesc {
    /// 0 = unbounded
    pub max_children: usize,
    /// 0 = unbounded
    pub max_renderables: usize,
    pub flags: RenderNodeFlags,
    pub bounding_box: Option<AABB>,
}

pub trait RenderNodeListener: Send + Sync {
    fn on_renderable_added(&self, _node: &RenderNode, _drawable: &Drawable) {}
    fn on_renderable_removed(&self, _node: &RenderNode, _drawable: &Drawable) {}
    fn on_will_build(&self, _node: &RenderNode, _renderer: &Renderer) {}
    fn on_did_build(&self, _node: &RenderNode, _renderer: &Renderer) {}
}

pub struct RenderNode {
    node: Node,
    renderables: Mutex<Vec<Drawable>>,
    max_renderables: AtomicUsize,
    flags: AtomicU32,
    bounding_box: RwLock<Option<AABB>>,
    tasks: RenderTaskContainer,
    /// Held across the task swap and the clean of one build
    building: Mutex<()>,
    private_command: Mutex<Option<Arc<dyn RenderCommand>>>,
    listeners: Emitter<dyn RenderNodeListener>,
}

impl RenderNode {
    /// Create a render node. It starts touched, so the first render builds it.
    pub fn new(desc: RenderNodeDesc) -> Arc<Self> {
        let node = Arc::new_cyclic(|handle: &Weak<RenderNode>| {
            let handle: Weak<dyn TreeNode> = handle.clone();
            Self {
                node: Node::with_handle(handle, desc.max_children),
                renderables: Mutex::new(Vec::new()),
                max_renderables: AtomicUsize::new(desc.max_renderables),
                flags: AtomicU32::new(desc.flags.bits()),
                bounding_box: RwLock::new(desc.bounding_box),
                tasks: RenderTaskContainer::new(),
                building: Mutex::new(()),
                private_command: Mutex::new(None),
                listeners: Emitter::new(),
            }
        });
        node.node.touch();
        node
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Tasks built from the drawables (unordered tasks may be added here)
    pub fn tasks(&self) -> &RenderTaskContainer {
        &self.tasks
    }

    /// Children of this node, as render nodes
    ///
    /// # Errors
    ///
    /// `InvalidNodeType` if a child is not a render node.
    pub fn child_render_nodes(&self) -> Result<Vec<Arc<RenderNode>>> {
        self.node
            .children()
            .into_iter()
            .map(|child| {
                child.into_render_node().ok_or_else(|| {
                    engine_err!(SOURCE, InvalidNodeType, "Child of a render node is not a render node")
                })
            })
            .collect()
    }

    // ===== DRAWABLES =====

    pub fn add_renderable(&self, drawable: impl Into<Drawable>) -> Result<()> {
        let len = self.renderables_count();
        self.insert_renderables(len, vec![drawable.into()])
    }

    pub fn add_renderables(&self, drawables: Vec<Drawable>) -> Result<()> {
        let len = self.renderables_count();
        self.insert_renderables(len, drawables)
    }

    /// Insert at `index` (`index == renderables_count()` appends)
    pub fn insert_renderable(&self, index: usize, drawable: impl Into<Drawable>) -> Result<()> {
        self.insert_renderables(index, vec![drawable.into()])
    }

    /// Insert every drawable at `index`, keeping their order
    ///
    /// # Errors
    ///
    /// `OutOfRange` if `index > renderables_count()`, `CapacityExceeded` if
    /// the drawables would not all fit. Nothing is inserted on error.
    pub fn insert_renderables(&self, index: usize, drawables: Vec<Drawable>) -> Result<()> {
        {
            let mut renderables = lock(&self.renderables);
            if index > renderables.len() {
                engine_bail!(SOURCE, OutOfRange,
                    "Renderable index {} out of bounds ({} renderables)", index, renderables.len());
            }
            let max = self.max_renderables();
            if max > 0 && renderables.len() + drawables.len() > max {
                engine_bail!(SOURCE, CapacityExceeded,
                    "Cannot add {} renderables ({} / {} used)", drawables.len(), renderables.len(), max);
            }
            for (offset, drawable) in drawables.iter().enumerate() {
                renderables.insert(index + offset, drawable.clone());
            }
        }

        self.node.touch();
        for drawable in &drawables {
            self.listeners.send(|l| l.on_renderable_added(self, drawable));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// `NotFound` if `drawable` is not attached to this node.
    pub fn remove_renderable(&self, drawable: &Drawable) -> Result<()> {
        let removed = {
            let mut renderables = lock(&self.renderables);
            let Some(index) = renderables.iter().position(|d| d.ptr_eq(drawable)) else {
                engine_bail!(SOURCE, NotFound, "{} is not attached to this node", drawable.kind());
            };
            renderables.remove(index)
        };
        self.removed(&removed);
        Ok(())
    }

    pub fn remove_renderable_at(&self, index: usize) -> Result<Drawable> {
        let removed = {
            let mut renderables = lock(&self.renderables);
            if index >= renderables.len() {
                engine_bail!(SOURCE, OutOfRange,
                    "Renderable index {} out of bounds ({} renderables)", index, renderables.len());
            }
            renderables.remove(index)
        };
        self.removed(&removed);
        Ok(removed)
    }

    pub fn remove_all_renderables(&self) {
        let removed = std::mem::take(&mut *lock(&self.renderables));
        for drawable in &removed {
            self.removed(drawable);
        }
    }

    pub fn renderable_at(&self, index: usize) -> Result<Drawable> {
        let renderables = lock(&self.renderables);
        match renderables.get(index) {
            Some(drawable) => Ok(drawable.clone()),
            None => engine_bail!(SOURCE, OutOfRange,
                "Renderable index {} out of bounds ({} renderables)", index, renderables.len()),
        }
    }

    pub fn renderables_count(&self) -> usize {
        lock(&self.renderables).len()
    }

    /// Snapshot of the attached drawables
    pub fn renderables(&self) -> Vec<Drawable> {
        lock(&self.renderables).clone()
    }

    pub fn max_renderables(&self) -> usize {
        self.max_renderables.load(Ordering::Acquire)
    }

    pub fn set_max_renderables(&self, max_renderables: usize) {
        self.max_renderables.store(max_renderables, Ordering::Release);
    }

    /// First attached drawable of kind `T`
    pub fn renderable_of<T: DrawableAspect>(&self) -> Option<Arc<T>> {
        lock(&self.renderables).iter().find_map(T::from_drawable)
    }

    /// Same as [`renderable_of`](Self::renderable_of), failing with `NotFound`
    pub fn find_renderable<T: DrawableAspect>(&self) -> Result<Arc<T>> {
        self.renderable_of::<T>().ok_or_else(|| {
            engine_err!(SOURCE, NotFound, "No {} attached to this node", std::any::type_name::<T>())
        })
    }

    fn removed(&self, drawable: &Drawable) {
        self.node.touch();
        self.listeners.send(|l| l.on_renderable_removed(self, drawable));
    }

    // ===== FLAGS =====

    pub fn flags(&self) -> RenderNodeFlags {
        RenderNodeFlags::from_bits_truncate(self.flags.load(Ordering::Acquire))
    }

    pub fn set_flags(&self, flags: RenderNodeFlags) {
        self.flags.store(flags.bits(), Ordering::Release);
        self.node.touch();
    }

    pub fn set_flag(&self, flag: RenderNodeFlags, enabled: bool) {
        if enabled {
            self.flags.fetch_or(flag.bits(), Ordering::AcqRel);
        } else {
            self.flags.fetch_and(!flag.bits(), Ordering::AcqRel);
        }
        self.node.touch();
    }

    pub fn is_visible(&self) -> bool {
        self.flags().contains(RenderNodeFlags::VISIBLE)
    }

    pub fn set_visible(&self, visible: bool) {
        self.set_flag(RenderNodeFlags::VISIBLE, visible);
    }

    pub fn renders_renderables_first(&self) -> bool {
        self.flags().contains(RenderNodeFlags::RENDERABLES_FIRST)
    }

    pub fn set_render_renderables_first(&self, enabled: bool) {
        self.set_flag(RenderNodeFlags::RENDERABLES_FIRST, enabled);
    }

    pub fn culls_on_frustum(&self) -> bool {
        self.flags().contains(RenderNodeFlags::CULL_ON_FRUSTUM)
    }

    pub fn set_cull_on_frustum(&self, enabled: bool) {
        self.set_flag(RenderNodeFlags::CULL_ON_FRUSTUM, enabled);
    }

    pub fn renders_children(&self) -> bool {
        self.flags().contains(RenderNodeFlags::RENDER_CHILDREN)
    }

    pub fn set_render_children(&self, enabled: bool) {
        self.set_flag(RenderNodeFlags::RENDER_CHILDREN, enabled);
    }

    pub fn has_own_render_command(&self) -> bool {
        self.flags().contains(RenderNodeFlags::OWN_RENDER_COMMAND)
    }

    pub fn set_own_render_command(&self, enabled: bool) {
        self.set_flag(RenderNodeFlags::OWN_RENDER_COMMAND, enabled);
    }

    // ===== BOUNDS =====

    pub fn bounding_box(&self) -> Option<AABB> {
        *read(&self.bounding_box)
    }

    pub fn set_bounding_box(&self, bounding_box: Option<AABB>) {
        *write(&self.bounding_box) = bounding_box;
        self.node.touch();
    }

    /// True if the node has a bounding box outside `frustum`.
    /// A node without bounding box is never culled.
    pub fn is_culled(&self, frustum: &Frustum) -> bool {
        self.bounding_box()
            .is_some_and(|aabb| !frustum.intersects_aabb(&aabb))
    }

    // ===== BUILD / RENDER =====

    /// Rebuild the task list and the drawables' state for `renderer`.
    ///
    /// Touched descendant render nodes are rebuilt too, then the whole
    /// sub-tree is cleaned.
    pub fn build(&self, renderer: &Renderer) -> Result<()> {
        self.listeners.send(|l| l.on_will_build(self, renderer));

        let building = lock(&self.building);
        let drawables = self.renderables();
        self.tasks.replace_ordered(
            drawables
                .iter()
                .map(|drawable| RenderTask::from_weak(drawable.downgrade()))
                .collect(),
        );
        for drawable in &drawables {
            drawable.as_renderable().build(renderer)?;
        }

        for child in self.node.children() {
            if !child.node().is_touched() {
                continue;
            }
            if let Some(child) = child.into_render_node() {
                child.build(renderer)?;
            }
        }

        self.node.clean();
        drop(building);
        engine_debug!(SOURCE, "Built {} tasks for renderer {}", drawables.len(), renderer.id());
        self.listeners.send(|l| l.on_did_build(self, renderer));
        Ok(())
    }

    /// Render this node's drawables into `command`, rebuilding first if the
    /// node is touched
    pub fn render(&self, command: &dyn RenderCommand) -> Result<()> {
        let renderer = command.renderer()?;
        if self.node.is_touched() {
            self.build(&renderer)?;
        }

        if !self.has_own_render_command() {
            return self.tasks.render(command);
        }

        let private = self.private_command_for(&renderer)?;
        private.clear();
        self.tasks.render(private.as_ref())?;
        command.add_sub_command(private.into_sub_command());
        Ok(())
    }

    /// Render the visible sub-tree, skipping nodes culled by `frustum`
    ///
    /// # Errors
    ///
    /// `InvalidNodeType` if a child is not a render node.
    pub fn render_tree(&self, command: &dyn RenderCommand, frustum: &Frustum) -> Result<()> {
        if !self.is_visible() {
            return Ok(());
        }
        if self.culls_on_frustum() && self.is_culled(frustum) {
            return Ok(());
        }

        let renderables_first = self.renders_renderables_first();
        if renderables_first {
            self.render(command)?;
        }
        if self.renders_children() {
            for child in self.child_render_nodes()? {
                child.render_tree(command, frustum)?;
            }
        }
        if !renderables_first {
            self.render(command)?;
        }
        Ok(())
    }

    /// Private command of this node, if one was created
    pub fn private_command(&self) -> Option<Arc<dyn RenderCommand>> {
        lock(&self.private_command).clone()
    }

    fn private_command_for(&self, renderer: &Arc<Renderer>) -> Result<Arc<dyn RenderCommand>> {
        let mut slot = lock(&self.private_command);
        if let Some(command) = slot.as_ref() {
            if command.renderer_id() == renderer.id() {
                return Ok(command.clone());
            }
        }
        let command = renderer.new_command()?;
        *slot = Some(command.clone());
        Ok(command)
    }

    /// Bytes held for `renderer` by the attached drawables
    pub fn size(&self, renderer: &Renderer) -> usize {
        self.renderables()
            .iter()
            .map(|d| d.as_renderable().size(renderer))
            .sum()
    }

    // ===== LISTENERS =====

    pub fn add_render_listener(&self, listener: &Arc<dyn RenderNodeListener>) -> ListenerKey {
        self.listeners.add_listener(listener)
    }

    pub fn remove_render_listener(&self, key: ListenerKey) -> bool {
        self.listeners.remove_listener(key)
    }
}

impl Deref for RenderNode {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.node
    }
}

impl TreeNode for RenderNode {
    fn node(&self) -> &Node {
        &self.node
    }

    fn into_render_node(self: Arc<Self>) -> Option<Arc<RenderNode>> {
        Some(self)
    }
}

impl Renderable for RenderNode {
    fn render(&self, command: &dyn RenderCommand) -> Result<()> {
        RenderNode::render(self, command)
    }

    fn build(&self, renderer: &Renderer) -> Result<()> {
        RenderNode::build(self, renderer)
    }

    fn size(&self, renderer: &Renderer) -> usize {
        RenderNode::size(self, renderer)
    }
}

impl std::fmt::Debug for RenderNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderNode")
            .field("renderables", &self.renderables_count())
            .field("children", &self.node.children_count())
            .field("flags", &self.flags())
            .field("bounding_box", &self.bounding_box())
            .finish()
    }
}

#[cfg(test)]
#[path = "render_node_tests.rs"]
mod tests;
