/// Generic scene tree node.
///
/// A node keeps its children as shared handles (`Arc<dyn TreeNode>`) and its
/// parent as a weak back-reference. The same sub-tree may be attached under
/// several parents; its parent link always names the node that added it last.
///
/// Touch state is recursive: a node is touched if it, or any descendant, was
/// touched since the last `clean()`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use crate::error::Result;
use crate::utils::{lock, read, write, Emitter, ListenerKey, Touchable};
use crate::{engine_bail, engine_err};
use super::render_node::RenderNode;

const SOURCE: &str = "atlas3d::Node";

/// Anything that can be placed in a node tree
pub trait TreeNode: Send + Sync {
    fn node(&self) -> &Node;

    /// The render node behind this handle, if it is one
    fn into_render_node(self: Arc<Self>) -> Option<Arc<RenderNode>> {
        None
    }
}

/// Tree change notifications
pub trait NodeListener: Send + Sync {
    fn on_child_added(&self, _parent: &Node, _child: &Arc<dyn TreeNode>) {}
    fn on_child_removed(&self, _parent: &Node, _child: &Arc<dyn TreeNode>) {}
    /// `node.parent()` gives the new parent (None once detached)
    fn on_parent_changed(&self, _node: &Node) {}
    fn on_will_destroy(&self, _node: &Node) {}
}

pub struct Node {
    handle: Weak<dyn TreeNode>,
    parent: RwLock<Option<Weak<dyn TreeNode>>>,
    children: Mutex<Vec<Arc<dyn TreeNode>>>,
    max_children: AtomicUsize,
    touch: Touchable,
    listeners: Emitter<dyn NodeListener>,
}

impl Node {
    /// Create a standalone node. `max_children == 0` means unbounded.
    pub fn new(max_children: usize) -> Arc<Self> {
        Arc::new_cyclic(|handle: &Weak<Node>| {
            let handle: Weak<dyn TreeNode> = handle.clone();
            Self::with_handle(handle, max_children)
        })
    }

    /// Node embedded in another tree node; `handle` is the owner's weak handle
    pub(crate) fn with_handle(handle: Weak<dyn TreeNode>, max_children: usize) -> Self {
        Self {
            handle,
            parent: RwLock::new(None),
            children: Mutex::new(Vec::new()),
            max_children: AtomicUsize::new(max_children),
            touch: Touchable::new(),
            listeners: Emitter::new(),
        }
    }

    /// Shared handle of the tree node owning this node
    pub fn handle(&self) -> Option<Arc<dyn TreeNode>> {
        self.handle.upgrade()
    }

    // ===== CHILDREN =====

    /// Append `child` and make this node its parent
    ///
    /// # Errors
    ///
    /// `InvalidNodeType` if `child` is this node or one of its ancestors,
    /// `CapacityExceeded` if the node already holds `max_children` children.
    pub fn add_child(&self, child: Arc<dyn TreeNode>) -> Result<()> {
        if std::ptr::eq(child.node(), self) {
            engine_bail!(SOURCE, InvalidNodeType, "A node cannot be its own child");
        }
        if self.has_ancestor(child.node()) {
            engine_bail!(SOURCE, InvalidNodeType, "A node cannot adopt one of its ancestors");
        }
        {
            let mut children = lock(&self.children);
            let max = self.max_children();
            if max > 0 && children.len() >= max {
                engine_bail!(SOURCE, CapacityExceeded,
                    "Node is full ({} children max)", max);
            }
            children.push(child.clone());
        }

        *write(&child.node().parent) = Some(self.handle.clone());
        self.touch();
        self.listeners.send(|l| l.on_child_added(self, &child));
        child.node().listeners.send(|l| l.on_parent_changed(child.node()));
        Ok(())
    }

    fn has_ancestor(&self, node: &Node) -> bool {
        let mut current = self.parent();
        while let Some(ancestor) = current {
            if std::ptr::eq(ancestor.node(), node) {
                return true;
            }
            current = ancestor.node().parent();
        }
        false
    }

    /// Same as [`add_child`](Self::add_child), from a weak handle
    ///
    /// # Errors
    ///
    /// `NullReference` if the child has already been dropped.
    pub fn add_child_weak(&self, child: &Weak<dyn TreeNode>) -> Result<()> {
        let child = child
            .upgrade()
            .ok_or_else(|| engine_err!(SOURCE, NullReference, "Child node was dropped"))?;
        self.add_child(child)
    }

    /// Detach `child`
    ///
    /// # Errors
    ///
    /// `NotFound` if `child` is not a child of this node.
    pub fn remove_child(&self, child: &Arc<dyn TreeNode>) -> Result<()> {
        let removed = {
            let mut children = lock(&self.children);
            let Some(index) = children.iter().position(|c| std::ptr::eq(c.node(), child.node())) else {
                engine_bail!(SOURCE, NotFound, "Node is not a child of this node");
            };
            children.remove(index)
        };
        self.detached(&removed);
        Ok(())
    }

    /// Detach and return the child at `index`
    ///
    /// # Errors
    ///
    /// `OutOfRange` if `index >= children_count()`.
    pub fn remove_child_at(&self, index: usize) -> Result<Arc<dyn TreeNode>> {
        let removed = {
            let mut children = lock(&self.children);
            if index >= children.len() {
                engine_bail!(SOURCE, OutOfRange,
                    "Child index {} out of bounds ({} children)", index, children.len());
            }
            children.remove(index)
        };
        self.detached(&removed);
        Ok(removed)
    }

    pub fn remove_all_children(&self) {
        let removed = std::mem::take(&mut *lock(&self.children));
        for child in &removed {
            self.detached(child);
        }
    }

    pub fn child_at(&self, index: usize) -> Result<Arc<dyn TreeNode>> {
        let children = lock(&self.children);
        match children.get(index) {
            Some(child) => Ok(child.clone()),
            None => engine_bail!(SOURCE, OutOfRange,
                "Child index {} out of bounds ({} children)", index, children.len()),
        }
    }

    pub fn children_count(&self) -> usize {
        lock(&self.children).len()
    }

    /// Snapshot of the children
    pub fn children(&self) -> Vec<Arc<dyn TreeNode>> {
        lock(&self.children).clone()
    }

    pub fn parent(&self) -> Option<Arc<dyn TreeNode>> {
        read(&self.parent).as_ref().and_then(Weak::upgrade)
    }

    pub fn max_children(&self) -> usize {
        self.max_children.load(Ordering::Acquire)
    }

    /// Existing children beyond a lowered maximum are kept
    pub fn set_max_children(&self, max_children: usize) {
        self.max_children.store(max_children, Ordering::Release);
    }

    fn detached(&self, child: &Arc<dyn TreeNode>) {
        {
            let mut parent = write(&child.node().parent);
            // Another parent may have adopted the child since
            let points_here = parent
                .as_ref()
                .is_some_and(|p| std::ptr::addr_eq(p.as_ptr(), self.handle.as_ptr()));
            if points_here {
                *parent = None;
            }
        }
        self.touch();
        self.listeners.send(|l| l.on_child_removed(self, child));
        child.node().listeners.send(|l| l.on_parent_changed(child.node()));
    }

    // ===== TOUCH STATE =====

    pub fn touch(&self) {
        self.touch.touch();
    }

    /// Clean this node and every descendant
    pub fn clean(&self) {
        self.touch.clean();
        for child in self.children() {
            child.node().clean();
        }
    }

    /// True if this node or any descendant is touched
    pub fn is_touched(&self) -> bool {
        self.touch.is_touched() || self.children().iter().any(|c| c.node().is_touched())
    }

    /// Touch state of this node alone
    pub fn is_self_touched(&self) -> bool {
        self.touch.is_touched()
    }

    // ===== LISTENERS =====

    pub fn add_listener(&self, listener: &Arc<dyn NodeListener>) -> ListenerKey {
        self.listeners.add_listener(listener)
    }

    pub fn remove_listener(&self, key: ListenerKey) -> bool {
        self.listeners.remove_listener(key)
    }
}

impl TreeNode for Node {
    fn node(&self) -> &Node {
        self
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        let node: &Node = self;
        node.listeners.send(|l| l.on_will_destroy(node));
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("children", &self.children_count())
            .field("max_children", &self.max_children())
            .field("touched", &self.is_touched())
            .finish()
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
