//! Unit tests for node.rs

use std::sync::{Arc, Mutex, Weak};
use crate::error::Error;
use super::{Node, NodeListener, TreeNode};

/// Records events as "<tag>:<event>"
struct Recorder {
    tag: &'static str,
    journal: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn attach(node: &Node, tag: &'static str, journal: &Arc<Mutex<Vec<String>>>) -> Arc<dyn NodeListener> {
        let listener: Arc<dyn NodeListener> = Arc::new(Recorder { tag, journal: journal.clone() });
        node.add_listener(&listener);
        listener
    }

    fn push(&self, event: &str) {
        self.journal.lock().unwrap().push(format!("{}:{}", self.tag, event));
    }
}

impl NodeListener for Recorder {
    fn on_child_added(&self, _parent: &Node, _child: &Arc<dyn TreeNode>) {
        self.push("child_added");
    }

    fn on_child_removed(&self, _parent: &Node, _child: &Arc<dyn TreeNode>) {
        self.push("child_removed");
    }

    fn on_parent_changed(&self, _node: &Node) {
        self.push("parent_changed");
    }

    fn on_will_destroy(&self, _node: &Node) {
        self.push("will_destroy");
    }
}

fn is_parent(child: &Node, parent: &Node) -> bool {
    child.parent().is_some_and(|p| std::ptr::eq(p.node(), parent))
}

// ============================================================================
// ADD / REMOVE
// ============================================================================

#[test]
fn test_add_child_sets_parent() {
    let parent = Node::new(0);
    let child = Node::new(0);

    parent.add_child(child.clone()).unwrap();

    assert_eq!(parent.children_count(), 1);
    assert!(is_parent(&child, &parent));
    assert!(std::ptr::eq(parent.child_at(0).unwrap().node(), child.as_ref()));
}

#[test]
fn test_add_self_fails() {
    let node = Node::new(0);
    let result = node.add_child(node.clone());
    assert!(matches!(result, Err(Error::InvalidNodeType(_))));
    assert_eq!(node.children_count(), 0);
}

#[test]
fn test_add_ancestor_fails() {
    let root = Node::new(0);
    let middle = Node::new(0);
    let leaf = Node::new(0);
    root.add_child(middle.clone()).unwrap();
    middle.add_child(leaf.clone()).unwrap();

    assert!(matches!(middle.add_child(root.clone()), Err(Error::InvalidNodeType(_))));
    assert!(matches!(leaf.add_child(root.clone()), Err(Error::InvalidNodeType(_))));
    assert_eq!(leaf.children_count(), 0);
    assert!(root.parent().is_none());

    // The tree is still walkable
    root.clean();
    assert!(!root.is_touched());
}

#[test]
fn test_capacity_exceeded() {
    let parent = Node::new(2);
    parent.add_child(Node::new(0)).unwrap();
    parent.add_child(Node::new(0)).unwrap();

    let result = parent.add_child(Node::new(0));
    assert!(matches!(result, Err(Error::CapacityExceeded(_))));
    assert_eq!(parent.children_count(), 2);

    parent.set_max_children(0);
    parent.add_child(Node::new(0)).unwrap();
    assert_eq!(parent.children_count(), 3);
}

#[test]
fn test_add_expired_child() {
    let parent = Node::new(0);
    let weak: Weak<dyn TreeNode> = {
        let child: Arc<dyn TreeNode> = Node::new(0);
        Arc::downgrade(&child)
    };

    let result = parent.add_child_weak(&weak);
    assert!(matches!(result, Err(Error::NullReference(_))));
}

#[test]
fn test_remove_child() {
    let parent = Node::new(0);
    let child: Arc<dyn TreeNode> = Node::new(0);
    parent.add_child(child.clone()).unwrap();

    parent.remove_child(&child).unwrap();
    assert_eq!(parent.children_count(), 0);
    assert!(child.node().parent().is_none());

    let result = parent.remove_child(&child);
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[test]
fn test_remove_child_at() {
    let parent = Node::new(0);
    let first = Node::new(0);
    let second = Node::new(0);
    parent.add_child(first.clone()).unwrap();
    parent.add_child(second.clone()).unwrap();

    let removed = parent.remove_child_at(0).unwrap();
    assert!(std::ptr::eq(removed.node(), first.as_ref()));
    assert!(std::ptr::eq(parent.child_at(0).unwrap().node(), second.as_ref()));

    assert!(matches!(parent.remove_child_at(1), Err(Error::OutOfRange(_))));
    assert!(matches!(parent.child_at(5), Err(Error::OutOfRange(_))));
}

#[test]
fn test_remove_all_children() {
    let parent = Node::new(0);
    let children: Vec<Arc<Node>> = (0..3).map(|_| Node::new(0)).collect();
    for child in &children {
        parent.add_child(child.clone()).unwrap();
    }

    parent.remove_all_children();

    assert_eq!(parent.children_count(), 0);
    assert!(children.iter().all(|c| c.parent().is_none()));
}

#[test]
fn test_shared_child_keeps_latest_parent() {
    let first = Node::new(0);
    let second = Node::new(0);
    let child: Arc<dyn TreeNode> = Node::new(0);

    first.add_child(child.clone()).unwrap();
    second.add_child(child.clone()).unwrap();
    assert!(is_parent(child.node(), &second));

    // Removing from the former parent leaves the link to the latest one
    first.remove_child(&child).unwrap();
    assert!(is_parent(child.node(), &second));
}

// ============================================================================
// TOUCH STATE
// ============================================================================

#[test]
fn test_touch_propagates_to_ancestors() {
    let root = Node::new(0);
    let middle = Node::new(0);
    let leaf = Node::new(0);
    root.add_child(middle.clone()).unwrap();
    middle.add_child(leaf.clone()).unwrap();

    root.clean();
    assert!(!root.is_touched());

    leaf.touch();
    assert!(root.is_touched());
    assert!(middle.is_touched());
    assert!(!root.is_self_touched());

    root.clean();
    assert!(!root.is_touched());
    assert!(!leaf.is_touched());
}

#[test]
fn test_add_child_touches_parent() {
    let parent = Node::new(0);
    parent.clean();

    parent.add_child(Node::new(0)).unwrap();
    assert!(parent.is_self_touched());
}

// ============================================================================
// LISTENERS
// ============================================================================

#[test]
fn test_add_notifies_parent_then_child() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let parent = Node::new(0);
    let child = Node::new(0);
    let _p = Recorder::attach(&parent, "parent", &journal);
    let _c = Recorder::attach(&child, "child", &journal);

    parent.add_child(child.clone()).unwrap();
    parent.remove_child_at(0).unwrap();

    assert_eq!(
        *journal.lock().unwrap(),
        vec![
            "parent:child_added", "child:parent_changed",
            "parent:child_removed", "child:parent_changed",
        ]
    );
}

#[test]
fn test_drop_notifies_will_destroy() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let node = Node::new(0);
    let _listener = Recorder::attach(&node, "node", &journal);

    drop(node);
    assert_eq!(*journal.lock().unwrap(), vec!["node:will_destroy"]);
}

#[test]
fn test_children_survive_parent() {
    let child = Node::new(0);
    {
        let parent = Node::new(0);
        parent.add_child(child.clone()).unwrap();
        assert!(child.parent().is_some());
    }
    assert!(child.parent().is_none());
    assert_eq!(Arc::strong_count(&child), 1);
}

#[test]
fn test_removed_listener_is_silent() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let parent = Node::new(0);
    let listener: Arc<dyn NodeListener> = Arc::new(Recorder { tag: "parent", journal: journal.clone() });
    let key = parent.add_listener(&listener);

    assert!(parent.remove_listener(key));
    parent.add_child(Node::new(0)).unwrap();
    assert!(journal.lock().unwrap().is_empty());
}
