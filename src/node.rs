use std::fmt;

use crate::error::{Result, TreeError};

/// Reference to a node inside a [`TreeModel`](crate::TreeModel).
///
/// Nodes are recreated every time their parent gets new children via
/// [`set_children`](crate::TreeModel::set_children).
/// A `NodeId` of a replaced node is stale and every operation given it fails with [`TreeError::InvalidNode`].
/// Use an identity provider and [`find`](crate::TreeModel::find) to get the current node of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    const fn slot(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// One element of the hierarchy as stored in the [`TreeModel`](crate::TreeModel).
#[derive(Debug, Clone)]
pub struct Node<T> {
    pub(crate) element: T,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Zero based depth. Depth 0 means top level.
    pub(crate) depth: usize,
    pub(crate) collapsed: bool,
    pub(crate) collapsible: bool,
    pub(crate) collapsible_override: Option<bool>,
    pub(crate) visible: bool,
    pub(crate) incompressible: bool,
}

impl<T> Node<T> {
    #[must_use]
    pub const fn element(&self) -> &T {
        &self.element
    }

    /// `None` for top level nodes.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Whether the children are hidden.
    ///
    /// A node which a filter made non-collapsible is shown expanded.
    /// Its own collapsed state is kept and applies again once the filter allows collapsing.
    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.collapsed && self.is_collapsible()
    }

    /// Whether the collapsed state can be toggled.
    /// A filter can override what the node was created with.
    #[must_use]
    pub fn is_collapsible(&self) -> bool {
        self.collapsible_override.unwrap_or(self.collapsible)
    }

    /// Result of the current filter for this node alone.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub const fn is_incompressible(&self) -> bool {
        self.incompressible
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    node: Option<Node<T>>,
}

/// Arena owning every node of the tree.
#[derive(Debug, Clone)]
pub(crate) struct NodeStore<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    roots: Vec<NodeId>,
    len: usize,
}

impl<T> Default for NodeStore<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            roots: Vec::new(),
            len: 0,
        }
    }
}

impl<T> NodeStore<T> {
    pub const fn len(&self) -> usize {
        self.len
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn get(&self, id: NodeId) -> Result<&Node<T>> {
        self.slots
            .get(id.slot())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or(TreeError::InvalidNode(id))
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Node<T>> {
        self.slots
            .get_mut(id.slot())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(TreeError::InvalidNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_ok()
    }

    /// Children of `parent` or the top level nodes when `parent` is `None`.
    pub fn children_of(&self, parent: Option<NodeId>) -> Result<&[NodeId]> {
        match parent {
            None => Ok(&self.roots),
            Some(parent) => self.get(parent).map(|node| node.children.as_slice()),
        }
    }

    pub fn insert(&mut self, node: Node<T>) -> NodeId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId::new(index, slot.generation);
        }
        #[allow(clippy::cast_possible_truncation)]
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId::new(index, 0)
    }

    /// Replace the child list of `parent` without touching the previous children.
    pub fn replace_children(
        &mut self,
        parent: Option<NodeId>,
        children: Vec<NodeId>,
    ) -> Result<Vec<NodeId>> {
        match parent {
            None => Ok(std::mem::replace(&mut self.roots, children)),
            Some(parent) => {
                let node = self.get_mut(parent)?;
                if !children.is_empty() {
                    node.collapsible = true;
                }
                Ok(std::mem::replace(&mut node.children, children))
            }
        }
    }

    /// Remove `id` and all of its descendants.
    ///
    /// Every removed node is handed to `visit` in pre-order.
    /// The parents child list is not updated.
    pub fn remove_subtree<F>(&mut self, id: NodeId, mut visit: F)
    where
        F: FnMut(NodeId, Node<T>),
    {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(slot) = self
                .slots
                .get_mut(id.slot())
                .filter(|slot| slot.generation == id.generation)
            else {
                continue;
            };
            let Some(node) = slot.node.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
            self.len -= 1;
            stack.extend(node.children.iter().rev().copied());
            visit(id, node);
        }
    }

    pub fn clear(&mut self) {
        let roots = std::mem::take(&mut self.roots);
        for root in roots {
            self.remove_subtree(root, |_, _| {});
        }
    }

    /// Live nodes in arena order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node<T>> {
        self.slots.iter_mut().filter_map(|slot| slot.node.as_mut())
    }

    /// Visible and below visible ancestors only. Collapsed ancestors are ignored.
    pub fn passes_filter(&self, id: NodeId) -> Result<bool> {
        let mut current = Some(id);
        while let Some(id) = current {
            let node = self.get(id)?;
            if !node.visible {
                return Ok(false);
            }
            current = node.parent;
        }
        Ok(true)
    }

    /// Visible, every ancestor is visible and expanded.
    pub fn is_revealed(&self, id: NodeId) -> Result<bool> {
        let node = self.get(id)?;
        if !node.visible {
            return Ok(false);
        }
        let mut current = node.parent;
        while let Some(id) = current {
            let ancestor = self.get(id)?;
            if !ancestor.visible || ancestor.is_collapsed() {
                return Ok(false);
            }
            current = ancestor.parent;
        }
        Ok(true)
    }

    pub fn visible_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(|child| self.get(*child).is_ok_and(|child| child.visible))
    }

    /// Collapsible and not all of its children are filtered out.
    /// A collapsible node without children yet is expandable.
    pub fn is_expandable(&self, id: NodeId) -> bool {
        self.get(id).is_ok_and(|node| {
            node.is_collapsible()
                && (node.children.is_empty() || self.visible_children(id).next().is_some())
        })
    }

    /// Expanded and at least one visible child.
    pub fn shows_children(&self, id: NodeId) -> bool {
        self.get(id).is_ok_and(|node| !node.is_collapsed()) && self.visible_children(id).next().is_some()
    }
}

#[cfg(test)]
fn leaf(element: &'static str, parent: Option<NodeId>) -> Node<&'static str> {
    Node {
        element,
        parent,
        children: Vec::new(),
        depth: 0,
        collapsed: false,
        collapsible: false,
        collapsible_override: None,
        visible: true,
        incompressible: false,
    }
}

#[test]
fn removed_node_ids_get_stale() {
    let mut store = NodeStore::default();
    let a = store.insert(leaf("a", None));
    store.replace_children(None, vec![a]).unwrap();
    let b = store.insert(leaf("b", Some(a)));
    store.replace_children(Some(a), vec![b]).unwrap();
    assert_eq!(store.len(), 2);

    let mut removed = Vec::new();
    store.remove_subtree(a, |id, node| removed.push((id, node.element)));
    assert_eq!(removed, [(a, "a"), (b, "b")]);
    assert_eq!(store.len(), 0);
    assert_eq!(store.get(b).unwrap_err(), TreeError::InvalidNode(b));

    // The slot is reused with a new generation
    let c = store.insert(leaf("c", None));
    assert_ne!(c, a);
    assert_ne!(c, b);
    assert!(!store.contains(a));
    assert!(!store.contains(b));
    assert_eq!(store.get(c).unwrap().element, "c");
}

#[test]
fn children_make_a_node_collapsible() {
    let mut store = NodeStore::default();
    let a = store.insert(leaf("a", None));
    assert!(!store.get(a).unwrap().is_collapsible());
    let b = store.insert(leaf("b", Some(a)));
    store.replace_children(Some(a), vec![b]).unwrap();
    assert!(store.get(a).unwrap().is_collapsible());
}

#[test]
fn revealed_needs_expanded_and_visible_ancestors() {
    let mut store = NodeStore::default();
    let a = store.insert(leaf("a", None));
    store.replace_children(None, vec![a]).unwrap();
    let b = store.insert(leaf("b", Some(a)));
    store.replace_children(Some(a), vec![b]).unwrap();
    assert!(store.is_revealed(b).unwrap());

    store.get_mut(a).unwrap().collapsed = true;
    assert!(!store.is_revealed(b).unwrap());
    assert!(store.passes_filter(b).unwrap());

    store.get_mut(a).unwrap().collapsed = false;
    store.get_mut(a).unwrap().visible = false;
    assert!(!store.is_revealed(b).unwrap());
    assert!(!store.passes_filter(b).unwrap());
}
