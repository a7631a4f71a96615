use crate::compress::Compression;
use crate::flatten::Row;
use crate::node::{Node, NodeId, NodeStore};

/// Which rows a [`Navigator`] walks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    /// Every revealed node is its own row.
    Raw,
    /// Chains of single children are one row when compression is enabled.
    #[default]
    Compressed,
}

/// Cursor over the visible rows of a [`TreeModel`](crate::TreeModel).
///
/// Walks the revealed nodes in pre-order, the same order as [`rows`](crate::TreeModel::rows).
/// Collapsed subtrees and filtered out nodes are skipped.
///
/// Besides the rows there is one more position: "none".
/// It sits between the last and the first row.
/// Moving past the last row ends on "none", moving on from there starts at the first row again.
/// The same goes for the other direction.
/// This way [`next`](Self::next) and [`previous`](Self::previous) always undo each other.
///
/// The navigator does not change the model. Any number of them can exist at the same time.
///
/// ```
/// # use tui_tree_model::{TreeElement, TreeModel, View};
/// let mut model = TreeModel::<&str>::default();
/// model.set_children(None, ["a", "b"].map(TreeElement::new_leaf))?;
/// let mut navigator = model.navigator(View::Raw, None)?;
/// assert_eq!(navigator.current_element(), None);
/// navigator.next();
/// assert_eq!(navigator.current_element(), Some(&"a"));
/// navigator.last();
/// assert_eq!(navigator.current_element(), Some(&"b"));
/// navigator.next();
/// assert_eq!(navigator.current_element(), None);
/// # Ok::<(), tui_tree_model::TreeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Navigator<'a, T> {
    store: &'a NodeStore<T>,
    compression: Option<&'a Compression>,
    /// Head of the current row
    position: Option<NodeId>,
}

#[allow(clippy::should_implement_trait)]
impl<'a, T> Navigator<'a, T> {
    /// `start` has to be a live node.
    /// When it is not revealed the navigator starts on "none".
    pub(crate) fn new(
        store: &'a NodeStore<T>,
        compression: Option<&'a Compression>,
        start: Option<NodeId>,
    ) -> Self {
        let mut navigator = Self {
            store,
            compression,
            position: None,
        };
        let position = start
            .filter(|start| store.is_revealed(*start).unwrap_or(false))
            .map(|start| navigator.head_of(start));
        navigator.position = position;
        navigator
    }

    /// Row the cursor is on or `None` when on "none".
    #[must_use]
    pub fn current(&self) -> Option<Row> {
        self.position.map(|head| self.row(head))
    }

    /// Element of the current rows terminal node.
    #[must_use]
    pub fn current_element(&self) -> Option<&'a T> {
        let terminal = self.terminal_of(self.position?);
        self.store.get(terminal).ok().map(|node| &node.element)
    }

    pub fn first(&mut self) -> Option<Row> {
        self.position = self.first_visible(self.store.roots());
        self.current()
    }

    pub fn last(&mut self) -> Option<Row> {
        self.position = self
            .last_visible(self.store.roots())
            .map(|head| self.descend_last(head));
        self.current()
    }

    pub fn next(&mut self) -> Option<Row> {
        match self.position {
            None => self.first(),
            Some(head) => {
                self.position = self.following(head);
                self.current()
            }
        }
    }

    pub fn previous(&mut self) -> Option<Row> {
        match self.position {
            None => self.last(),
            Some(head) => {
                self.position = self.preceding(head);
                self.current()
            }
        }
    }

    fn head_of(&self, id: NodeId) -> NodeId {
        self.compression
            .map_or(id, |compression| compression.head_of(id))
    }

    fn terminal_of(&self, head: NodeId) -> NodeId {
        self.compression
            .map_or(head, |compression| compression.terminal_of(head))
    }

    /// Head of the row above `head` in the hierarchy.
    fn row_parent(&self, head: NodeId) -> Option<NodeId> {
        let parent = self.store.get(head).ok()?.parent?;
        Some(self.head_of(parent))
    }

    fn row(&self, head: NodeId) -> Row {
        let terminal = self.terminal_of(head);
        let mut depth = 0;
        let mut current = head;
        while let Some(parent) = self.row_parent(current) {
            depth += 1;
            current = parent;
        }
        Row {
            head,
            terminal,
            depth,
            collapsed: self.store.get(terminal).is_ok_and(Node::is_collapsed),
            expandable: self.store.is_expandable(terminal),
        }
    }

    fn is_visible(&self, id: NodeId) -> bool {
        self.store.get(id).is_ok_and(|node| node.visible)
    }

    fn first_visible(&self, ids: &[NodeId]) -> Option<NodeId> {
        ids.iter().copied().find(|id| self.is_visible(*id))
    }

    fn last_visible(&self, ids: &[NodeId]) -> Option<NodeId> {
        ids.iter().rev().copied().find(|id| self.is_visible(*id))
    }

    fn siblings(&self, id: NodeId) -> (&'a [NodeId], usize) {
        let store = self.store;
        let siblings = store
            .get(id)
            .and_then(|node| store.children_of(node.parent))
            .unwrap_or_default();
        let index = siblings
            .iter()
            .position(|sibling| *sibling == id)
            .unwrap_or(siblings.len());
        (siblings, index)
    }

    fn following(&self, head: NodeId) -> Option<NodeId> {
        let terminal = self.terminal_of(head);
        if self.store.shows_children(terminal) {
            let children = self.store.get(terminal).ok()?.children.as_slice();
            return self.first_visible(children);
        }
        let mut current = head;
        loop {
            let (siblings, index) = self.siblings(current);
            if let Some(next) = self.first_visible(siblings.get(index + 1..).unwrap_or_default()) {
                return Some(next);
            }
            current = self.row_parent(current)?;
        }
    }

    fn preceding(&self, head: NodeId) -> Option<NodeId> {
        let (siblings, index) = self.siblings(head);
        match self.last_visible(&siblings[..index]) {
            Some(sibling) => Some(self.descend_last(sibling)),
            None => self.row_parent(head),
        }
    }

    /// Last revealed row in the subtree of `head`.
    fn descend_last(&self, mut head: NodeId) -> NodeId {
        loop {
            let terminal = self.terminal_of(head);
            if !self.store.shows_children(terminal) {
                return head;
            }
            let children = self
                .store
                .get(terminal)
                .map(|node| node.children.as_slice())
                .unwrap_or_default();
            match self.last_visible(children) {
                Some(child) => head = child,
                None => return head,
            }
        }
    }
}
