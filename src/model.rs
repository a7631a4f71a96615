use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use tracing::{debug, trace};

use crate::compress::Compression;
use crate::element::{Staged, TreeElement};
use crate::error::{Result, TreeError};
use crate::filter::{FilterResult, TreeFilter};
use crate::flatten::{flatten, Projection, Row, RowSplice};
use crate::identity::{IdentityProvider, IdentityTracker, TraitKey};
use crate::navigator::{Navigator, View};
use crate::node::{Node, NodeId, NodeStore};
use crate::options::TreeOptions;

/// What caused a [`TreeChange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeCause {
    Children,
    Collapse,
    Filter,
    Compression,
    Clear,
}

/// One batch of row changes, queued once per successful mutating call.
///
/// The `splice` is relative to the rows before this change and after all earlier changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeChange {
    pub cause: ChangeCause,
    /// The node which children or collapsed state changed. `None` for the top level or the whole tree.
    pub parent: Option<NodeId>,
    pub splice: RowSplice,
}

/// The tree: owns the nodes and keeps every derived view in sync.
///
/// Mutations replace children ([`set_children`](Self::set_children)), collapse or expand nodes, change the filter or toggle compression.
/// Each successful mutation updates the visible [`rows`](Self::rows) with a minimal splice.
/// With [`TreeOptions::record_changes`] it also queues one [`TreeChange`] which can be taken with [`take_changes`](Self::take_changes).
/// Without it nothing is queued, so a model which is only rendered by the [`Tree`](crate::Tree) widget does not grow.
/// A failed mutation changes nothing.
///
/// The generic argument `T` is the element shown, `K` is the identity returned by the [identity provider](TreeOptions::identity_provider).
///
/// # Example
///
/// ```
/// # use tui_tree_model::{TreeElement, TreeModel, TreeOptions};
/// let mut model = TreeModel::new(TreeOptions::default().identity_provider(|element: &&str| *element));
/// model.set_children(
///     None,
///     vec![
///         TreeElement::new("src", vec![TreeElement::new("bin", vec![TreeElement::new_leaf("main.rs")])]),
///         TreeElement::new_leaf("Cargo.toml"),
///     ],
/// )?;
///
/// // src/bin is compressed into one row
/// let rows = model
///     .rows()
///     .iter()
///     .map(|row| {
///         let elements = model.row_elements(row);
///         elements.iter().map(|element| **element).collect::<Vec<_>>().join("/")
///     })
///     .collect::<Vec<_>>();
/// assert_eq!(rows, ["src/bin", "main.rs", "Cargo.toml"]);
///
/// model.set_collapsed(model.find(&"bin").expect("bin exists"), true)?;
/// assert_eq!(model.len(), 2);
/// # Ok::<(), tui_tree_model::TreeError>(())
/// ```
pub struct TreeModel<T, K = ()> {
    store: NodeStore<T>,
    identities: IdentityTracker<K>,
    compression: Compression,
    projection: Projection,
    filter: Option<Box<dyn TreeFilter<T>>>,
    identity_provider: Option<IdentityProvider<T, K>>,
    collapse_by_default: bool,
    record_changes: bool,
    changes: Vec<TreeChange>,
}

impl<T, K> Default for TreeModel<T, K>
where
    K: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new(TreeOptions::default())
    }
}

impl<T, K> fmt::Debug for TreeModel<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeModel")
            .field("nodes", &self.store.len())
            .field("rows", &self.projection.rows().len())
            .field("compression_enabled", &self.compression.is_enabled())
            .field("filter", &self.filter.is_some())
            .field("identity_provider", &self.identity_provider.is_some())
            .field("queued_changes", &self.changes.len())
            .finish_non_exhaustive()
    }
}

impl<T, K> TreeModel<T, K>
where
    K: Clone + Eq + Hash,
{
    #[must_use]
    pub fn new(options: TreeOptions<T, K>) -> Self {
        Self {
            store: NodeStore::default(),
            identities: IdentityTracker::default(),
            compression: Compression::new(options.compression_enabled),
            projection: Projection::default(),
            filter: options.filter,
            identity_provider: options.identity_provider,
            collapse_by_default: options.collapse_by_default,
            record_changes: options.record_changes,
            changes: Vec::new(),
        }
    }

    // Mutations

    /// Replace all children of `parent` (`None` for the top level).
    ///
    /// Every previous child and its descendants are removed, their [`NodeId`]s get stale.
    /// The lazy children of the given elements are consumed once.
    /// Focus, selection and anchor of identities which exist again after the replace are kept, the others are dropped.
    ///
    /// # Errors
    ///
    /// - [`TreeError::InvalidNode`] when `parent` is not part of the tree.
    /// - [`TreeError::InvalidOperation`] when an element is collapsed but not collapsible.
    ///
    /// The tree stays unchanged on errors.
    pub fn set_children<'a, I>(&mut self, parent: Option<NodeId>, children: I) -> Result<()>
    where
        I: IntoIterator<Item = TreeElement<'a, T>>,
        T: 'a,
    {
        let depth = match parent {
            None => 0,
            Some(parent) => self.store.get(parent)?.depth + 1,
        };
        let staged = children
            .into_iter()
            .map(TreeElement::stage)
            .collect::<Result<Vec<_>>>()?;

        let old_children = self.store.replace_children(parent, Vec::new())?;
        let mut removed = HashSet::new();
        let mut previous_collapsed = HashMap::new();
        for child in old_children {
            let Self {
                store,
                identities,
                compression,
                ..
            } = self;
            store.remove_subtree(child, |id, node| {
                removed.insert(id);
                compression.forget(id);
                if let Some(identity) = identities.forget(id) {
                    previous_collapsed.insert(identity, node.collapsed);
                }
            });
        }

        let inserted = staged
            .into_iter()
            .map(|staged| self.insert(parent, depth, staged, &previous_collapsed))
            .collect::<Vec<_>>();
        let inserted_count = inserted.len();
        self.store.replace_children(parent, inserted)?;
        self.identities.evict(&removed);

        let splice = match parent {
            None => {
                self.compression.rebuild(&self.store);
                self.splice_all()
            }
            Some(parent) => {
                let head = self.compression.recompress(&self.store, parent);
                self.splice_below(head)
            }
        };
        debug!(
            ?parent,
            removed = removed.len(),
            inserted = inserted_count,
            nodes = self.store.len(),
            "set children"
        );
        self.push_change(ChangeCause::Children, parent, splice);
        Ok(())
    }

    fn insert(
        &mut self,
        parent: Option<NodeId>,
        depth: usize,
        staged: Staged<T>,
        previous_collapsed: &HashMap<K, bool>,
    ) -> NodeId {
        let Staged {
            element,
            children,
            collapsed,
            collapsible,
            incompressible,
        } = staged;
        let identity = self
            .identity_provider
            .as_ref()
            .map(|provider| provider(&element));
        let filtered = self.evaluate_filter(&element);
        let collapsed = collapsed
            .or_else(|| {
                identity
                    .as_ref()
                    .and_then(|identity| previous_collapsed.get(identity).copied())
            })
            .unwrap_or(self.collapse_by_default);

        let id = self.store.insert(Node {
            element,
            parent,
            children: Vec::new(),
            depth,
            collapsed: collapsed && collapsible,
            collapsible,
            collapsible_override: filtered.collapsible,
            visible: filtered.visible,
            incompressible,
        });
        if let Some(identity) = identity {
            self.identities.remember(id, identity);
        }

        let children = children
            .into_iter()
            .map(|child| self.insert(Some(id), depth + 1, child, previous_collapsed))
            .collect::<Vec<_>>();
        if let Ok(node) = self.store.get_mut(id) {
            node.children = children;
        }
        id
    }

    /// Collapse or expand a node.
    ///
    /// With compression the row of a chain is collapsed via its [`terminal`](Row::terminal).
    ///
    /// Returns `true` when the state changed.
    ///
    /// # Errors
    ///
    /// - [`TreeError::InvalidNode`] when `id` is not part of the tree.
    /// - [`TreeError::InvalidOperation`] when the node is not collapsible. Nothing changes then.
    pub fn set_collapsed(&mut self, id: NodeId, collapsed: bool) -> Result<bool> {
        let node = self.store.get(id)?;
        if !node.is_collapsible() {
            return Err(TreeError::InvalidOperation("the node is not collapsible"));
        }
        if node.collapsed == collapsed {
            return Ok(false);
        }
        self.store.get_mut(id)?.collapsed = collapsed;
        debug!(node = %id, collapsed, "set collapsed");
        self.refresh_below(ChangeCause::Collapse, id);
        Ok(true)
    }

    /// Collapse or expand a node and all collapsible nodes below it.
    ///
    /// Returns `true` when any state changed.
    ///
    /// # Errors
    ///
    /// Same as [`set_collapsed`](Self::set_collapsed).
    pub fn set_collapsed_recursive(&mut self, id: NodeId, collapsed: bool) -> Result<bool> {
        if !self.store.get(id)?.is_collapsible() {
            return Err(TreeError::InvalidOperation("the node is not collapsible"));
        }
        let mut changed = false;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.store.get_mut(current)?;
            if node.is_collapsible() && node.collapsed != collapsed {
                node.collapsed = collapsed;
                changed = true;
            }
            stack.extend_from_slice(&node.children);
        }
        if changed {
            debug!(node = %id, collapsed, "set collapsed recursive");
            self.refresh_below(ChangeCause::Collapse, id);
        }
        Ok(changed)
    }

    /// Expand every ancestor of `id` so it gets revealed.
    /// A filtered out node or ancestor stays hidden.
    ///
    /// Returns `true` when any ancestor was expanded.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidNode`] when `id` is not part of the tree.
    pub fn expand_to(&mut self, id: NodeId) -> Result<bool> {
        let mut topmost = None;
        let mut current = self.store.get(id)?.parent;
        while let Some(ancestor) = current {
            let node = self.store.get_mut(ancestor)?;
            if node.is_collapsed() {
                node.collapsed = false;
                topmost = Some(ancestor);
            }
            current = node.parent;
        }
        let Some(topmost) = topmost else {
            return Ok(false);
        };
        debug!(node = %id, "expand to");
        self.refresh_below(ChangeCause::Collapse, topmost);
        Ok(true)
    }

    /// Collapse every collapsible node.
    ///
    /// Returns `true` when any node was collapsed.
    pub fn collapse_all(&mut self) -> bool {
        let mut changed = false;
        for node in self.store.iter_mut() {
            if node.is_collapsible() && !node.collapsed {
                node.collapsed = true;
                changed = true;
            }
        }
        if changed {
            debug!("collapse all");
            self.compression.rebuild(&self.store);
            let splice = self.splice_all();
            self.push_change(ChangeCause::Collapse, None, splice);
        }
        changed
    }

    /// Filter the nodes with a new filter.
    ///
    /// Each node is evaluated on its own: a node which is filtered out hides its whole subtree,
    /// a visible child does not bring back its filtered out parent.
    pub fn update_filter<F>(&mut self, filter: F)
    where
        F: TreeFilter<T> + 'static,
    {
        self.filter = Some(Box::new(filter));
        self.refilter();
    }

    /// Show every node again.
    pub fn clear_filter(&mut self) {
        self.filter = None;
        self.refilter();
    }

    /// Evaluate the current filter again for every node.
    ///
    /// Useful when the filter depends on something outside of the elements which changed.
    pub fn refilter(&mut self) {
        let Self { store, filter, .. } = self;
        let mut hidden = 0_usize;
        for node in store.iter_mut() {
            let filtered = filter
                .as_ref()
                .map_or(FilterResult::VISIBLE, |filter| filter.filter(&node.element));
            node.visible = filtered.visible;
            node.collapsible_override = filtered.collapsible;
            if !filtered.visible {
                hidden += 1;
            }
        }
        debug!(hidden, nodes = self.store.len(), "refilter");
        self.compression.rebuild(&self.store);
        let splice = self.splice_all();
        self.push_change(ChangeCause::Filter, None, splice);
    }

    /// Enable or disable compression of single child chains.
    ///
    /// Returns `true` when the state changed.
    pub fn set_compression_enabled(&mut self, enabled: bool) -> bool {
        if !self.compression.set_enabled(enabled, &self.store) {
            return false;
        }
        debug!(enabled, chains = self.compression.chain_count(), "set compression");
        let splice = self.splice_all();
        self.push_change(ChangeCause::Compression, None, splice);
        true
    }

    /// Remove every node and every trait.
    pub fn clear(&mut self) {
        self.store.clear();
        self.identities.clear();
        self.compression.clear();
        let splice = self.projection.splice(self.projection.full(), Vec::new());
        debug!(removed_rows = splice.delete_count, "clear");
        self.push_change(ChangeCause::Clear, None, splice);
    }

    /// Take the queued [`TreeChange`]s in the order they happened.
    ///
    /// Always empty unless [`TreeOptions::record_changes`] is enabled.
    pub fn take_changes(&mut self) -> Vec<TreeChange> {
        std::mem::take(&mut self.changes)
    }

    fn evaluate_filter(&self, element: &T) -> FilterResult {
        self.filter
            .as_ref()
            .map_or(FilterResult::VISIBLE, |filter| filter.filter(element))
    }

    /// Recompress and splice the rows below the chain containing `id`.
    fn refresh_below(&mut self, cause: ChangeCause, id: NodeId) {
        let head = self.compression.recompress(&self.store, id);
        let splice = self.splice_below(head);
        self.push_change(cause, Some(id), splice);
    }

    fn splice_all(&mut self) -> RowSplice {
        let rows = flatten(&self.store, &self.compression, self.store.roots(), 0);
        self.projection.splice(self.projection.full(), rows)
    }

    /// Replace the row of `head` and every row below it.
    /// Nothing to do when `head` is hidden.
    fn splice_below(&mut self, head: NodeId) -> RowSplice {
        let Some(region) = self.projection.region(head) else {
            return RowSplice::default();
        };
        let depth = self.projection.rows()[region.start].depth;
        let rows = flatten(&self.store, &self.compression, &[head], depth);
        self.projection.splice(region, rows)
    }

    fn push_change(&mut self, cause: ChangeCause, parent: Option<NodeId>, splice: RowSplice) {
        trace!(
            ?cause,
            start = splice.start,
            delete_count = splice.delete_count,
            insert_count = splice.insert_count,
            rows = self.projection.rows().len(),
            "rows spliced"
        );
        if !self.record_changes {
            return;
        }
        self.changes.push(TreeChange {
            cause,
            parent,
            splice,
        });
    }

    // Traits

    fn validated_keys(&self, ids: &[NodeId]) -> Result<Vec<TraitKey<K>>> {
        ids.iter()
            .map(|id| {
                self.store.get(*id)?;
                Ok(self.identities.key(*id))
            })
            .collect()
    }

    /// Live nodes holding the traits, filtered out ones are skipped.
    fn resolve(&self, keys: &[TraitKey<K>]) -> Vec<NodeId> {
        keys.iter()
            .filter_map(|key| self.identities.resolve(key))
            .filter(|id| self.store.passes_filter(*id).unwrap_or(false))
            .collect()
    }

    fn elements(&self, ids: Vec<NodeId>) -> Vec<&T> {
        ids.into_iter()
            .filter_map(|id| self.store.get(id).ok())
            .map(|node| &node.element)
            .collect()
    }

    /// Focus the given nodes.
    ///
    /// Returns `true` when the focus changed.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidNode`] when any of the `ids` is not part of the tree. The focus stays unchanged then.
    pub fn set_focus(&mut self, ids: &[NodeId]) -> Result<bool> {
        let keys = self.validated_keys(ids)?;
        Ok(self.identities.set_focus(keys))
    }

    /// Select the given nodes.
    ///
    /// Returns `true` when the selection changed.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidNode`] when any of the `ids` is not part of the tree. The selection stays unchanged then.
    pub fn set_selection(&mut self, ids: &[NodeId]) -> Result<bool> {
        let keys = self.validated_keys(ids)?;
        Ok(self.identities.set_selection(keys))
    }

    /// Set or clear the anchor of a range selection.
    ///
    /// Returns `true` when the anchor changed.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidNode`] when `id` is not part of the tree.
    pub fn set_anchor(&mut self, id: Option<NodeId>) -> Result<bool> {
        let key = match id {
            None => None,
            Some(id) => self.validated_keys(&[id])?.pop(),
        };
        Ok(self.identities.set_anchor(key))
    }

    #[must_use]
    pub fn focused_nodes(&self) -> Vec<NodeId> {
        self.resolve(self.identities.focus())
    }

    /// Elements of the focused nodes.
    /// Focused identities which are filtered out are skipped but stay focused.
    #[must_use]
    pub fn focus(&self) -> Vec<&T> {
        self.elements(self.focused_nodes())
    }

    #[must_use]
    pub fn selected_nodes(&self) -> Vec<NodeId> {
        self.resolve(self.identities.selection())
    }

    /// Elements of the selected nodes.
    /// Selected identities which are filtered out are skipped but stay selected.
    #[must_use]
    pub fn selection(&self) -> Vec<&T> {
        self.elements(self.selected_nodes())
    }

    #[must_use]
    pub fn anchor_node(&self) -> Option<NodeId> {
        let anchor = self.identities.anchor()?;
        self.resolve(std::slice::from_ref(anchor)).pop()
    }

    #[must_use]
    pub fn anchor(&self) -> Option<&T> {
        self.anchor_node().and_then(|id| self.element(id).ok())
    }

    #[must_use]
    pub fn is_focused(&self, id: NodeId) -> bool {
        self.store.contains(id) && self.identities.focus().contains(&self.identities.key(id))
    }

    #[must_use]
    pub fn is_selected(&self, id: NodeId) -> bool {
        self.store.contains(id)
            && self
                .identities
                .selection()
                .contains(&self.identities.key(id))
    }

    // Nodes

    /// # Errors
    ///
    /// [`TreeError::InvalidNode`] when `id` is not part of the tree.
    pub fn node(&self, id: NodeId) -> Result<&Node<T>> {
        self.store.get(id)
    }

    /// # Errors
    ///
    /// [`TreeError::InvalidNode`] when `id` is not part of the tree.
    pub fn element(&self, id: NodeId) -> Result<&T> {
        self.store.get(id).map(|node| &node.element)
    }

    /// # Errors
    ///
    /// [`TreeError::InvalidNode`] when `id` is not part of the tree.
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.store.get(id).map(|node| node.parent)
    }

    /// Children of `parent` or the top level nodes when `parent` is `None`.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidNode`] when `parent` is not part of the tree.
    pub fn children(&self, parent: Option<NodeId>) -> Result<&[NodeId]> {
        self.store.children_of(parent)
    }

    /// Position of `id` among its siblings.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidNode`] when `id` is not part of the tree.
    pub fn index_in_parent(&self, id: NodeId) -> Result<usize> {
        let parent = self.store.get(id)?.parent;
        self.store
            .children_of(parent)?
            .iter()
            .position(|sibling| *sibling == id)
            .ok_or(TreeError::InvalidNode(id))
    }

    /// Zero based depth of the node in the raw tree.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidNode`] when `id` is not part of the tree.
    pub fn depth(&self, id: NodeId) -> Result<usize> {
        self.store.get(id).map(|node| node.depth)
    }

    /// Whether the node is part of the visible rows: visible and all of its ancestors visible and expanded.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidNode`] when `id` is not part of the tree.
    pub fn is_revealed(&self, id: NodeId) -> Result<bool> {
        self.store.is_revealed(id)
    }

    /// Current node of an identity. Always `None` without an identity provider.
    #[must_use]
    pub fn find(&self, identity: &K) -> Option<NodeId> {
        self.identities
            .node(identity)
            .filter(|id| self.store.contains(*id))
    }

    #[must_use]
    pub fn identity(&self, id: NodeId) -> Option<&K> {
        self.identities.identity(id)
    }

    /// Amount of nodes in the tree, including hidden ones.
    #[must_use]
    pub const fn node_count(&self) -> usize {
        self.store.len()
    }

    // Rows

    #[must_use]
    pub const fn is_compression_enabled(&self) -> bool {
        self.compression.is_enabled()
    }

    /// The visible rows in render order.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        self.projection.rows()
    }

    #[must_use]
    pub fn row(&self, index: usize) -> Option<Row> {
        self.projection.rows().get(index).copied()
    }

    /// Amount of visible rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.projection.rows().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projection.rows().is_empty()
    }

    /// Index of the row showing the node with this identity.
    #[must_use]
    pub fn index_of(&self, identity: &K) -> Option<usize> {
        self.index_of_node(self.find(identity)?)
    }

    /// Index of the row showing `id`. With compression this can be the row of a chain containing `id`.
    #[must_use]
    pub fn index_of_node(&self, id: NodeId) -> Option<usize> {
        if !self.store.contains(id) {
            return None;
        }
        self.projection.position(self.compression.head_of(id))
    }

    /// Index of the row showing the first focused node.
    #[must_use]
    pub fn focused_row_index(&self) -> Option<usize> {
        self.focused_nodes()
            .into_iter()
            .find_map(|id| self.index_of_node(id))
    }

    /// Nodes shown by the row. One for a [`RowKind::Node`](crate::RowKind::Node), the whole chain for a compressed row.
    #[must_use]
    pub fn row_nodes(&self, row: &Row) -> Vec<NodeId> {
        self.compression.chain(row.head)
    }

    /// Elements shown by the row, the head first.
    #[must_use]
    pub fn row_elements(&self, row: &Row) -> Vec<&T> {
        self.elements(self.row_nodes(row))
    }

    /// Create a [`Navigator`] starting on the row of `start` or on "none".
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidNode`] when `start` is not part of the tree.
    pub fn navigator(&self, view: View, start: Option<NodeId>) -> Result<Navigator<'_, T>> {
        if let Some(start) = start {
            self.store.get(start)?;
        }
        let compression = match view {
            View::Raw => None,
            View::Compressed => Some(&self.compression),
        };
        Ok(Navigator::new(&self.store, compression, start))
    }
}
