use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::node::NodeId;

/// Maps an element to its stable identity.
///
/// The identity is what keeps focus, selection and collapsed states alive when nodes get recreated by [`set_children`](crate::TreeModel::set_children).
/// It has to be unique across the whole tree.
/// When two elements share an identity it is undefined which of them holds the traits.
pub type IdentityProvider<T, K> = Box<dyn Fn(&T) -> K>;

/// What a trait like focus or selection is attached to.
///
/// Without an [`IdentityProvider`] traits are attached to the node itself and get lost when the node is replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TraitKey<K> {
    Identity(K),
    Node(NodeId),
}

/// Keeps the identity of every node and the traits assigned to identities.
#[derive(Debug, Clone)]
pub(crate) struct IdentityTracker<K> {
    nodes: HashMap<K, NodeId>,
    identities: HashMap<NodeId, K>,
    focus: Vec<TraitKey<K>>,
    selection: Vec<TraitKey<K>>,
    anchor: Option<TraitKey<K>>,
}

impl<K> Default for IdentityTracker<K> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            identities: HashMap::new(),
            focus: Vec::new(),
            selection: Vec::new(),
            anchor: None,
        }
    }
}

impl<K> IdentityTracker<K>
where
    K: Clone + Eq + Hash,
{
    pub fn remember(&mut self, id: NodeId, identity: K) {
        self.nodes.insert(identity.clone(), id);
        self.identities.insert(id, identity);
    }

    /// Returns the identity the node had.
    pub fn forget(&mut self, id: NodeId) -> Option<K> {
        let identity = self.identities.remove(&id)?;
        if self.nodes.get(&identity) == Some(&id) {
            self.nodes.remove(&identity);
        }
        Some(identity)
    }

    pub fn node(&self, identity: &K) -> Option<NodeId> {
        self.nodes.get(identity).copied()
    }

    pub fn identity(&self, id: NodeId) -> Option<&K> {
        self.identities.get(&id)
    }

    pub fn key(&self, id: NodeId) -> TraitKey<K> {
        self.identities
            .get(&id)
            .map_or(TraitKey::Node(id), |identity| TraitKey::Identity(identity.clone()))
    }

    /// The current node holding `key`. Not validated against the store.
    pub fn resolve(&self, key: &TraitKey<K>) -> Option<NodeId> {
        match key {
            TraitKey::Identity(identity) => self.node(identity),
            TraitKey::Node(id) => Some(*id),
        }
    }

    /// Drop the traits which holders are gone.
    ///
    /// Identities without a live node and nodes in `removed` lose their traits.
    pub fn evict(&mut self, removed: &HashSet<NodeId>) {
        let nodes = &self.nodes;
        let alive = |key: &TraitKey<K>| match key {
            TraitKey::Identity(identity) => nodes.contains_key(identity),
            TraitKey::Node(id) => !removed.contains(id),
        };
        self.focus.retain(alive);
        self.selection.retain(alive);
        if !self.anchor.as_ref().is_some_and(alive) {
            self.anchor = None;
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.identities.clear();
        self.focus.clear();
        self.selection.clear();
        self.anchor = None;
    }

    pub fn focus(&self) -> &[TraitKey<K>] {
        &self.focus
    }

    pub fn selection(&self) -> &[TraitKey<K>] {
        &self.selection
    }

    pub const fn anchor(&self) -> Option<&TraitKey<K>> {
        self.anchor.as_ref()
    }

    /// Returns `true` when the focus changed.
    pub fn set_focus(&mut self, keys: Vec<TraitKey<K>>) -> bool {
        replace_unique(&mut self.focus, keys)
    }

    /// Returns `true` when the selection changed.
    pub fn set_selection(&mut self, keys: Vec<TraitKey<K>>) -> bool {
        replace_unique(&mut self.selection, keys)
    }

    /// Returns `true` when the anchor changed.
    pub fn set_anchor(&mut self, key: Option<TraitKey<K>>) -> bool {
        let changed = self.anchor != key;
        self.anchor = key;
        changed
    }
}

fn replace_unique<K>(target: &mut Vec<TraitKey<K>>, keys: Vec<TraitKey<K>>) -> bool
where
    K: Clone + Eq + Hash,
{
    let mut seen = HashSet::new();
    let keys = keys
        .into_iter()
        .filter(|key| seen.insert(key.clone()))
        .collect::<Vec<_>>();
    let changed = *target != keys;
    *target = keys;
    changed
}

#[cfg(test)]
fn id(index: u32) -> NodeId {
    NodeId::new(index, 0)
}

#[test]
fn traits_follow_identities_to_new_nodes() {
    let mut tracker = IdentityTracker::default();
    tracker.remember(id(0), "a");
    tracker.remember(id(1), "b");
    tracker.set_focus(vec![tracker.key(id(1))]);

    // replace both nodes, only "b" comes back
    let removed = [id(0), id(1)].into_iter().collect::<HashSet<_>>();
    for node in &removed {
        tracker.forget(*node);
    }
    tracker.remember(id(2), "b");
    tracker.evict(&removed);

    assert_eq!(tracker.focus(), [TraitKey::Identity("b")]);
    assert_eq!(tracker.resolve(&tracker.focus()[0]), Some(id(2)));
}

#[test]
fn vanished_identities_lose_their_traits() {
    let mut tracker = IdentityTracker::default();
    tracker.remember(id(0), "a");
    tracker.set_selection(vec![tracker.key(id(0))]);
    tracker.set_anchor(Some(tracker.key(id(0))));

    let removed = std::iter::once(id(0)).collect();
    tracker.forget(id(0));
    tracker.evict(&removed);

    assert!(tracker.selection().is_empty());
    assert_eq!(tracker.anchor(), None);
}

#[test]
fn without_identity_traits_stick_to_the_node() {
    let mut tracker = IdentityTracker::<&str>::default();
    tracker.set_focus(vec![tracker.key(id(4))]);
    assert_eq!(tracker.focus(), [TraitKey::Node(id(4))]);

    tracker.evict(&HashSet::new());
    assert_eq!(tracker.focus().len(), 1);

    tracker.evict(&std::iter::once(id(4)).collect());
    assert!(tracker.focus().is_empty());
}

#[test]
fn colliding_identity_keeps_the_later_node() {
    let mut tracker = IdentityTracker::default();
    tracker.remember(id(0), 7);
    tracker.remember(id(1), 7);
    assert_eq!(tracker.node(&7), Some(id(1)));

    // forgetting the earlier node keeps the mapping of the later one
    tracker.forget(id(0));
    assert_eq!(tracker.node(&7), Some(id(1)));
}

#[test]
fn setting_the_same_traits_is_no_change() {
    let mut tracker = IdentityTracker::<&str>::default();
    assert!(tracker.set_focus(vec![TraitKey::Identity("a"), TraitKey::Identity("a")]));
    assert_eq!(tracker.focus().len(), 1);
    assert!(!tracker.set_focus(vec![TraitKey::Identity("a")]));
}
