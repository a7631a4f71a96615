use std::collections::HashMap;

use crate::node::{NodeId, NodeStore};

/// Merges chains of single child nodes into one row.
///
/// A chain starts at its `head` and absorbs the only child of the current node as long as
/// - the current node is expanded,
/// - the current node has exactly one child,
/// - that child passes the filter and
/// - that child is not marked as incompressible.
///
/// The last node of a chain is its `terminal`.
/// Only chains with more than one node are stored, every other node is its own chain.
#[derive(Debug, Clone)]
pub(crate) struct Compression {
    enabled: bool,
    /// head → all members of the chain, head first
    chains: HashMap<NodeId, Vec<NodeId>>,
    /// member (besides the head) → head
    heads: HashMap<NodeId, NodeId>,
}

impl Compression {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            chains: HashMap::new(),
            heads: HashMap::new(),
        }
    }

    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Head of the chain `id` is part of.
    pub fn head_of(&self, id: NodeId) -> NodeId {
        self.heads.get(&id).copied().unwrap_or(id)
    }

    pub fn terminal_of(&self, head: NodeId) -> NodeId {
        self.chains
            .get(&head)
            .and_then(|chain| chain.last())
            .copied()
            .unwrap_or(head)
    }

    pub fn chain(&self, head: NodeId) -> Vec<NodeId> {
        self.chains
            .get(&head)
            .cloned()
            .unwrap_or_else(|| vec![head])
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// Returns `true` when the state changed.
    pub fn set_enabled<T>(&mut self, enabled: bool, store: &NodeStore<T>) -> bool {
        if self.enabled == enabled {
            return false;
        }
        self.enabled = enabled;
        self.rebuild(store);
        true
    }

    /// Drop the bookkeeping of a node which was removed from the store.
    pub fn forget(&mut self, id: NodeId) {
        self.chains.remove(&id);
        self.heads.remove(&id);
    }

    pub fn clear(&mut self) {
        self.chains.clear();
        self.heads.clear();
    }

    /// Recompute every chain from scratch.
    pub fn rebuild<T>(&mut self, store: &NodeStore<T>) {
        self.clear();
        for root in store.roots() {
            self.compress_below(store, *root);
        }
    }

    /// Recompute the chain containing `id` and everything below it.
    ///
    /// Returns the head of the recomputed chain.
    /// Chains above the head are not affected by changes at or below `id`.
    pub fn recompress<T>(&mut self, store: &NodeStore<T>, id: NodeId) -> NodeId {
        if !self.enabled {
            return id;
        }
        let head = self.head_of(id);
        let mut stack = vec![head];
        while let Some(current) = stack.pop() {
            self.chains.remove(&current);
            if current != head {
                self.heads.remove(&current);
            }
            if let Ok(node) = store.get(current) {
                stack.extend_from_slice(&node.children);
            }
        }
        self.compress_below(store, head);
        head
    }

    fn compress_below<T>(&mut self, store: &NodeStore<T>, head: NodeId) {
        if !self.enabled {
            return;
        }
        let mut stack = vec![head];
        while let Some(head) = stack.pop() {
            let chain = Self::build_chain(store, head);
            let Some(&terminal) = chain.last() else {
                continue;
            };
            if let Ok(node) = store.get(terminal) {
                stack.extend_from_slice(&node.children);
            }
            if chain.len() > 1 {
                for member in &chain[1..] {
                    self.heads.insert(*member, head);
                }
                self.chains.insert(head, chain);
            }
        }
    }

    fn build_chain<T>(store: &NodeStore<T>, head: NodeId) -> Vec<NodeId> {
        let mut chain = vec![head];
        let mut current = head;
        while let Ok(node) = store.get(current) {
            if node.is_collapsed() {
                break;
            }
            let [child] = node.children.as_slice() else {
                break;
            };
            let absorb = store
                .get(*child)
                .is_ok_and(|child| child.visible && !child.incompressible);
            if !absorb {
                break;
            }
            chain.push(*child);
            current = *child;
        }
        chain
    }
}
