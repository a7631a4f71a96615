use std::ops::Range;

use crate::compress::Compression;
use crate::node::{NodeId, NodeStore};

/// Kind of a [`Row`] to pick how it is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    /// A single node.
    Node,
    /// A chain of single child nodes shown as one row like `a/b/c`.
    Compressed,
}

/// One visible row of the tree.
///
/// Without compression `head` and `terminal` are the same node.
/// Expanding or collapsing a row always targets its `terminal`.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Row {
    pub(crate) head: NodeId,
    pub(crate) terminal: NodeId,
    /// Zero based depth. Depth 0 means top level with 0 indentation.
    pub(crate) depth: usize,
    pub(crate) collapsed: bool,
    pub(crate) expandable: bool,
}

impl Row {
    /// First node of the row.
    pub const fn head(&self) -> NodeId {
        self.head
    }

    /// Last node of the row. Its children are the children of the row.
    pub const fn terminal(&self) -> NodeId {
        self.terminal
    }

    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub const fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Whether the row has something to show when expanded.
    /// Collapsible nodes which children are all filtered out are not expandable.
    #[must_use]
    pub const fn is_expandable(&self) -> bool {
        self.expandable
    }

    #[must_use]
    pub fn kind(&self) -> RowKind {
        if self.head == self.terminal {
            RowKind::Node
        } else {
            RowKind::Compressed
        }
    }
}

/// Describes how the rows changed: `delete_count` rows at `start` were replaced by `insert_count` new rows.
#[must_use]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowSplice {
    pub start: usize,
    pub delete_count: usize,
    pub insert_count: usize,
}

impl RowSplice {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.delete_count == 0 && self.insert_count == 0
    }

    /// Indices of the inserted rows after the splice was applied.
    #[must_use]
    pub const fn inserted(&self) -> Range<usize> {
        self.start..self.start + self.insert_count
    }
}

/// The flat, index addressable list of visible rows.
#[derive(Debug, Default, Clone)]
pub(crate) struct Projection {
    rows: Vec<Row>,
}

impl Projection {
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn position(&self, head: NodeId) -> Option<usize> {
        self.rows.iter().position(|row| row.head == head)
    }

    /// The row of `head` and all rows below it.
    pub fn region(&self, head: NodeId) -> Option<Range<usize>> {
        let start = self.position(head)?;
        let depth = self.rows[start].depth;
        let below = self.rows[start + 1..]
            .iter()
            .take_while(|row| row.depth > depth)
            .count();
        Some(start..start + 1 + below)
    }

    pub fn full(&self) -> Range<usize> {
        0..self.rows.len()
    }

    /// Replace the rows in `range`.
    ///
    /// Rows which are the same at the start and the end of the range are kept, only the actual difference is spliced.
    pub fn splice(&mut self, range: Range<usize>, rows: Vec<Row>) -> RowSplice {
        let old = &self.rows[range.clone()];
        let prefix = old
            .iter()
            .zip(&rows)
            .take_while(|(old, new)| old == new)
            .count();
        let max_suffix = old.len().min(rows.len()) - prefix;
        let suffix = old
            .iter()
            .rev()
            .zip(rows.iter().rev())
            .take(max_suffix)
            .take_while(|(old, new)| old == new)
            .count();

        let start = range.start + prefix;
        let end = range.end - suffix;
        let inserted = rows.len() - prefix - suffix;
        self.rows
            .splice(start..end, rows.into_iter().skip(prefix).take(inserted))
            .for_each(drop);
        RowSplice {
            start,
            delete_count: end - start,
            insert_count: inserted,
        }
    }
}

/// Rows of all revealed nodes, starting with the given `heads`, in pre-order.
pub(crate) fn flatten<T>(
    store: &NodeStore<T>,
    compression: &Compression,
    heads: &[NodeId],
    depth: usize,
) -> Vec<Row> {
    let mut result = Vec::new();
    flatten_into(store, compression, heads, depth, &mut result);
    result
}

fn flatten_into<T>(
    store: &NodeStore<T>,
    compression: &Compression,
    heads: &[NodeId],
    depth: usize,
    result: &mut Vec<Row>,
) {
    for head in heads {
        if !store.get(*head).is_ok_and(|node| node.visible) {
            continue;
        }
        let terminal = compression.terminal_of(*head);
        let Ok(node) = store.get(terminal) else {
            continue;
        };
        result.push(Row {
            head: *head,
            terminal,
            depth,
            collapsed: node.is_collapsed(),
            expandable: store.is_expandable(terminal),
        });
        if !node.is_collapsed() {
            flatten_into(store, compression, &node.children, depth + 1, result);
        }
    }
}

#[cfg(test)]
fn row(head: u32, depth: usize) -> Row {
    let id = NodeId::new(head, 0);
    Row {
        head: id,
        terminal: id,
        depth,
        collapsed: false,
        expandable: false,
    }
}

#[test]
fn region_spans_deeper_rows() {
    let projection = Projection {
        rows: vec![row(0, 0), row(1, 1), row(2, 2), row(3, 1), row(4, 0)],
    };
    assert_eq!(projection.region(NodeId::new(1, 0)), Some(1..3));
    assert_eq!(projection.region(NodeId::new(0, 0)), Some(0..4));
    assert_eq!(projection.region(NodeId::new(4, 0)), Some(4..5));
    assert_eq!(projection.region(NodeId::new(9, 0)), None);
}

#[test]
fn splice_trims_equal_rows() {
    let mut projection = Projection {
        rows: vec![row(0, 0), row(1, 1), row(2, 1), row(3, 0)],
    };
    let splice = projection.splice(0..4, vec![row(0, 0), row(1, 1), row(5, 1), row(6, 1), row(3, 0)]);
    assert_eq!(
        splice,
        RowSplice {
            start: 2,
            delete_count: 1,
            insert_count: 2,
        }
    );
    assert_eq!(
        projection.rows(),
        [row(0, 0), row(1, 1), row(5, 1), row(6, 1), row(3, 0)]
    );
}

#[test]
fn splice_of_identical_rows_is_empty() {
    let mut projection = Projection {
        rows: vec![row(0, 0), row(0, 0)],
    };
    let splice = projection.splice(0..2, vec![row(0, 0), row(0, 0)]);
    assert!(splice.is_empty());
    assert_eq!(projection.rows().len(), 2);
}

#[test]
fn splice_removes_everything() {
    let mut projection = Projection {
        rows: vec![row(0, 0), row(1, 0)],
    };
    let splice = projection.splice(projection.full(), Vec::new());
    assert_eq!(splice.delete_count, 2);
    assert_eq!(splice.insert_count, 0);
    assert!(projection.rows().is_empty());
}
