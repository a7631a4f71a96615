use crate::node::NodeId;

/// Errors returned by the mutating and addressing operations of a [`TreeModel`](crate::TreeModel).
///
/// Every failed call leaves the model untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The [`NodeId`] does not reference a live node.
    /// Either it never existed or an ancestor was replaced by `set_children` since.
    #[error("node {0} is not part of the tree")]
    InvalidNode(NodeId),

    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
}

pub type Result<T, E = TreeError> = std::result::Result<T, E>;

#[test]
fn invalid_node_mentions_the_node() {
    let error = TreeError::InvalidNode(NodeId::new(3, 1));
    assert_eq!(error.to_string(), "node 3v1 is not part of the tree");
}
