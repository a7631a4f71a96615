use std::fmt;

use crate::filter::TreeFilter;
use crate::identity::IdentityProvider;

/// Configures a [`TreeModel`](crate::TreeModel).
///
/// Every option is optional:
///
/// ```
/// # use tui_tree_model::{TreeModel, TreeOptions};
/// let options = TreeOptions::default()
///     .identity_provider(|element: &u32| element % 100)
///     .filter(|element: &u32| *element != 13)
///     .compression_enabled(false);
/// let model = TreeModel::new(options);
/// # assert!(model.is_empty());
/// ```
pub struct TreeOptions<T, K = ()> {
    pub(crate) filter: Option<Box<dyn TreeFilter<T>>>,
    pub(crate) identity_provider: Option<IdentityProvider<T, K>>,
    pub(crate) compression_enabled: bool,
    pub(crate) collapse_by_default: bool,
    pub(crate) record_changes: bool,
}

impl<T, K> Default for TreeOptions<T, K> {
    fn default() -> Self {
        Self {
            filter: None,
            identity_provider: None,
            compression_enabled: true,
            collapse_by_default: false,
            record_changes: false,
        }
    }
}

impl<T, K> TreeOptions<T, K> {
    #[must_use]
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: TreeFilter<T> + 'static,
    {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Without an identity provider focus, selection and collapsed states do not survive replacing their nodes.
    #[must_use]
    pub fn identity_provider<F>(mut self, identity_provider: F) -> Self
    where
        F: Fn(&T) -> K + 'static,
    {
        self.identity_provider = Some(Box::new(identity_provider));
        self
    }

    /// Merge chains of single child nodes into one row. Enabled by default.
    #[must_use]
    pub const fn compression_enabled(mut self, enabled: bool) -> Self {
        self.compression_enabled = enabled;
        self
    }

    /// Collapsed state of new collapsible nodes which do not specify one.
    #[must_use]
    pub const fn collapse_by_default(mut self, collapsed: bool) -> Self {
        self.collapse_by_default = collapsed;
        self
    }

    /// Queue a [`TreeChange`](crate::TreeChange) for every mutation until it is taken with
    /// [`take_changes`](crate::TreeModel::take_changes). Disabled by default.
    ///
    /// Only enable it when something takes the changes regularly, the queue is not bounded.
    #[must_use]
    pub const fn record_changes(mut self, record: bool) -> Self {
        self.record_changes = record;
        self
    }
}

impl<T, K> fmt::Debug for TreeOptions<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeOptions")
            .field("filter", &self.filter.is_some())
            .field("identity_provider", &self.identity_provider.is_some())
            .field("compression_enabled", &self.compression_enabled)
            .field("collapse_by_default", &self.collapse_by_default)
            .field("record_changes", &self.record_changes)
            .finish()
    }
}

#[test]
fn compression_is_enabled_by_default() {
    let options = TreeOptions::<u8>::default();
    assert!(options.compression_enabled);
    assert!(!options.collapse_by_default);
    assert!(!options.record_changes);
    assert!(options.filter.is_none());
    assert!(options.identity_provider.is_none());
}
