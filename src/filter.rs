/// Outcome of filtering one element.
///
/// A node which is not visible is hidden together with all of its descendants.
/// Its children can not make it visible again.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterResult {
    pub visible: bool,
    /// Replaces the collapsibility the node was created with while this filter is active.
    pub collapsible: Option<bool>,
}

impl FilterResult {
    pub const VISIBLE: Self = Self::new(true);
    pub const HIDDEN: Self = Self::new(false);

    pub const fn new(visible: bool) -> Self {
        Self {
            visible,
            collapsible: None,
        }
    }

    pub const fn collapsible(mut self, collapsible: bool) -> Self {
        self.collapsible = Some(collapsible);
        self
    }
}

impl From<bool> for FilterResult {
    fn from(visible: bool) -> Self {
        Self::new(visible)
    }
}

/// Decides which elements are part of the visible sequence.
///
/// Has to be a pure function of the element.
/// It is evaluated for every node on [`update_filter`](crate::TreeModel::update_filter) and for every inserted node.
///
/// Closures returning a `bool` or a [`FilterResult`] implement this trait:
///
/// ```
/// # use tui_tree_model::{TreeModel, TreeElement};
/// let mut model = TreeModel::<u32>::default();
/// model.set_children(None, (0..5).map(TreeElement::new_leaf))?;
/// model.update_filter(|element: &u32| element % 2 == 0);
/// assert_eq!(model.len(), 3);
/// # Ok::<(), tui_tree_model::TreeError>(())
/// ```
pub trait TreeFilter<T> {
    fn filter(&self, element: &T) -> FilterResult;
}

impl<T, F, R> TreeFilter<T> for F
where
    F: Fn(&T) -> R,
    R: Into<FilterResult>,
{
    fn filter(&self, element: &T) -> FilterResult {
        self(element).into()
    }
}

#[test]
fn closures_are_filters() {
    let even = |element: &u8| element % 2 == 0;
    assert_eq!(even.filter(&2), FilterResult::VISIBLE);
    assert_eq!(even.filter(&3), FilterResult::HIDDEN);

    let leafs = |element: &u8| FilterResult::new(true).collapsible(*element > 10);
    assert_eq!(leafs.filter(&3).collapsible, Some(false));
    assert_eq!(leafs.filter(&30).collapsible, Some(true));
}
